#![allow(dead_code)]

use async_trait::async_trait;
use augur_client::{ErrorKind, Result, Transport};
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Script {
    replies: HashMap<(Method, String), VecDeque<Result<Value>>>,
    seen: Vec<Seen>,
}

/// In-memory backend: answers each (method, path) from a queue of canned
/// replies. The last reply of a queue is repeated once the queue runs dry.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `latency` (tokio time, so paused clocks apply).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn reply(&self, method: Method, path: &str, reply: Result<Value>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.script.lock().unwrap().seen.clone()
    }

    pub fn calls(&self, path: &str) -> usize {
        self.seen().iter().filter(|s| s.path == path).count()
    }

    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.seen.push(Seen {
                method: method.clone(),
                path: path.to_string(),
                body,
            });
            match script.replies.get_mut(&(method, path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) => queue
                    .front()
                    .cloned()
                    .unwrap_or(Err(ErrorKind::ServerError { status: 404 })),
                None => Err(ErrorKind::ServerError { status: 404 }),
            }
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        reply
    }
}
