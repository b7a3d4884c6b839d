//! Recurring fetch owned by one consumer.
//!
//! A [`PollSession`] is either `Idle` (no task) or `Running` (one background
//! task ticking every `interval`, with at most one fetch in flight). Results
//! reach the owner only through [`PollSession::next()`], which checks each
//! completion against the session's request sequence before accepting it.
//! Stopping drops the receiving end, so nothing fetched before `stop()`
//! returned can be observed afterwards.

use crate::error::{ErrorKind, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};

pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub type FetchFuture<T> = BoxFuture<'static, Result<T>>;

/// Produces one fetch-and-normalize attempt per call.
pub type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
}

/// What the subscriber sees after each accepted fetch.
///
/// On failure `data` is the previous good result, unchanged, and `error` is
/// the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate<T> {
    pub seq: u64,
    pub data: Option<T>,
    pub error: Option<ErrorKind>,
}

impl<T> PollUpdate<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

struct Completion<T> {
    seq: u64,
    outcome: Result<T>,
}

struct Run<T> {
    task: JoinHandle<()>,
    rx: mpsc::Receiver<Completion<T>>,
}

/// Delivery is pull driven. Fetched results wait in a single slot until the
/// owner calls [`next()`](Self::next) (or [`subscribe()`](Self::subscribe));
/// while the slot is full the task holds its next completion and fetches
/// nothing further. A slow owner is therefore handed a result that may be up
/// to one interval old, at most one more is waiting behind it, and
/// [`last_result()`](Self::last_result) / [`last_error()`](Self::last_error)
/// only move when a completion is taken.
pub struct PollSession<T> {
    fetcher: Fetcher<T>,
    interval: Duration,
    last_result: Option<T>,
    last_error: Option<ErrorKind>,
    // shared with the running task; survives restarts so sequence numbers never repeat
    issued: Arc<AtomicU64>,
    delivered: u64,
    run: Option<Run<T>>,
}

impl<T> fmt::Debug for PollSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSession")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .field("issued", &self.issued.load(Ordering::SeqCst))
            .field("delivered", &self.delivered)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<T> PollSession<T> {
    pub fn state(&self) -> PollState {
        if self.run.is_some() {
            PollState::Running
        } else {
            PollState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_result(&self) -> Option<&T> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&ErrorKind> {
        self.last_error.as_ref()
    }
}

impl<T> PollSession<T>
where
    T: Clone + Send + 'static,
{
    /// A new, idle session. Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn new(fetcher: Fetcher<T>, interval: Duration) -> Self {
        Self {
            fetcher,
            interval: interval.max(MIN_INTERVAL),
            last_result: None,
            last_error: None,
            issued: Arc::new(AtomicU64::new(0)),
            delivered: 0,
            run: None,
        }
    }

    /// Build the [`Fetcher`] from an async closure.
    pub fn from_fn<F, Fut>(fetch: F, interval: Duration) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T>> + Send + 'static,
    {
        Self::new(Arc::new(move || Box::pin(fetch()) as FetchFuture<T>), interval)
    }

    /// Begin polling: fetch now, then every `interval`. No-op while running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.run.is_some() {
            return;
        }

        // capacity 1: the task waits for the owner to take a result before fetching again
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(drive(
            self.fetcher.clone(),
            self.interval,
            self.issued.clone(),
            tx,
        ));
        debug!("poll session started, every {:?}", self.interval);
        self.run = Some(Run { task, rx });
    }

    /// Stop polling. Idempotent; any completion not yet taken is discarded.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.task.abort();
            drop(run.rx);
            debug!("poll session stopped");
        }
    }

    /// `stop()`, adopt `interval`, `start()`.
    pub fn restart(&mut self, interval: Duration) {
        self.stop();
        self.interval = interval.max(MIN_INTERVAL);
        self.start();
    }

    /// Wait for the next accepted fetch. `None` once the session is idle.
    ///
    /// Cancel safe: dropping the future loses no completion.
    pub async fn next(&mut self) -> Option<PollUpdate<T>> {
        loop {
            let run = self.run.as_mut()?;
            let Some(completion) = run.rx.recv().await else {
                // the task ended on its own, e.g. a fetcher panicked
                warn!("poll task ended unexpectedly");
                self.stop();
                return None;
            };

            if completion.seq <= self.delivered {
                trace!(seq = completion.seq, "discarding stale poll result");
                continue;
            }
            return Some(self.accept(completion));
        }
    }

    /// Feed every update to `subscriber` until the session stops. The
    /// subscriber receives the session itself and may stop or restart it.
    pub async fn subscribe<F>(&mut self, mut subscriber: F)
    where
        F: FnMut(&mut Self, PollUpdate<T>),
    {
        while let Some(update) = self.next().await {
            subscriber(self, update);
        }
    }

    fn accept(&mut self, completion: Completion<T>) -> PollUpdate<T> {
        self.delivered = completion.seq;
        let error = match completion.outcome {
            Ok(data) => {
                self.last_result = Some(data);
                self.last_error = None;
                None
            }
            Err(e) => {
                warn!(seq = completion.seq, "poll fetch failed, keeping previous result: {e}");
                self.last_error = Some(e.clone());
                Some(e)
            }
        };
        PollUpdate {
            seq: completion.seq,
            data: self.last_result.clone(),
            error,
        }
    }
}

impl<T> Drop for PollSession<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.task.abort();
        }
    }
}

async fn drive<T>(
    fetcher: Fetcher<T>,
    period: Duration,
    issued: Arc<AtomicU64>,
    tx: mpsc::Sender<Completion<T>>,
) {
    let mut ticker = time::interval(period);
    // ticks that come due while a fetch is in flight are dropped, not queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let seq = issued.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(seq, "poll fetch issued");

        let outcome = (fetcher)().await;
        if tx.send(Completion { seq, outcome }).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_completions_are_discarded() {
        let mut session = PollSession::from_fn(|| async { Ok(0u32) }, Duration::from_secs(60));

        // hand-built run whose results arrive out of issue order
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(async {});
        session.run = Some(Run { task, rx });

        tx.send(Completion { seq: 2, outcome: Ok(20) }).await.unwrap();
        tx.send(Completion { seq: 1, outcome: Ok(10) }).await.unwrap();
        tx.send(Completion { seq: 3, outcome: Ok(30) }).await.unwrap();

        let first = session.next().await.unwrap();
        assert_eq!((first.seq, first.data), (2, Some(20)));

        let second = session.next().await.unwrap();
        assert_eq!((second.seq, second.data), (3, Some(30)));
        assert_eq!(session.last_result(), Some(&30));
    }

    #[tokio::test]
    async fn zero_interval_is_clamped() {
        let session = PollSession::from_fn(|| async { Ok(()) }, Duration::ZERO);
        assert_eq!(session.interval(), MIN_INTERVAL);
        assert_eq!(session.state(), PollState::Idle);
    }
}
