use crate::config::TransportConfig;
use crate::error::{ConfigError, ErrorKind, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

/// JSON request/response seam between the facade and the backend.
///
/// Implementations must turn every ordinary network or HTTP failure into an
/// [`ErrorKind`] value. The facade holds one shared instance, so
/// implementations are used through `&self` only.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;

    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }
}

/// [`Transport`] over a [`reqwest::Client`].
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> std::result::Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                ConfigError::InvalidValue {
                    key: crate::config::ENV_HEADERS,
                    value: key.clone(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidValue {
                key: crate::config::ENV_HEADERS,
                value: value.clone(),
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // a leading slash would discard any path prefix on the base url
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ErrorKind::Network(format!("invalid endpoint `{path}`: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.endpoint(path)?;
        trace!("{method} {url}");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            debug!("{method} {url} failed: {e}");
            ErrorKind::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!("{method} {url} responded {status}");
            return Err(ErrorKind::ServerError {
                status: status.as_u16(),
            });
        }

        // read the body first, so a decode failure is told apart from a dropped connection
        let bytes = response.bytes().await.map_err(ErrorKind::from)?;
        let value = serde_json::from_slice::<Value>(&bytes)?;
        trace!("{method} {url} returned {} bytes", bytes.len());
        Ok(value)
    }
}
