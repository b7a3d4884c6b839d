use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("augur/", env!("CARGO_PKG_VERSION"));

// environment keys
pub const ENV_API_URL: &str = "AUGUR_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "AUGUR_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "AUGUR_USER_AGENT";
pub const ENV_HEADERS: &str = "AUGUR_HEADERS";

/// Connection settings for [`HttpTransport`].
///
/// [`HttpTransport`]: crate::transport::HttpTransport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }
}

impl TransportConfig {
    /// Build a config from the process environment, falling back to the
    /// defaults for anything unset.
    ///
    /// ```rust,ignore
    /// dotenv::dotenv().ok();
    /// let config = augur_client::TransportConfig::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env()`](Self::from_env), reading keys through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_base_url(&url)?;
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: secs.clone(),
                })?;
            config.timeout = Duration::from_secs(parsed);
        }

        if let Some(agent) = lookup(ENV_USER_AGENT) {
            config.user_agent = agent;
        }

        if let Some(raw) = lookup(ENV_HEADERS) {
            config.headers = parse_headers(&raw)?;
        }

        Ok(config)
    }

    /// Replace the base url. A trailing slash is added so relative endpoint
    /// paths join underneath it rather than replacing the last segment.
    pub fn with_base_url(mut self, value: &str) -> Result<Self, ConfigError> {
        let mut raw = value.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        self.base_url = Url::parse(&raw).map_err(|source| ConfigError::BaseUrl {
            value: value.to_string(),
            source,
        })?;
        Ok(self)
    }
}

// "k1=v1;k2=v2"
fn parse_headers(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: ENV_HEADERS,
                value: pair.to_string(),
            }),
        })
        .collect()
}
