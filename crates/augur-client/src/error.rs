use thiserror::Error;

/// Every way a request to the analytics backend can fail.
///
/// Transport, normalizer and facade hand these back as values; nothing in the
/// client panics or throws for an ordinary network or payload failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with status {status}")]
    ServerError { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Field-less tag of an [`ErrorKind`], for comparisons that ignore the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Network,
    Timeout,
    ServerError,
    Malformed,
}

impl ErrorKind {
    pub fn kind(&self) -> ErrorClass {
        match self {
            ErrorKind::Network(_) => ErrorClass::Network,
            ErrorKind::Timeout => ErrorClass::Timeout,
            ErrorKind::ServerError { .. } => ErrorClass::ServerError,
            ErrorKind::Malformed(_) => ErrorClass::Malformed,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ErrorKind::Malformed(msg.into())
    }
}

impl From<reqwest::Error> for ErrorKind {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = err.status() {
            ErrorKind::ServerError {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ErrorKind::Malformed(err.to_string())
        } else {
            ErrorKind::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(err: serde_json::Error) -> Self {
        ErrorKind::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Invalid client configuration, raised before any request is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid base url `{value}`: {source}")]
    BaseUrl {
        value: String,
        source: url::ParseError,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ignores_message() {
        assert_eq!(
            ErrorKind::Network("refused".into()).kind(),
            ErrorKind::Network("reset".into()).kind()
        );
        assert_ne!(ErrorKind::Timeout.kind(), ErrorClass::Network);
    }

    #[test]
    fn json_errors_are_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        assert_eq!(ErrorKind::from(err).kind(), ErrorClass::Malformed);
    }

    #[test]
    fn server_error_displays_status() {
        let err = ErrorKind::ServerError { status: 503 };
        assert_eq!(err.to_string(), "server responded with status 503");
    }
}
