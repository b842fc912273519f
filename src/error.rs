//! Error types for the client core
//!
//! Every failure a request can produce is a [`ClientError`]. Workflows never
//! let these escape: the reducer translates them into `last_error`, a
//! notification, a demotion or a log line, depending on which call failed.

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the analysis backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the attached credentials (HTTP 401)
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// Invalid client configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_unauthorized() {
        assert!(ClientError::Unauthorized.is_unauthorized());
        let conflict = ClientError::Status {
            status: 400,
            body: "{\"username\":[\"exists\"]}".to_string(),
        };
        assert!(!conflict.is_unauthorized());
        assert_eq!(
            conflict.to_string(),
            "server responded with status 400: {\"username\":[\"exists\"]}"
        );
    }

    #[test]
    fn config_errors_name_the_offending_value() {
        let err = ConfigError::InvalidValue {
            key: "CHEMVIZ_TIMEOUT_SECS",
            value: "soon".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value \"soon\" for CHEMVIZ_TIMEOUT_SECS");
    }
}
