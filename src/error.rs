//! Error types for treeharvest
//!
//! One enum covers the whole fetch pipeline. The retry layer classifies these
//! into retryable and terminal via [`crate::retry::IsRetryable`]; nothing in
//! this module performs I/O or retries.

use thiserror::Error;

/// Result type alias for treeharvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for treeharvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.account")
        key: Option<String>,
    },

    /// The remote API answered with a non-success HTTP status
    #[error("HTTP status {code} from {endpoint}: {body}")]
    Status {
        /// Logical endpoint the request was sent to
        endpoint: String,
        /// HTTP status code
        code: u16,
        /// Response body as returned by the server
        body: String,
    },

    /// Network error (timeout, connection failure, protocol error)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body does not match the expected record structure
    #[error("malformed response: {0}")]
    Parse(String),

    /// The assembled document could not be serialized
    #[error("document rendering failed: {0}")]
    Render(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_carries_endpoint_code_and_body() {
        let err = Error::Status {
            endpoint: "https://api.example.com/get_order".into(),
            code: 503,
            body: "server busy".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("get_order"));
        assert!(msg.contains("server busy"));
    }

    #[test]
    fn config_error_display_shows_message() {
        let err = Error::Config {
            message: "account must not be empty".into(),
            key: Some("api.account".into()),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: account must not be empty"
        );
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
