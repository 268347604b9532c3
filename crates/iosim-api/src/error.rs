use thiserror::Error;

/// Top-level error type for the `iosim-api` crate.
///
/// Covers every failure mode of a completion round-trip: authentication,
/// transport, HTTP status, and response decoding. `iosim-core` maps these
/// into its own fail-closed fallback errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The completion service rejected the API key.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the service. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Service ─────────────────────────────────────────────────────
    /// Non-success HTTP status with the service's error message.
    #[error("Completion API error (HTTP {status}): {message}")]
    Api {
        message: String,
        kind: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The response decoded but carried no text content.
    #[error("Completion response contained no text content")]
    EmptyCompletion,
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The service's error kind (e.g. `"overloaded_error"`), if available.
    pub fn api_error_kind(&self) -> Option<&str> {
        match self {
            Self::Api { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            message: "overloaded".into(),
            kind: Some("overloaded_error".into()),
            status: 529,
        };
        assert!(err.is_transient());
        assert_eq!(err.api_error_kind(), Some("overloaded_error"));
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = Error::Api {
            message: "bad request".into(),
            kind: None,
            status: 400,
        };
        assert!(!err.is_transient());
        assert!(!Error::EmptyCompletion.is_transient());
    }

    #[test]
    fn rate_limit_is_transient() {
        assert!(
            Error::RateLimited {
                retry_after_secs: 3
            }
            .is_transient()
        );
    }
}
