// ── Core error types ──
//
// Errors surfaced by iosim-core to its callers. Completion-service
// failures arrive as `iosim_api::Error` and are translated here; the
// interpreter never lets them escape as command output, but session
// construction and the CLI report them directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Device not found in topology: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Fallback errors ──────────────────────────────────────────────
    #[error("Completion service authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot reach completion service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Completion service timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Fallback reply rejected: {message}")]
    MalformedReply { message: String },

    #[error("Completion API error: {message}")]
    Api {
        message: String,
        /// The service's error kind (e.g. "overloaded_error").
        kind: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<iosim_api::Error> for CoreError {
    fn from(err: iosim_api::Error) -> Self {
        match err {
            iosim_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            iosim_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        kind: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            iosim_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            iosim_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            iosim_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            iosim_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                kind: Some("rate_limited".into()),
                status: Some(429),
            },
            iosim_api::Error::Api {
                message,
                kind,
                status,
            } => CoreError::Api {
                message,
                kind,
                status: Some(status),
            },
            iosim_api::Error::Deserialization { message, body: _ } => CoreError::MalformedReply {
                message: format!("completion envelope did not decode: {message}"),
            },
            iosim_api::Error::EmptyCompletion => CoreError::MalformedReply {
                message: "completion service returned no text".into(),
            },
        }
    }
}
