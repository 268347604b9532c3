//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use iosim_config::ConfigError;
use iosim_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Snapshots ────────────────────────────────────────────────────

    #[error("Could not read {path}")]
    #[diagnostic(
        code(iosim::read_failed),
        help("Create a device snapshot with: iosim device new <HOSTNAME> -f {path}")
    )]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}")]
    #[diagnostic(code(iosim::write_failed))]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid {what} snapshot: {reason}")]
    #[diagnostic(
        code(iosim::bad_snapshot),
        help("Snapshots are JSON, or YAML when the file ends in .yaml / .yml.")
    )]
    BadSnapshot {
        path: String,
        what: &'static str,
        reason: String,
    },

    #[error("Device '{identifier}' not found in topology")]
    #[diagnostic(
        code(iosim::not_found),
        help("Known devices: {available}")
    )]
    DeviceNotFound {
        identifier: String,
        available: String,
    },

    // ── Device ───────────────────────────────────────────────────────

    #[error("The device rejected `{line}`")]
    #[diagnostic(code(iosim::rejected))]
    Rejected { line: String },

    // ── Fallback ─────────────────────────────────────────────────────

    #[error("Command fallback unavailable: {message}")]
    #[diagnostic(
        code(iosim::fallback),
        help(
            "Check the [fallback] section of your config, or run with --no-fallback.\n\
             Store an API key with: iosim config set-key"
        )
    )]
    Fallback { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(iosim::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(iosim::config),
        help("Inspect the effective settings with: iosim config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(iosim::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(iosim::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Fallback { .. } => exit_code::CONNECTION,
            Self::Validation { .. }
            | Self::BadSnapshot { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn read_failed(path: &Path, source: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn write_failed(path: &Path, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            source,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { identifier } => CliError::DeviceNotFound {
                identifier,
                available: "(see the topology file)".into(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            other => CliError::Fallback {
                message: other.to_string(),
            },
        }
    }
}
