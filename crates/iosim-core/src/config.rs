// ── Runtime engine configuration ──
//
// These types describe how the interpreter and convergence engine run.
// They carry credential data and tuning, but never touch disk: the CLI
// builds an `EngineConfig` from its config file and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::convergence::ConvergenceOptions;

pub use iosim_api::DEFAULT_ENDPOINT;

/// TLS verification strategy for the completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local gateways with self-signed certs).
    DangerAcceptInvalid,
}

impl From<TlsVerification> for iosim_api::TlsMode {
    fn from(tls: TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Connection settings for the generative fallback resolver.
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub endpoint: Url,
    pub model: String,
    pub api_key: SecretString,
    /// Upper bound on one resolver call, enforced around the whole call.
    pub timeout: Duration,
    pub max_tokens: u32,
    pub tls: TlsVerification,
}

/// Everything a `Session` needs. `fallback: None` runs grammar-only:
/// unmatched commands are rejected as invalid input.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub fallback: Option<FallbackConfig>,
    pub convergence: ConvergenceOptions,
}
