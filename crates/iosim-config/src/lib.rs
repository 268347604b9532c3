//! Configuration for the iosim CLI.
//!
//! TOML file plus `IOSIM_` environment overrides, credential resolution
//! for the fallback service (env + keyring + plaintext), and translation
//! to `iosim_core::EngineConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use iosim_core::{
    ConvergenceOptions, DEFAULT_ENDPOINT, EngineConfig, FallbackConfig, TlsVerification,
};

/// Keyring service name; the API key lives under [`KEYRING_ENTRY`].
pub const KEYRING_SERVICE: &str = "iosim";
pub const KEYRING_ENTRY: &str = "fallback/api-key";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for the command fallback")]
    NoCredentials,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub fallback: FallbackSection,

    #[serde(default)]
    pub convergence: ConvergenceSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// `text`, `json`, `json-compact`, or `yaml`.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "text".into()
}

/// The completion service behind unrecognized commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FallbackSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default = "default_api_key_env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for FallbackSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_api_key_env() -> Option<String> {
    Some("ANTHROPIC_API_KEY".into())
}
fn default_timeout() -> u64 {
    8
}
fn default_max_tokens() -> u32 {
    1024
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConvergenceSection {
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    /// Round limit; unset means one round per device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
}

impl Default for ConvergenceSection {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_iterations: None,
        }
    }
}

fn default_max_hops() -> u32 {
    iosim_core::convergence::DEFAULT_MAX_HOPS
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "iosim", "iosim").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("iosim");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields defaults.
///
/// Environment keys nest with a double underscore:
/// `IOSIM_FALLBACK__MODEL`, `IOSIM_CONVERGENCE__MAX_HOPS`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("IOSIM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the fallback API key: named env var, then system keyring, then
/// plaintext in the config file.
pub fn resolve_api_key(section: &FallbackSection) -> Result<SecretString, ConfigError> {
    // 1. api_key_env → env var lookup
    if let Some(ref env_name) = section.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = section.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials)
}

/// Store the API key in the system keyring.
pub fn store_api_key(key: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?;
    entry.set_password(key)?;
    Ok(())
}

// ── Translation to engine config ────────────────────────────────────

fn tls_for(section: &FallbackSection) -> TlsVerification {
    if section.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = section.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

pub fn convergence_options(section: &ConvergenceSection) -> Result<ConvergenceOptions, ConfigError> {
    if section.max_hops == 0 {
        return Err(ConfigError::Validation {
            field: "convergence.max_hops".into(),
            reason: "must be at least 1".into(),
        });
    }
    if section.max_iterations == Some(0) {
        return Err(ConfigError::Validation {
            field: "convergence.max_iterations".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(ConvergenceOptions {
        max_hops: section.max_hops,
        max_iterations: section.max_iterations,
    })
}

/// Build the fallback connection settings. Fails with
/// [`ConfigError::NoCredentials`] when no key can be found.
pub fn fallback_config(section: &FallbackSection) -> Result<FallbackConfig, ConfigError> {
    let endpoint: url::Url = section
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "fallback.endpoint".into(),
            reason: format!("invalid URL: {}", section.endpoint),
        })?;
    if section.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            field: "fallback.timeout_secs".into(),
            reason: "must be at least 1".into(),
        });
    }
    let api_key = resolve_api_key(section)?;

    Ok(FallbackConfig {
        endpoint,
        model: section.model.clone(),
        api_key,
        timeout: Duration::from_secs(section.timeout_secs),
        max_tokens: section.max_tokens,
        tls: tls_for(section),
    })
}

/// Translate the whole file. A disabled fallback yields `fallback: None`.
pub fn engine_config(cfg: &Config) -> Result<EngineConfig, ConfigError> {
    let fallback = if cfg.fallback.enabled {
        Some(fallback_config(&cfg.fallback)?)
    } else {
        None
    };
    Ok(EngineConfig {
        fallback,
        convergence: convergence_options(&cfg.convergence)?,
    })
}
