//! Shared configuration for the portalgate CLI and embedding servers.
//!
//! TOML profiles, operator credential resolution (env + keyring +
//! plaintext), and translation to `portalgate_core::PortalConfig`. The CLI
//! layers its `GlobalOpts` overrides on top.

use std::collections::HashMap;
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

use portalgate_core::config::{DEFAULT_REVEAL_DELAY_SECS, DEFAULT_VLAN};
use portalgate_core::{OperatorCredentials, PortalConfig, TlsVerification};

/// Keyring service name for stored operator passwords.
pub const KEYRING_SERVICE: &str = "portalgate";

/// Environment variable consulted first for the operator password.
pub const PASSWORD_ENV: &str = "PORTALGATE_PASSWORD";

/// Environment variable consulted when a profile names no operator.
pub const USERNAME_ENV: &str = "PORTALGATE_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no operator credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named portal profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile named `name`, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_vlan")]
    pub default_vlan: u16,

    #[serde(default = "default_reveal_delay")]
    pub reveal_delay_secs: u64,

    #[serde(default)]
    pub debug_log: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            default_vlan: default_vlan(),
            reveal_delay_secs: default_reveal_delay(),
            debug_log: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    5
}
fn default_vlan() -> u16 {
    DEFAULT_VLAN
}
fn default_reveal_delay() -> u64 {
    DEFAULT_REVEAL_DELAY_SECS
}

/// A named portal deployment.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller host (e.g., "https://192.168.0.100:8043").
    pub controller: String,

    /// Controller tenant id (the `omadacId` path segment).
    pub tenant_id: Option<String>,

    /// Hotspot operator username.
    pub username: Option<String>,

    /// Hotspot operator password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// VLAN id when the redirect carries none. `0` disables the fallback.
    pub default_vlan: Option<u16>,

    /// Seat-assignment reveal delay.
    pub reveal_delay_secs: Option<u64>,

    /// Verbose negotiation logging.
    pub debug_log: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "portalgate", "portalgate").map_or_else(
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
    p.push("portalgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered as defaults -> file -> `PORTALGATE_*` env.
///
/// Nested keys use `__` in env names: `PORTALGATE_PROFILES__LOBBY__TENANT_ID`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PORTALGATE_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
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

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Store the operator password for `profile_name` in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve operator credentials: env var, then keyring, then plaintext.
pub fn resolve_operator_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<OperatorCredentials, ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(OperatorCredentials {
            username,
            password: SecretString::from(pw),
        });
    }

    // 2. Keyring
    if let Ok(pw) =
        keyring_entry(profile_name).and_then(|e| e.get_password().map_err(ConfigError::from))
    {
        return Ok(OperatorCredentials {
            username,
            password: SecretString::from(pw),
        });
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(OperatorCredentials {
            username,
            password: SecretString::from(pw.clone()),
        });
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// TLS strategy for a profile. Local controllers are typically self-signed,
/// so verification is off unless a CA is given or `insecure = false`.
pub fn resolve_tls(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Build a `PortalConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_portal_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PortalConfig, ConfigError> {
    let host: url::Url = profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: {}", profile.controller),
        })?;

    let operator = resolve_operator_credentials(profile, profile_name)?;

    let mut config = PortalConfig::new(host, operator);
    config.tenant_id = profile.tenant_id.clone();
    config.default_vlan =
        Some(profile.default_vlan.unwrap_or(defaults.default_vlan)).filter(|v| *v != 0);
    config.reveal_delay_secs = profile
        .reveal_delay_secs
        .unwrap_or(defaults.reveal_delay_secs);
    config.debug_log = profile.debug_log.unwrap_or(defaults.debug_log);
    config.tls = resolve_tls(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}
