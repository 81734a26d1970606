//! CLI configuration -- thin wrapper around `portalgate-config`.
//!
//! Re-exports the shared config types and adds `GlobalOpts`-aware
//! profile resolution on top.

use std::time::Duration;

use secrecy::SecretString;

pub use portalgate_config::{
    Config, Defaults, PASSWORD_ENV, Profile, config_path, load_config_or_default,
    profile_to_portal_config, save_config, store_password,
};
use portalgate_core::{OperatorCredentials, PortalConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Whether negotiation debug logging is enabled for the active profile.
pub fn debug_log_enabled(global: &GlobalOpts, config: &Config) -> bool {
    let name = active_profile_name(global, config);
    config
        .profiles
        .get(&name)
        .and_then(|p| p.debug_log)
        .unwrap_or(config.defaults.debug_log)
}

/// Build a `PortalConfig` from the config file, profile, and CLI overrides.
pub fn build_portal_config(global: &GlobalOpts) -> Result<PortalConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // Flags win over the profile; with no profile, flags + env must suffice.
    let mut portal = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            let mut overridden = Profile {
                controller: global
                    .controller
                    .clone()
                    .unwrap_or_else(|| profile.controller.clone()),
                tenant_id: global.tenant_id.clone().or_else(|| profile.tenant_id.clone()),
                username: global.username.clone().or_else(|| profile.username.clone()),
                password: profile.password.clone(),
                default_vlan: profile.default_vlan,
                reveal_delay_secs: profile.reveal_delay_secs,
                debug_log: profile.debug_log,
                ca_cert: profile.ca_cert.clone(),
                insecure: profile.insecure,
                timeout: global.timeout.or(profile.timeout),
            };
            if global.insecure {
                overridden.insecure = Some(true);
            }
            profile_to_portal_config(&overridden, &profile_name, &cfg.defaults)?
        }
        None => from_flags(global, &profile_name, &cfg.defaults)?,
    };

    if global.insecure {
        portal.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(portal)
}

fn from_flags(
    global: &GlobalOpts,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PortalConfig, CliError> {
    let url_str = global.controller.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let host: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "controller".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let (Some(username), Ok(password)) = (global.username.clone(), std::env::var(PASSWORD_ENV))
    else {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    };

    let mut portal = PortalConfig::new(
        host,
        OperatorCredentials {
            username,
            password: SecretString::from(password),
        },
    );
    portal.tenant_id.clone_from(&global.tenant_id);
    portal.default_vlan = Some(defaults.default_vlan).filter(|v| *v != 0);
    portal.reveal_delay_secs = defaults.reveal_delay_secs;
    portal.debug_log = defaults.debug_log;
    portal.timeout = Duration::from_secs(global.timeout.unwrap_or(defaults.timeout));
    Ok(portal)
}
