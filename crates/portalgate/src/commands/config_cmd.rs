//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::prompt_err;
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

fn profile_not_found(name: &str, cfg: &Config) -> CliError {
    CliError::ProfileNotFound {
        name: name.into(),
        available: config::available_profiles(cfg),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
        ConfigCommand::Set { key, value } => set(global, &key, value),
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: portalgate config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&profile_name, &cfg));
            }

            let secret = rpassword::prompt_password("Operator password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &secret)?;
            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("portalgate configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let controller: String = Input::new()
        .with_prompt("Controller URL")
        .default("https://192.168.0.100:8043".into())
        .interact_text()
        .map_err(prompt_err)?;

    let tenant_id: String = Input::new()
        .with_prompt("Tenant id (blank if none)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Hotspot operator username")
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Hotspot operator password: ").map_err(prompt_err)?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }

    let use_keyring = Confirm::new()
        .with_prompt("Store the password in the system keyring?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    let password = if use_keyring {
        config::store_password(&profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    let default_vlan: u16 = Input::new()
        .with_prompt("Default VLAN id (0 to send none)")
        .default(cfg.defaults.default_vlan)
        .interact_text()
        .map_err(prompt_err)?;

    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            controller,
            tenant_id: Some(tenant_id).filter(|t| !t.trim().is_empty()),
            username: Some(username),
            password,
            default_vlan: Some(default_vlan),
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());

    let path = config::save_config(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: portalgate login");
    Ok(())
}

// ── Set <key> <value> ───────────────────────────────────────────────

fn set(global: &GlobalOpts, key: &str, value: String) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let profile = cfg.profiles.entry(profile_name.clone()).or_default();

    match key {
        "controller" => profile.controller = value,
        "tenant_id" | "tenant-id" => profile.tenant_id = Some(value),
        "username" => profile.username = Some(value),
        "default_vlan" | "default-vlan" => {
            profile.default_vlan = Some(parse_value(key, &value, "must be a VLAN id (0-4094)")?);
        }
        "reveal_delay_secs" | "reveal-delay-secs" => {
            profile.reveal_delay_secs = Some(parse_value(key, &value, "must be a number (seconds)")?);
        }
        "debug_log" | "debug-log" => {
            profile.debug_log = Some(parse_value(key, &value, "must be 'true' or 'false'")?);
        }
        "insecure" => {
            profile.insecure = Some(parse_value(key, &value, "must be 'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_value(key, &value, "must be a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: controller, tenant_id, username, \
                     default_vlan, reveal_delay_secs, debug_log, insecure, timeout, ca_cert"
                ),
            });
        }
    }

    config::save_config(&cfg)?;
    eprintln!("✓ Set {key} on profile '{profile_name}'");
    Ok(())
}
