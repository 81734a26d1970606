//! Clap derive structures for the `portalgate` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// portalgate -- authorize captive-portal clients on a hotspot controller
#[derive(Debug, Parser)]
#[command(
    name = "portalgate",
    version,
    about = "Authorize captive-portal clients on a hotspot controller",
    long_about = "Grants network access to captive-portal clients through the controller's\n\
        external-portal API. The accepted payload shape differs across firmware,\n\
        so portalgate searches for it and remembers what worked per client.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Portal profile to use
    #[arg(long, short = 'p', env = "PORTALGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller host URL (overrides profile)
    #[arg(long, short = 'c', env = "PORTALGATE_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller tenant id (overrides profile)
    #[arg(long, env = "PORTALGATE_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,

    /// Hotspot operator username (overrides profile)
    #[arg(long, short = 'u', env = "PORTALGATE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PORTALGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PORTALGATE_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-call timeout in seconds (overrides profile)
    #[arg(long, env = "PORTALGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Grant a client network access
    #[command(alias = "auth")]
    Authorize(AuthorizeArgs),

    /// Show the ordered payload candidates for a client (offline)
    Variants(VariantsArgs),

    /// Log in to the controller and report the working base URL
    Login,

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Client Context ───────────────────────────────────────────────────

/// Where the client came from. Flags override values parsed from `--redirect`.
#[derive(Debug, Args)]
pub struct ContextArgs {
    /// Full portal redirect URL (query carries clientMac, apMac, ...)
    #[arg(long, short = 'r')]
    pub redirect: Option<String>,

    /// Client MAC address
    #[arg(long, short = 'm')]
    pub client_mac: Option<String>,

    /// Client IP address
    #[arg(long)]
    pub client_ip: Option<String>,

    /// Access point MAC address
    #[arg(long)]
    pub ap_mac: Option<String>,

    /// Gateway MAC address
    #[arg(long)]
    pub gateway_mac: Option<String>,

    /// SSID name
    #[arg(long)]
    pub ssid: Option<String>,

    /// Radio id
    #[arg(long)]
    pub radio_id: Option<String>,

    /// Site name
    #[arg(long, short = 's')]
    pub site: Option<String>,

    /// VLAN id requested by the redirect
    #[arg(long)]
    pub vid: Option<String>,
}

// ── Authorize ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthorizeArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Grant length: seconds, or a duration like "24h" / "90m"
    #[arg(long, short = 't', default_value = "86400", value_parser = parse_grant_length)]
    pub seconds: u64,

    /// Try the absolute `time` encoding before `duration`
    #[arg(long = "no-prefer-duration", action = ArgAction::SetFalse)]
    pub prefer_duration: bool,
}

/// Accept plain seconds or a humantime duration; zero is rejected.
pub fn parse_grant_length(raw: &str) -> Result<u64, String> {
    let seconds = match raw.trim().parse::<u64>() {
        Ok(secs) => secs,
        Err(_) => humantime::parse_duration(raw.trim())
            .map_err(|e| format!("expected seconds or a duration like '24h': {e}"))?
            .as_secs(),
    };
    if seconds == 0 {
        return Err("grant length must be at least one second".into());
    }
    Ok(seconds)
}

// ── Variants ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VariantsArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// VLAN id used when the context carries none (0 disables; defaults to the profile)
    #[arg(long)]
    pub default_vlan: Option<u16>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a profile value
    Set {
        /// Key (controller, tenant_id, username, default_vlan, reveal_delay_secs,
        /// debug_log, insecure, timeout, ca_cert)
        key: String,
        /// Value
        value: String,
    },

    /// List profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the operator password in the system keyring
    SetPassword {
        /// Profile (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
