//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use portalgate_config::ConfigError;
use portalgate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const DENIED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(portalgate::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Self-signed certificates are accepted unless the profile sets insecure = false."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(portalgate::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Controller login failed after {attempts} attempt(s)")]
    #[diagnostic(
        code(portalgate::login_failed),
        help(
            "Every base URL and credential field was rejected. Last error: {last_error}\n\
             Check the operator account and tenant id, or run: portalgate config set-password"
        )
    )]
    LoginFailed { attempts: u32, last_error: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(code(portalgate::auth_failed))]
    AuthFailed { message: String },

    #[error("No operator credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(portalgate::no_credentials),
        help(
            "Configure credentials with: portalgate config init\n\
             Or set PORTALGATE_USERNAME and PORTALGATE_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Negotiation ──────────────────────────────────────────────────
    #[error("authorization failed, try again")]
    #[diagnostic(code(portalgate::denied))]
    AuthorizationDenied {
        /// Raw controller response, only populated with `-v`.
        #[help]
        detail: Option<String>,
    },

    #[error("No client MAC given")]
    #[diagnostic(
        code(portalgate::no_client),
        help("Pass --client-mac, or --redirect with the portal redirect URL.")
    )]
    NoClientContext,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(portalgate::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(portalgate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: portalgate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(portalgate::no_config),
        help(
            "Create one with: portalgate config init\n\
             Expected at: {path}\n\
             Or pass --controller with PORTALGATE_USERNAME / PORTALGATE_PASSWORD."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(portalgate::config))]
    Config(ConfigError),

    // ── Other ────────────────────────────────────────────────────────
    #[error("Controller error: {message}")]
    #[diagnostic(code(portalgate::api_error))]
    Api { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render JSON: {0}")]
    #[diagnostic(code(portalgate::json))]
    Json(#[from] serde_json::Error),

    #[error("failed to render YAML: {0}")]
    #[diagnostic(code(portalgate::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::LoginFailed { .. } | Self::AuthFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::AuthorizationDenied { .. } => exit_code::DENIED,
            Self::NoClientContext | Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SessionFailed {
                attempts,
                last_error,
            } => CliError::LoginFailed {
                attempts,
                last_error,
            },

            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                CliError::Api { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failure_maps_to_auth_exit() {
        let err: CliError = CoreError::SessionFailed {
            attempts: 6,
            last_error: "401".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn denied_message_hides_controller_text() {
        let err = CliError::AuthorizationDenied { detail: None };
        assert_eq!(err.to_string(), "authorization failed, try again");
        assert_eq!(err.exit_code(), exit_code::DENIED);
    }
}
