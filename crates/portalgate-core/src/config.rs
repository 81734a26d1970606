// ── Runtime portal configuration ──
//
// These types describe *how* to reach the controller and how the portal
// behaves. They carry credential data and tuning, but never touch disk.
// The CLI (or an embedding server) builds a `PortalConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use portalgate_api::transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};

/// VLAN id sent when the redirect carries none.
pub const DEFAULT_VLAN: u16 = 100;

/// Seconds between seat selection and revealing the seat assignment.
pub const DEFAULT_REVEAL_DELAY_SECS: u64 = 10;

/// Hotspot operator account on the controller.
#[derive(Debug, Clone)]
pub struct OperatorCredentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one portal deployment.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Controller host (e.g., `https://192.168.0.100:8043`).
    pub host: Url,
    /// Controller tenant id, probed as a path prefix during login.
    pub tenant_id: Option<String>,
    /// Hotspot operator credentials.
    pub operator: OperatorCredentials,
    /// VLAN id used when the redirect carries none. `None` disables the fallback.
    pub default_vlan: Option<u16>,
    /// Seat-assignment reveal delay (seconds).
    pub reveal_delay_secs: u64,
    /// Verbose negotiation logging.
    pub debug_log: bool,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl PortalConfig {
    /// A config with the stock defaults for everything but host and operator.
    pub fn new(host: Url, operator: OperatorCredentials) -> Self {
        Self {
            host,
            tenant_id: None,
            operator,
            default_vlan: Some(DEFAULT_VLAN),
            reveal_delay_secs: DEFAULT_REVEAL_DELAY_SECS,
            debug_log: false,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Transport settings for the hotspot client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
