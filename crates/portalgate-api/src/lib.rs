// portalgate-api: Async Rust client for the controller's hotspot API

pub mod error;
pub mod hotspot;
pub mod transport;

pub use error::Error;
pub use hotspot::{AuthReply, CredentialKey, HotspotClient};
pub use transport::{TlsMode, TransportConfig};
