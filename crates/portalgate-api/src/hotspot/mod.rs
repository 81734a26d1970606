// Hotspot API client modules
//
// Hand-written client for the controller's hotspot operator endpoints:
// `hotspot/login` (operator session + CSRF token) and
// `hotspot/extPortal/auth` (grant a captive-portal client access).
// Both answer with the `{ errorCode, msg, result }` envelope.

pub mod auth;
pub mod client;
pub mod ext_portal;
pub mod models;

pub use client::HotspotClient;
pub use ext_portal::AuthReply;
pub use models::{CredentialKey, HotspotEnvelope};
