//! Adaptive authorization layer between `portalgate-api` and its consumers
//! (the CLI, or a portal web server embedding this crate).
//!
//! The controller's ext-portal endpoint accepts a payload shape that varies
//! by firmware and deployment. This crate discovers that shape per client
//! and remembers it:
//!
//! - **[`ControllerSession`]** holds the operator CSRF token and the base URL
//!   that accepted the login, probing tenant path prefixes and both
//!   credential field names until one works.
//!
//! - **[`payload_variants`]** enumerates the ordered candidate search space
//!   (MAC set x extra field x auth type) for a [`ClientContext`].
//!
//! - **[`NegotiationEngine`]** tries the cached [`LearnedVariant`] first,
//!   falls back to brute force over both [`TimeEncoding`]s, and records the
//!   winner in the [`VariantCache`] and the expiry in the [`GrantStore`].
//!
//! All state is injected: the engine owns `Arc`s to its session and stores,
//! so tests and embedders can share or replace them.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod variants;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{OperatorCredentials, PortalConfig, TlsVerification};
pub use engine::{AuthOutcome, NO_CONTEXT, NO_VARIANT_MATCHED, NegotiationEngine, NegotiationPath};
pub use error::CoreError;
pub use session::{ActiveSession, ControllerSession};
pub use store::{GrantStore, LearnedVariant, VariantCache};
pub use variants::{PayloadVariants, payload_variants};

pub use model::{
    AuthType, CandidatePayload, ClientContext, ClientKey, DEFAULT_SITE, GrantRecord, GrantStatus,
    MacAddress, TimeEncoding, TimeField, TimedPayload,
};
