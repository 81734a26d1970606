use thiserror::Error;

/// Top-level error type for the `portalgate-api` crate.
///
/// Covers the failure modes of the hotspot API surface: operator login
/// and transport. Ext-portal rejections are not errors; they come back as
/// an `AuthReply`.
/// `portalgate-core` maps these into negotiation outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Operator login rejected (wrong credentials, wrong path prefix, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
