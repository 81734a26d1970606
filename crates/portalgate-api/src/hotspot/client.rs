// Hotspot API HTTP client
//
// Wraps `reqwest::Client` with hotspot URL construction and response
// capture. The base URL is passed per call because the session layer
// probes several path prefixes before settling on one. Endpoint methods
// live in `auth.rs` and `ext_portal.rs`.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Status code and raw body of a hotspot call.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Raw HTTP client for the controller's hotspot API.
///
/// Holds only the connection pool and the controller's cookies; the
/// operator token and the active base URL are owned by the caller's session.
#[derive(Debug, Clone)]
pub struct HotspotClient {
    http: reqwest::Client,
}

impl HotspotClient {
    /// Create a client from a `TransportConfig` (TLS mode + per-call timeout).
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v2/hotspot/{path}`.
    ///
    /// The base may carry a path prefix (`/omada/{id}`), so this appends
    /// rather than using `Url::join`, which would replace the last segment.
    pub fn hotspot_url(base: &Url, path: &str) -> Result<Url, Error> {
        let base = base.as_str().trim_end_matches('/');
        let full = format!("{base}/api/v2/hotspot/{path}");
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a JSON body, returning status and body text regardless of status.
    pub(crate) async fn post_json(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        csrf_token: Option<&str>,
    ) -> Result<RawResponse, Error> {
        debug!("POST {}", url);

        let mut builder = self.http.post(url).json(body);
        if let Some(token) = csrf_token {
            builder = builder.header("Csrf-Token", token);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// First `max` characters of a body, for error messages and logs.
pub fn preview(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hotspot_url_keeps_tenant_prefix() {
        let base = Url::parse("https://ctrl:8043/omada/abc123").unwrap();
        let url = HotspotClient::hotspot_url(&base, "login").unwrap();
        assert_eq!(url.as_str(), "https://ctrl:8043/omada/abc123/api/v2/hotspot/login");
    }

    #[test]
    fn hotspot_url_trims_trailing_slash() {
        let base = Url::parse("https://ctrl:8043/").unwrap();
        let url = HotspotClient::hotspot_url(&base, "extPortal/auth").unwrap();
        assert_eq!(url.as_str(), "https://ctrl:8043/api/v2/hotspot/extPortal/auth");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("ok", 200), "ok");
    }
}
