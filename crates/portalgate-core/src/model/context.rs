// ── Client context ──
//
// Everything the controller told us about a device when it redirected the
// device into the portal. Values are kept as the raw strings from the
// redirect; the variant generator decides how to interpret them.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::mac::MacAddress;

/// Site name used when the redirect carries none.
pub const DEFAULT_SITE: &str = "Default";

/// One device attempting network access through the captive portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    pub client_mac: Option<String>,
    pub client_ip: Option<String>,
    pub ap_mac: Option<String>,
    pub gateway_mac: Option<String>,
    pub ssid_name: Option<String>,
    pub radio_id: Option<String>,
    pub site: Option<String>,
    pub vid: Option<String>,
    pub redirect_url: Option<String>,
}

impl ClientContext {
    /// A context with only the client MAC set.
    pub fn for_client(client_mac: impl Into<String>) -> Self {
        Self {
            client_mac: Some(client_mac.into()),
            ..Self::default()
        }
    }

    /// Capture a context from the portal redirect's query string.
    ///
    /// Unknown keys (`portalId`, `omadaId`, `t`, ...) are ignored and empty
    /// values count as absent. A repeated key keeps its last value.
    pub fn from_redirect_query(query: &str) -> Self {
        let mut ctx = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "clientMac" => &mut ctx.client_mac,
                "clientIp" => &mut ctx.client_ip,
                "apMac" => &mut ctx.ap_mac,
                "gatewayMac" => &mut ctx.gateway_mac,
                "ssidName" => &mut ctx.ssid_name,
                "radioId" => &mut ctx.radio_id,
                "site" => &mut ctx.site,
                "vid" => &mut ctx.vid,
                "redirectUrl" => &mut ctx.redirect_url,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        ctx
    }

    /// Capture a context from a full portal redirect URL.
    pub fn from_redirect_url(url: &Url) -> Self {
        Self::from_redirect_query(url.query().unwrap_or_default())
    }

    /// The client MAC as captured, if present and non-empty.
    pub fn client_mac(&self) -> Option<&str> {
        non_empty(self.client_mac.as_ref())
    }

    /// The site, falling back to [`DEFAULT_SITE`].
    pub fn site(&self) -> &str {
        non_empty(self.site.as_ref()).unwrap_or(DEFAULT_SITE)
    }

    /// Per-client map key, `None` without a client MAC.
    pub fn key(&self) -> Option<ClientKey> {
        self.client_mac().map(|mac| ClientKey::new(MacAddress::new(mac), self.site()))
    }

    /// Emergency-exit number for SSIDs named `exit_<n>`.
    pub fn exit_number(&self) -> Option<u32> {
        let ssid = non_empty(self.ssid_name.as_ref())?.trim();
        let prefix = ssid.get(..5)?;
        if !prefix.eq_ignore_ascii_case("exit_") {
            return None;
        }
        let rest = ssid.get(5..)?;
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// Identity of a client within a site. Keys the variant cache and the
/// grant store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientKey {
    pub mac: MacAddress,
    pub site: String,
}

impl ClientKey {
    pub fn new(mac: MacAddress, site: impl Into<String>) -> Self {
        Self {
            mac,
            site: site.into(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.mac, self.site)
    }
}
