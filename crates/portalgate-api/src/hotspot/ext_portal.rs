// External portal authorization
//
// `POST {base}/api/v2/hotspot/extPortal/auth` grants a captive-portal
// client network access. The controller's accepted field set varies by
// firmware, so this layer sends whatever payload it is given and reports
// back status, error code and body without judging beyond that.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use crate::error::Error;
use crate::hotspot::client::HotspotClient;
use crate::hotspot::models::HotspotEnvelope;

/// Result of a single ext-portal auth call that reached the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReply {
    /// HTTP status code.
    pub status: u16,
    /// `errorCode` from the envelope, `None` when absent or unreadable.
    pub error_code: Option<i64>,
    /// Raw response body, kept for diagnostics.
    pub body: String,
}

impl AuthReply {
    /// HTTP 200 with an `errorCode` that is absent or zero.
    ///
    /// A body that is not a JSON envelope carries no error code, so an
    /// empty or plain-text 200 counts as accepted.
    pub fn is_accepted(&self) -> bool {
        self.status == 200 && self.error_code.is_none_or(|code| code == 0)
    }

    /// The controller rejected the session token itself.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl HotspotClient {
    /// Issue one authorization call with the operator's CSRF token.
    ///
    /// Non-200 statuses and application error codes come back as an
    /// [`AuthReply`], not an error; only transport failures are `Err`.
    pub async fn ext_portal_auth(
        &self,
        base: &Url,
        token: &SecretString,
        payload: &(impl Serialize + Sync),
    ) -> Result<AuthReply, Error> {
        let url = Self::hotspot_url(base, "extPortal/auth")?;
        let resp = self
            .post_json(url, payload, Some(token.expose_secret()))
            .await?;

        let error_code = serde_json::from_str::<HotspotEnvelope<serde_json::Value>>(&resp.body)
            .ok()
            .and_then(|e| e.error_code);
        Ok(AuthReply {
            status: resp.status,
            error_code,
            body: resp.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, error_code: Option<i64>) -> AuthReply {
        AuthReply {
            status,
            error_code,
            body: String::new(),
        }
    }

    #[test]
    fn accepted_requires_200_and_zero_code() {
        assert!(reply(200, None).is_accepted());
        assert!(reply(200, Some(0)).is_accepted());
        assert!(!reply(200, Some(-41_501)).is_accepted());
        assert!(!reply(500, None).is_accepted());
    }

    #[test]
    fn body_without_error_code_is_accepted() {
        let empty = reply(200, None);
        assert!(empty.is_accepted());
        let text = AuthReply {
            body: "OK".into(),
            ..reply(200, None)
        };
        assert!(text.is_accepted());
        assert!(!reply(204, None).is_accepted());
    }
}
