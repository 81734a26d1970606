// Hotspot operator login
//
// `POST {base}/api/v2/hotspot/login` with the operator account. A
// successful login returns the CSRF token that every ext-portal call
// must carry in its `Csrf-Token` header.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::hotspot::client::{HotspotClient, preview};
use crate::hotspot::models::{CredentialKey, HotspotEnvelope, LoginResult};

impl HotspotClient {
    /// Log in as a hotspot operator under one base URL and one
    /// credential field name.
    ///
    /// Accepted only when the controller answers HTTP 200, `errorCode` is
    /// absent or zero, and `result.token` is non-empty. Anything else is
    /// an [`Error::Authentication`] so the caller can move on to the next
    /// combination.
    pub async fn login(
        &self,
        base: &Url,
        key: CredentialKey,
        username: &str,
        password: &SecretString,
    ) -> Result<SecretString, Error> {
        let url = Self::hotspot_url(base, "login")?;

        let mut body = Map::new();
        body.insert(key.as_ref().to_owned(), Value::from(username));
        body.insert(
            "password".into(),
            Value::from(password.expose_secret().to_owned()),
        );

        let resp = self.post_json(url.clone(), &body, None).await?;
        debug!(
            url = %url,
            key = %key,
            status = resp.status,
            body = preview(&resp.body, 200),
            "login try"
        );

        if resp.status != 200 {
            return Err(Error::Authentication {
                message: format!(
                    "login failed (HTTP {}): {}",
                    resp.status,
                    preview(&resp.body, 200)
                ),
            });
        }

        let envelope: HotspotEnvelope<LoginResult> =
            serde_json::from_str(&resp.body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&resp.body, 200)),
                body: resp.body.clone(),
            })?;

        if !envelope.is_success() {
            return Err(Error::Authentication {
                message: format!(
                    "login rejected (errorCode {}): {}",
                    envelope.error_code.unwrap_or_default(),
                    envelope.msg.unwrap_or_default()
                ),
            });
        }

        match envelope.result.and_then(|r| r.token) {
            Some(token) if !token.is_empty() => Ok(SecretString::from(token)),
            _ => Err(Error::Authentication {
                message: "login response carried no token".into(),
            }),
        }
    }
}
