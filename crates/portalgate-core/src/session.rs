// ── Controller session ──
//
// Owns the operator session (CSRF token + the base URL that accepted the
// login). Deployments expose the hotspot API under different path
// prefixes and firmware disagrees on the login field name, so login walks
// every (base, credential key) pair until one yields a token.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use portalgate_api::{CredentialKey, HotspotClient};

use crate::config::{OperatorCredentials, PortalConfig};
use crate::error::CoreError;

/// A validated (base URL, token) pair.
///
/// Calls take a clone, so a concurrent re-login never swaps the token out
/// from under a request that is already in flight.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub base: Url,
    pub token: SecretString,
}

/// Process-wide operator session with the controller.
pub struct ControllerSession {
    client: Arc<HotspotClient>,
    host: Url,
    tenant_id: Option<String>,
    operator: OperatorCredentials,
    active: RwLock<Option<ActiveSession>>,
}

impl ControllerSession {
    pub fn new(
        client: Arc<HotspotClient>,
        host: Url,
        tenant_id: Option<String>,
        operator: OperatorCredentials,
    ) -> Self {
        Self {
            client,
            host,
            tenant_id: tenant_id.filter(|id| !id.trim().is_empty()),
            operator,
            active: RwLock::new(None),
        }
    }

    /// Build a session from a portal config, sharing the given client.
    pub fn from_config(client: Arc<HotspotClient>, config: &PortalConfig) -> Self {
        Self::new(
            client,
            config.host.clone(),
            config.tenant_id.clone(),
            config.operator.clone(),
        )
    }

    /// The hotspot client calls are issued through.
    pub fn client(&self) -> &HotspotClient {
        &self.client
    }

    /// Base URLs to probe, most specific first:
    /// `{host}/omada/{id}`, `{host}/{id}`, `{host}`.
    pub fn base_candidates(&self) -> Result<Vec<Url>, CoreError> {
        let host = self.host.as_str().trim_end_matches('/');
        let mut raw = Vec::with_capacity(3);
        if let Some(id) = self.tenant_id.as_deref() {
            raw.push(format!("{host}/omada/{id}"));
            raw.push(format!("{host}/{id}"));
        }
        raw.push(host.to_owned());

        raw.iter()
            .map(|s| {
                Url::parse(s).map_err(|e| CoreError::Config {
                    message: format!("invalid controller base URL {s}: {e}"),
                })
            })
            .collect()
    }

    /// Return the held session, logging in first if there is none.
    pub async fn ensure_session(&self) -> Result<ActiveSession, CoreError> {
        if let Some(session) = self.active.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut guard = self.active.write().await;
        // Another task may have logged in while we waited for the lock.
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        self.login_locked(&mut guard).await
    }

    /// Drop any held session and log in again.
    pub async fn login(&self) -> Result<ActiveSession, CoreError> {
        let mut guard = self.active.write().await;
        self.login_locked(&mut guard).await
    }

    /// Forget the held session; the next `ensure_session` logs in again.
    pub async fn invalidate(&self) {
        if self.active.write().await.take().is_some() {
            debug!("controller session invalidated");
        }
    }

    /// Snapshot of the held session, if any.
    pub async fn current(&self) -> Option<ActiveSession> {
        self.active.read().await.clone()
    }

    async fn login_locked(
        &self,
        slot: &mut Option<ActiveSession>,
    ) -> Result<ActiveSession, CoreError> {
        *slot = None;

        let mut attempts = 0u32;
        let mut last_error = String::from("no login candidates");

        for base in self.base_candidates()? {
            for key in CredentialKey::ALL {
                attempts += 1;
                match self
                    .client
                    .login(&base, key, &self.operator.username, &self.operator.password)
                    .await
                {
                    Ok(token) => {
                        info!(base = %base, key = %key, "controller login OK");
                        let session = ActiveSession { base, token };
                        *slot = Some(session.clone());
                        return Ok(session);
                    }
                    Err(e) => {
                        debug!(base = %base, key = %key, error = %e, "login attempt failed");
                        last_error = e.to_string();
                    }
                }
            }
        }

        warn!(attempts, "controller login failed on every base URL");
        Err(CoreError::SessionFailed {
            attempts,
            last_error,
        })
    }
}
