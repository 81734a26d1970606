// ── Negotiation engine ──
//
// Turns "grant this client N seconds" into a definitive yes/no against a
// controller whose accepted payload shape is unknown up front:
//
//   ensure session -> cached variant (+ optional duration promotion)
//     -> brute force over the variant generator x both time encodings
//     -> record success -> outcome
//
// Rejected candidates and transport failures are ordinary misses; only a
// session failure ends a negotiation with `Err`.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use strum::{AsRefStr, Display};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use portalgate_api::HotspotClient;
use portalgate_api::hotspot::client::preview;

use crate::config::PortalConfig;
use crate::error::CoreError;
use crate::model::{CandidatePayload, ClientContext, ClientKey, TimeEncoding};
use crate::session::{ActiveSession, ControllerSession};
use crate::store::{GrantStore, VariantCache};
use crate::variants::payload_variants;

/// Response text when the context carries no client MAC.
pub const NO_CONTEXT: &str = "no_ctx";

/// Response text when no call was attempted at all.
pub const NO_VARIANT_MATCHED: &str = "no_variant_matched";

/// Response bodies are truncated to this many characters in logs.
const LOG_PREVIEW_CHARS: usize = 200;

/// Terminal state of one negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NegotiationPath {
    /// No client MAC; nothing was sent.
    NoContext,
    /// The learned variant succeeded as-is.
    Cached,
    /// The learned variant succeeded and was upgraded to `duration`.
    Promoted,
    /// The brute-force search found a working variant.
    Searched,
    /// Every candidate was rejected.
    Exhausted,
}

/// Result of [`NegotiationEngine::authorize`].
///
/// `response` is raw controller text for diagnostics and logs. It is not
/// meant for end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub ok: bool,
    pub response: String,
    pub path: NegotiationPath,
    /// Number of ext-portal auth calls issued.
    pub attempts: u32,
    /// Encoding of the winning call, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<TimeEncoding>,
}

impl AuthOutcome {
    pub fn no_context() -> Self {
        Self {
            ok: false,
            response: NO_CONTEXT.to_owned(),
            path: NegotiationPath::NoContext,
            attempts: 0,
            encoding: None,
        }
    }
}

/// Outcome of one ext-portal call as the search sees it.
struct CallResult {
    ok: bool,
    text: String,
    unauthorized: bool,
}

/// Per-negotiation bookkeeping.
struct Attempt<'a> {
    session: &'a ActiveSession,
    now: i64,
    seconds: u64,
    calls: u32,
    saw_unauthorized: bool,
    last_text: Option<String>,
}

/// Authorizes clients against the controller, learning per-client which
/// payload shape works.
pub struct NegotiationEngine {
    session: Arc<ControllerSession>,
    cache: Arc<VariantCache>,
    grants: Arc<GrantStore>,
    default_vlan: Option<u16>,
    /// Per-key single-flight gates; an entry is dropped once no negotiation
    /// holds or awaits it.
    inflight: DashMap<ClientKey, Arc<Mutex<()>>>,
}

impl NegotiationEngine {
    pub fn new(
        session: Arc<ControllerSession>,
        cache: Arc<VariantCache>,
        grants: Arc<GrantStore>,
        default_vlan: Option<u16>,
    ) -> Self {
        Self {
            session,
            cache,
            grants,
            default_vlan,
            inflight: DashMap::new(),
        }
    }

    /// Wire up a fresh client, session and empty stores from `config`.
    pub fn from_config(config: &PortalConfig) -> Result<Self, CoreError> {
        let client = Arc::new(HotspotClient::new(&config.transport())?);
        let session = Arc::new(ControllerSession::from_config(client, config));
        Ok(Self::new(
            session,
            Arc::new(VariantCache::new()),
            Arc::new(GrantStore::new()),
            config.default_vlan,
        ))
    }

    pub fn session(&self) -> &Arc<ControllerSession> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<VariantCache> {
        &self.cache
    }

    pub fn grants(&self) -> &Arc<GrantStore> {
        &self.grants
    }

    pub fn default_vlan(&self) -> Option<u16> {
        self.default_vlan
    }

    /// Grant `ctx` access for `seconds`.
    ///
    /// Returns `Ok` with `ok == false` for every outcome short of a session
    /// failure. Negotiations for the same client key run one at a time.
    pub async fn authorize(
        &self,
        ctx: &ClientContext,
        seconds: u64,
        prefer_duration: bool,
    ) -> Result<AuthOutcome, CoreError> {
        let Some(key) = ctx.key() else {
            debug!("authorize called without a client MAC");
            return Ok(AuthOutcome::no_context());
        };
        if seconds == 0 {
            return Err(CoreError::ValidationFailed {
                message: "grant length must be at least one second".into(),
            });
        }

        let gate = Arc::clone(&self.inflight.entry(key.clone()).or_default());
        let result = {
            let _guard = gate.lock().await;
            self.negotiate(ctx, &key, seconds, prefer_duration).await
        };
        drop(gate);
        // Only the map still holds the gate once no negotiation is queued on it.
        self.inflight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);
        result
    }

    /// The gated section: session, cache, search.
    async fn negotiate(
        &self,
        ctx: &ClientContext,
        key: &ClientKey,
        seconds: u64,
        prefer_duration: bool,
    ) -> Result<AuthOutcome, CoreError> {
        let session = self.session.ensure_session().await?;
        let mut attempt = Attempt {
            session: &session,
            now: chrono::Utc::now().timestamp(),
            seconds,
            calls: 0,
            saw_unauthorized: false,
            last_text: None,
        };

        if let Some(outcome) = self.try_cached(key, &mut attempt, prefer_duration).await {
            return Ok(outcome);
        }

        for candidate in payload_variants(ctx, self.default_vlan) {
            for encoding in TimeEncoding::trial_order(prefer_duration) {
                let result = self.call(&mut attempt, &candidate, encoding).await;
                if result.ok {
                    info!(client = %key, %encoding, calls = attempt.calls, "learned working variant");
                    self.cache.set(key.clone(), candidate, encoding);
                    return Ok(self.succeed(
                        key,
                        &attempt,
                        result.text,
                        NegotiationPath::Searched,
                        encoding,
                    ));
                }
            }
        }

        warn!(client = %key, calls = attempt.calls, "no payload variant accepted");
        if attempt.saw_unauthorized {
            self.session.invalidate().await;
        }
        Ok(AuthOutcome {
            ok: false,
            response: attempt
                .last_text
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| NO_VARIANT_MATCHED.to_owned()),
            path: NegotiationPath::Exhausted,
            attempts: attempt.calls,
            encoding: None,
        })
    }

    /// The cache fast path. `None` means fall through to the search.
    async fn try_cached(
        &self,
        key: &ClientKey,
        attempt: &mut Attempt<'_>,
        prefer_duration: bool,
    ) -> Option<AuthOutcome> {
        let learned = self.cache.get(key)?;
        debug!(client = %key, encoding = %learned.encoding, "trying cached variant");

        let first = self.call(attempt, &learned.payload, learned.encoding).await;
        if !first.ok {
            debug!(client = %key, "cached variant rejected, falling back to search");
            return None;
        }

        if prefer_duration && learned.encoding == TimeEncoding::AbsoluteTime {
            let promoted = self
                .call(attempt, &learned.payload, TimeEncoding::Duration)
                .await;
            if promoted.ok {
                debug!(client = %key, "cached variant promoted to duration");
                self.cache
                    .set(key.clone(), learned.payload, TimeEncoding::Duration);
                return Some(self.succeed(
                    key,
                    attempt,
                    promoted.text,
                    NegotiationPath::Promoted,
                    TimeEncoding::Duration,
                ));
            }
            debug!(client = %key, "duration promotion rejected, keeping time mode");
        }

        Some(self.succeed(
            key,
            attempt,
            first.text,
            NegotiationPath::Cached,
            learned.encoding,
        ))
    }

    fn succeed(
        &self,
        key: &ClientKey,
        attempt: &Attempt<'_>,
        response: String,
        path: NegotiationPath,
        encoding: TimeEncoding,
    ) -> AuthOutcome {
        let until = self
            .grants
            .record_long_grant(key, attempt.now, attempt.seconds);
        debug!(client = %key, %path, until, "grant recorded");
        AuthOutcome {
            ok: true,
            response,
            path,
            attempts: attempt.calls,
            encoding: Some(encoding),
        }
    }

    /// One ext-portal auth call. Never fails; transport errors are misses.
    async fn call(
        &self,
        attempt: &mut Attempt<'_>,
        candidate: &CandidatePayload,
        encoding: TimeEncoding,
    ) -> CallResult {
        attempt.calls += 1;
        let body = candidate.with_time(encoding.field(attempt.now, attempt.seconds));
        let reply = self
            .session
            .client()
            .ext_portal_auth(&attempt.session.base, &attempt.session.token, &body)
            .await;

        let shape = serde_json::to_string(candidate).unwrap_or_default();
        let result = match reply {
            Ok(reply) => {
                debug!(
                    base = %attempt.session.base,
                    status = reply.status,
                    ok = reply.is_accepted(),
                    %encoding,
                    payload = %shape,
                    response = preview(&reply.body, LOG_PREVIEW_CHARS),
                    "ext-portal auth"
                );
                CallResult {
                    ok: reply.is_accepted(),
                    unauthorized: reply.is_unauthorized(),
                    text: reply.body,
                }
            }
            Err(e) => {
                debug!(
                    base = %attempt.session.base,
                    %encoding,
                    payload = %shape,
                    error = %e,
                    "ext-portal auth transport failure"
                );
                CallResult {
                    ok: false,
                    unauthorized: false,
                    text: e.to_string(),
                }
            }
        };

        attempt.saw_unauthorized |= result.unauthorized;
        if !result.ok {
            attempt.last_text = Some(result.text.clone());
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::OperatorCredentials;

    fn unreachable_engine() -> NegotiationEngine {
        // Nothing listens on the discard port, so every login attempt fails fast.
        let session = ControllerSession::new(
            Arc::new(HotspotClient::with_client(reqwest::Client::new())),
            url::Url::parse("http://127.0.0.1:9").unwrap(),
            None,
            OperatorCredentials {
                username: "kiosk_op".into(),
                password: SecretString::from("op-secret".to_string()),
            },
        );
        NegotiationEngine::new(
            Arc::new(session),
            Arc::new(VariantCache::new()),
            Arc::new(GrantStore::new()),
            Some(100),
        )
    }

    #[tokio::test]
    async fn gate_is_released_after_negotiation() {
        let engine = unreachable_engine();
        let ctx = ClientContext::for_client("AA:BB");

        let err = engine.authorize(&ctx, 60, false).await.unwrap_err();
        assert!(matches!(err, CoreError::SessionFailed { attempts: 2, .. }));
        assert!(engine.inflight.is_empty());
    }

    #[test]
    fn no_context_outcome() {
        let outcome = AuthOutcome::no_context();
        assert!(!outcome.ok);
        assert_eq!(outcome.response, "no_ctx");
        assert_eq!(outcome.path, NegotiationPath::NoContext);
        assert_eq!(outcome.attempts, 0);
    }

    #[test]
    fn path_names_are_snake_case() {
        assert_eq!(NegotiationPath::NoContext.to_string(), "no_context");
        assert_eq!(NegotiationPath::Promoted.as_ref(), "promoted");
    }

    #[test]
    fn outcome_serializes_without_absent_encoding() {
        let json = serde_json::to_value(AuthOutcome::no_context()).unwrap_or_default();
        assert_eq!(json["path"], "no_context");
        assert!(json.get("encoding").is_none());
    }
}
