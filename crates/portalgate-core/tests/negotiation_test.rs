#![allow(clippy::unwrap_used)]
// Integration tests for `NegotiationEngine` against a wiremock controller.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use portalgate_api::HotspotClient;
use portalgate_core::{
    AuthType, CandidatePayload, ClientContext, ControllerSession, CoreError, GrantStatus,
    GrantStore, NO_VARIANT_MATCHED, NegotiationEngine, NegotiationPath, OperatorCredentials,
    TimeEncoding, VariantCache,
};

const REJECTED: &str = r#"{"errorCode":-41501,"msg":"Invalid request parameters."}"#;

const CALL_TIMEOUT: Duration = Duration::from_millis(200);
const SLOW_REPLY: Duration = Duration::from_millis(800);

// ── Helpers ─────────────────────────────────────────────────────────

fn engine_for(server: &MockServer, tenant: Option<&str>) -> NegotiationEngine {
    engine_with_http(server, tenant, reqwest::Client::new())
}

/// Engine whose calls give up after `CALL_TIMEOUT`.
fn impatient_engine(server: &MockServer, tenant: Option<&str>) -> NegotiationEngine {
    let http = reqwest::Client::builder()
        .timeout(CALL_TIMEOUT)
        .build()
        .unwrap();
    engine_with_http(server, tenant, http)
}

fn engine_with_http(
    server: &MockServer,
    tenant: Option<&str>,
    http: reqwest::Client,
) -> NegotiationEngine {
    let session = ControllerSession::new(
        Arc::new(HotspotClient::with_client(http)),
        Url::parse(&server.uri()).unwrap(),
        tenant.map(str::to_owned),
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

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": 0,
            "result": { "token": "csrf-abc" }
        })))
        .mount(server)
        .await;
}

/// Accept auth calls whose body satisfies `accepts`; reject the rest.
async fn mount_auth<F>(server: &MockServer, accepts: F)
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Mock::given(method("POST"))
        .and(path_regex(r"/api/v2/hotspot/extPortal/auth$"))
        .and(move |req: &Request| {
            serde_json::from_slice::<Value>(&req.body).is_ok_and(|body| accepts(&body))
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": 0,
            "msg": "Success."
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"/api/v2/hotspot/extPortal/auth$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REJECTED))
        .with_priority(10)
        .mount(server)
        .await;
}

fn keys(body: &Value) -> BTreeSet<&str> {
    body.as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// The end-to-end controller: `apMac` + `authType=8` + `duration`, nothing else.
fn ap_auth8_duration(body: &Value) -> bool {
    keys(body) == BTreeSet::from(["clientMac", "site", "authType", "apMac", "duration"])
        && body["authType"] == 8
}

async fn auth_calls(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path().ends_with("extPortal/auth"))
        .map(|req| serde_json::from_slice(&req.body).unwrap())
        .collect()
}

fn kiosk_context() -> ClientContext {
    ClientContext {
        site: Some("Default".into()),
        ap_mac: Some("11:22".into()),
        ..ClientContext::for_client("AA:BB")
    }
}

fn full_context() -> ClientContext {
    ClientContext {
        client_ip: Some("10.0.0.7".into()),
        gateway_mac: Some("33:44".into()),
        ssid_name: Some("Guest".into()),
        radio_id: Some("1".into()),
        vid: Some("20".into()),
        ..kiosk_context()
    }
}

fn learned_payload() -> CandidatePayload {
    CandidatePayload {
        client_mac: "AA:BB".into(),
        site: "Default".into(),
        auth_type: AuthType(8),
        client_ip: None,
        radio_id: None,
        ap_mac: Some("11:22".into()),
        gateway_mac: None,
        vid: None,
        ssid_name: None,
    }
}

// ── Context handling ────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_client_mac_makes_no_calls() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, None);

    let ctx = ClientContext {
        ap_mac: Some("11:22".into()),
        ..ClientContext::default()
    };
    let outcome = engine.authorize(&ctx, 86_400, true).await.unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.response, "no_ctx");
    assert_eq!(outcome.path, NegotiationPath::NoContext);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_seconds_is_rejected() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, None);

    let err = engine.authorize(&kiosk_context(), 0, false).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Search and cache ────────────────────────────────────────────────

#[tokio::test]
async fn test_end_to_end_search_then_cache() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, ap_auth8_duration).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();

    let first = engine.authorize(&ctx, 86_400, true).await.unwrap();
    assert!(first.ok);
    assert_eq!(first.path, NegotiationPath::Searched);
    assert_eq!(first.encoding, Some(TimeEncoding::Duration));
    // vid=100 candidates for auth 4/8/1, then the bare auth-4 pair, then the hit.
    assert_eq!(first.attempts, 9);

    let key = ctx.key().unwrap();
    let learned = engine.cache().get(&key).unwrap();
    assert_eq!(learned.payload, learned_payload());
    assert_eq!(learned.encoding, TimeEncoding::Duration);

    let second = engine.authorize(&ctx, 86_400, true).await.unwrap();
    assert!(second.ok);
    assert_eq!(second.path, NegotiationPath::Cached);
    assert_eq!(second.attempts, 1);

    let calls = auth_calls(&server).await;
    assert_eq!(calls.len(), 10);
    assert_eq!(calls[9]["duration"], 86_400);
}

#[tokio::test]
async fn test_success_records_long_grant() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| true).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();
    let key = ctx.key().unwrap();

    let before = chrono::Utc::now().timestamp();
    assert_eq!(engine.grants().status(&key, before), GrantStatus::Unauthorized);

    let outcome = engine.authorize(&ctx, 3_600, false).await.unwrap();
    assert!(outcome.ok);

    let GrantStatus::Authorized { expires } = engine.grants().status(&key, before) else {
        panic!("grant not recorded");
    };
    assert!(expires >= before + 3_600);
}

#[tokio::test]
async fn test_time_encoding_tried_first_by_default() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| true).await;
    let engine = engine_for(&server, None);

    let outcome = engine.authorize(&kiosk_context(), 60, false).await.unwrap();
    assert_eq!(outcome.encoding, Some(TimeEncoding::AbsoluteTime));
    assert_eq!(outcome.attempts, 1);

    let calls = auth_calls(&server).await;
    assert!(calls[0].get("duration").is_none());
    assert!(calls[0]["time"].as_i64().unwrap() > 1_000_000_000_000_000);
}

#[tokio::test]
async fn test_repeated_success_uses_one_call_each() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| true).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();

    engine.authorize(&ctx, 60, false).await.unwrap();
    for _ in 0..3 {
        let outcome = engine.authorize(&ctx, 60, false).await.unwrap();
        assert_eq!(outcome.path, NegotiationPath::Cached);
        assert_eq!(outcome.attempts, 1);
    }
    assert_eq!(auth_calls(&server).await.len(), 4);
}

#[tokio::test]
async fn test_cached_time_variant_promoted_to_duration() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| true).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();
    let key = ctx.key().unwrap();
    engine
        .cache()
        .set(key.clone(), learned_payload(), TimeEncoding::AbsoluteTime);

    let outcome = engine.authorize(&ctx, 60, true).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Promoted);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(
        engine.cache().get(&key).unwrap().encoding,
        TimeEncoding::Duration
    );
}

#[tokio::test]
async fn test_failed_promotion_keeps_time_variant() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |body| body.get("time").is_some()).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();
    let key = ctx.key().unwrap();
    engine
        .cache()
        .set(key.clone(), learned_payload(), TimeEncoding::AbsoluteTime);

    let outcome = engine.authorize(&ctx, 60, true).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Cached);
    assert_eq!(outcome.encoding, Some(TimeEncoding::AbsoluteTime));
    assert_eq!(outcome.attempts, 2);
    assert_eq!(
        engine.cache().get(&key).unwrap().encoding,
        TimeEncoding::AbsoluteTime
    );
}

#[tokio::test]
async fn test_stale_cache_falls_back_to_search() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, ap_auth8_duration).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();
    let key = ctx.key().unwrap();
    let mut stale = learned_payload();
    stale.auth_type = AuthType(1);
    engine
        .cache()
        .set(key.clone(), stale, TimeEncoding::Duration);

    let outcome = engine.authorize(&ctx, 60, true).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Searched);
    assert_eq!(outcome.attempts, 10);
    assert_eq!(engine.cache().get(&key).unwrap().payload, learned_payload());
}

// ── Failure paths ───────────────────────────────────────────────────

#[tokio::test]
async fn test_exhaustion_tries_all_54_and_returns_last_text() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| false).await;
    let engine = engine_for(&server, None);

    let outcome = engine.authorize(&full_context(), 60, true).await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Exhausted);
    assert_eq!(outcome.attempts, 54);
    assert_eq!(outcome.response, REJECTED);
    assert_eq!(auth_calls(&server).await.len(), 54);
    // Rejections alone keep the session.
    assert!(engine.session().current().await.is_some());
}

#[tokio::test]
async fn test_exhaustion_reports_last_call_text() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/extPortal/auth"))
        .and(|req: &Request| {
            serde_json::from_slice::<Value>(&req.body).is_ok_and(|b| b.get("time").is_some())
        })
        .respond_with(ResponseTemplate::new(503).set_body_string("time rejected"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/extPortal/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REJECTED))
        .with_priority(10)
        .mount(&server)
        .await;
    let engine = engine_for(&server, None);

    // Duration first, so every pair ends on the time-encoded call.
    let outcome = engine.authorize(&full_context(), 60, true).await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 54);
    assert_eq!(outcome.response, "time rejected");
    assert_ne!(outcome.response, NO_VARIANT_MATCHED);
}

#[tokio::test]
async fn test_exhaustion_after_cache_miss_counts_cache_call() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, |_| false).await;
    let engine = engine_for(&server, None);
    let ctx = full_context();
    engine
        .cache()
        .set(ctx.key().unwrap(), learned_payload(), TimeEncoding::Duration);

    let outcome = engine.authorize(&ctx, 60, false).await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 55);
}

#[tokio::test]
async fn test_unauthorized_exhaustion_drops_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/extPortal/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    let engine = engine_for(&server, None);

    let outcome = engine.authorize(&kiosk_context(), 60, false).await.unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.response, "token expired");
    assert!(engine.session().current().await.is_none());
}

#[tokio::test]
async fn test_session_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": -30109,
            "msg": "Invalid username or password."
        })))
        .mount(&server)
        .await;
    let engine = engine_for(&server, None);

    let err = engine
        .authorize(&kiosk_context(), 60, false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SessionFailed { attempts: 2, .. }));
    assert!(auth_calls(&server).await.is_empty());
}

#[tokio::test]
async fn test_empty_200_counts_as_success() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/extPortal/auth"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let engine = engine_for(&server, None);

    let outcome = engine.authorize(&full_context(), 60, false).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Searched);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.response, "");
}

// ── Transport failures ──────────────────────────────────────────────

#[tokio::test]
async fn test_timed_out_call_moves_to_next_variant() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/hotspot/extPortal/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "errorCode": 0 }))
                .set_delay(SLOW_REPLY),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_auth(&server, |_| true).await;
    let engine = impatient_engine(&server, None);

    let outcome = engine.authorize(&kiosk_context(), 60, false).await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.path, NegotiationPath::Searched);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.encoding, Some(TimeEncoding::Duration));
    assert!(engine.session().current().await.is_some());
}

#[tokio::test]
async fn test_login_skips_base_that_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/omada/t42/api/v2/hotspot/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": { "token": "late" } }))
                .set_delay(SLOW_REPLY),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/t42/api/v2/hotspot/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "token": "tok" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/t42/api/v2/hotspot/extPortal/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errorCode": 0 })))
        .mount(&server)
        .await;
    let engine = impatient_engine(&server, Some("t42"));

    let outcome = engine.authorize(&kiosk_context(), 60, false).await.unwrap();
    assert!(outcome.ok);

    let session = engine.session().current().await.unwrap();
    assert!(session.base.path().ends_with("/t42"));
    let logins = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("hotspot/login"))
        .count();
    assert_eq!(logins, 3);
}

// ── Session probing ─────────────────────────────────────────────────

#[tokio::test]
async fn test_login_walks_bases_and_keys() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/t42/api/v2/hotspot/login"))
        .and(|req: &Request| {
            serde_json::from_slice::<Value>(&req.body).is_ok_and(|b| b.get("username").is_some())
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "token": "tok" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/t42/api/v2/hotspot/extPortal/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errorCode": 0 })))
        .mount(&server)
        .await;
    let engine = engine_for(&server, Some("t42"));

    let outcome = engine.authorize(&kiosk_context(), 60, false).await.unwrap();
    assert!(outcome.ok);

    let session = engine.session().current().await.unwrap();
    assert!(session.base.path().ends_with("/t42"));

    let logins: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("hotspot/login"))
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(
        logins,
        [
            "/omada/t42/api/v2/hotspot/login",
            "/omada/t42/api/v2/hotspot/login",
            "/t42/api/v2/hotspot/login",
            "/t42/api/v2/hotspot/login",
        ]
    );
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_same_client_negotiations_are_serialized() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_auth(&server, ap_auth8_duration).await;
    let engine = engine_for(&server, None);
    let ctx = kiosk_context();

    let (a, b) = futures::join!(
        engine.authorize(&ctx, 60, true),
        engine.authorize(&ctx, 60, true)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a.ok && b.ok);

    let mut attempts = [a.attempts, b.attempts];
    attempts.sort_unstable();
    assert_eq!(attempts, [1, 9]);
    assert_eq!(auth_calls(&server).await.len(), 10);
}
