//! Integration tests for the zkrelay HTTP facade.
//!
//! These exercise the full router over a stub proving capability and an
//! in-memory cache backend, without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use zkrelay::cache::InMemoryStore;
use zkrelay::config::RelayConfig;
use zkrelay::error::Result;
use zkrelay::prover::client::transform_for_ledger;
use zkrelay::prover::{
    ClaimData, Proof, ProofProvider, ProofRequest, ResponseMatch, TransformedProof,
};
use zkrelay::rpc::{router, AppState, DEBUG_PROXY_URL};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn sample_proof() -> Proof {
    Proof {
        identifier: "0xclaim".into(),
        claim_data: ClaimData {
            provider: "http".into(),
            parameters: r#"{"method":"GET"}"#.into(),
            owner: "0xowner".into(),
            timestamp_s: 1_700_000_000,
            context: r#"{"extractedParameters":{"orderId":"123"}}"#.into(),
            identifier: "0xclaim".into(),
            epoch: 3,
        },
        signatures: vec!["0xsignature".into()],
        extracted_parameter_values: None,
    }
}

/// Stub proving capability with a programmable outcome and call counter
struct StubProvider {
    proof: Option<Proof>,
    valid: bool,
    prove_calls: AtomicUsize,
    last_request: Mutex<Option<ProofRequest>>,
}

impl StubProvider {
    fn new(proof: Option<Proof>, valid: bool) -> Arc<Self> {
        Arc::new(Self {
            proof,
            valid,
            prove_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.prove_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofProvider for StubProvider {
    async fn fetch_and_prove(&self, request: &ProofRequest) -> Result<Option<Proof>> {
        self.prove_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(self.proof.clone())
    }

    async fn verify(&self, _proof: &Proof) -> Result<bool> {
        Ok(self.valid)
    }

    fn transform(&self, proof: &Proof) -> Result<TransformedProof> {
        transform_for_ledger(proof)
    }
}

fn test_config() -> RelayConfig {
    RelayConfig {
        // An unroutable local port so upstream calls fail fast in tests.
        exchange_url: "http://127.0.0.1:9".into(),
        ..RelayConfig::default()
    }
}

fn test_app(provider: Arc<StubProvider>) -> axum::Router {
    let state = AppState::new(
        test_config(),
        provider as Arc<dyn ProofProvider>,
        Box::new(InMemoryStore::new()),
    )
    .unwrap();
    router(Arc::new(state))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

const TRADE_BODY: &str =
    r#"{"api_key":"test-key","api_secret":"test-secret","symbol":"BTCUSDT","order_id":"123"}"#;

// ═══════════════════════════════════════════════════════════════════════════════
// TRADE PROOF ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_trade_proof_success_returns_both_forms() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let response = app
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body.get("transformedProof").is_some());
    assert!(body.get("proof").is_some());
    assert_eq!(body["proof"]["identifier"], "0xclaim");
}

#[tokio::test]
async fn test_trade_proof_is_cached_on_identical_request() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let first = app
        .clone()
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_string(first).await;

    let second = app
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_string(second).await;

    // Identical payload, and the prover was only invoked once.
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&first_body).unwrap(),
        serde_json::from_str::<serde_json::Value>(&second_body).unwrap()
    );
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_trade_proof_distinct_order_misses_cache() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let first = app
        .clone()
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let other =
        r#"{"api_key":"test-key","api_secret":"test-secret","symbol":"BTCUSDT","order_id":"124"}"#;
    let second = app
        .oneshot(post_json("/generateUSDMTradeProof", other))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_trade_proof_missing_proof_is_400() {
    let provider = StubProvider::new(None, true);
    let app = test_app(provider);

    let response = app
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Failed to generate proof");
}

#[tokio::test]
async fn test_trade_proof_invalid_proof_is_400() {
    let provider = StubProvider::new(Some(sample_proof()), false);
    let app = test_app(provider);

    let response = app
        .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Proof is invalid");
}

#[tokio::test]
async fn test_trade_proof_failure_is_not_cached() {
    let provider = StubProvider::new(None, true);
    let app = test_app(Arc::clone(&provider));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Both requests reached the prover: failures never populate the cache.
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_trade_proof_request_carries_signed_url_and_matches() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    app.oneshot(post_json("/generateUSDMTradeProof", TRADE_BODY))
        .await
        .unwrap();

    let request = provider.last_request.lock().unwrap().clone().unwrap();
    assert!(request.url.contains("/fapi/v1/userTrades?timestamp="));
    assert!(request.url.contains("&symbol=BTCUSDT&orderId=123&recvWindow="));
    assert!(request.url.contains("&signature="));
    assert_eq!(request.headers.get("X-MBX-APIKEY").unwrap(), "test-key");
    assert_eq!(request.response_matches.len(), 2);
    assert!(request.retry_count.is_some());
    assert!(request.retry_delay_ms.is_some());
}

#[tokio::test]
async fn test_trade_proof_rejects_order_id_with_metacharacters() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let body =
        r#"{"api_key":"test-key","api_secret":"test-secret","symbol":"BTCUSDT","order_id":"123|.*"}"#;
    let response = app
        .oneshot(post_json("/generateUSDMTradeProof", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Invalid parameter order_id"));
    // Rejected before any pattern was built or the attestor was contacted.
    assert_eq!(provider.calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET PROOF ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_asset_proof_success() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let body = r#"{"api_key":"test-key","api_secret":"test-secret","asset":"USDT"}"#;
    let response = app
        .oneshot(post_json("/generateAssetProof", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let request = provider.last_request.lock().unwrap().clone().unwrap();
    assert!(request.url.contains("/fapi/v2/balance?timestamp="));
    match &request.response_matches[..] {
        [ResponseMatch::Regex { pattern }] => {
            assert!(pattern.contains(r#""asset":"USDT""#));
            assert!(pattern.contains("(?<free>"));
        }
        other => panic!("unexpected matches: {:?}", other),
    }
    // No retry and no caching for balance proofs.
    assert_eq!(request.retry_count, None);
}

#[tokio::test]
async fn test_asset_proof_is_never_cached() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let body = r#"{"api_key":"test-key","api_secret":"test-secret","asset":"USDT"}"#;
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/generateAssetProof", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_asset_proof_rejects_non_alphanumeric_asset() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let body = r#"{"api_key":"test-key","api_secret":"test-secret","asset":"USDT\",\"x"}"#;
    let response = app
        .oneshot(post_json("/generateAssetProof", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Invalid parameter asset"));
    assert_eq!(provider.calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBUG PROXY ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_debug_proxy_attests_public_page_without_exchange() {
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(Arc::clone(&provider));

    let response = app
        .oneshot(post_json("/debugproxy", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body.get("transformedProof").is_some());

    let request = provider.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.url, DEBUG_PROXY_URL);
    assert!(request.response_matches.is_empty());
    assert!(request.headers.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRADES VIEW ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_trades_view_upstream_failure_is_500() {
    // The exchange URL in test_config points at an unroutable port, so the
    // server-time fetch fails before anything else happens.
    let provider = StubProvider::new(Some(sample_proof()), true);
    let app = test_app(provider);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/?symbol=BTCUSDT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
