//! HTTP facade for the relay.
//!
//! Four endpoints: an HTML view of the account's recent trades, proof
//! generation for a specific trade (cached) and for an asset balance, and
//! a debug endpoint that attests the relay's visible IP without touching
//! the exchange. The router is assembled here so tests can exercise it
//! without binding a socket.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::cache::{fingerprint, ProofCache, ProofStore};
use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::exchange::client::API_KEY_HEADER;
use crate::exchange::{Credentials, ExchangeClient, TradeRecord};
use crate::prover::{ProofProvider, ProofRequester, ResponseMatch, RetryPolicy};

/// Public page the debug endpoint attests; echoes the caller's IP
pub const DEBUG_PROXY_URL: &str = "https://api.ipify.org/?format=json";

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared application state
pub struct AppState {
    /// Relay configuration
    pub config: RelayConfig,
    /// Exchange API client
    pub exchange: ExchangeClient,
    /// Proof orchestration over the external capability
    pub requester: ProofRequester,
    /// Proof-result cache
    pub cache: ProofCache,
}

impl AppState {
    /// Assemble state from a configuration, a proving capability, and a
    /// cache backend
    pub fn new(
        config: RelayConfig,
        provider: Arc<dyn ProofProvider>,
        store: Box<dyn ProofStore>,
    ) -> Result<Self> {
        let exchange = ExchangeClient::new(
            config.exchange_url.clone(),
            config.recv_window,
            config.http_timeout_ms,
        )?;

        Ok(Self {
            config,
            exchange,
            requester: ProofRequester::new(provider),
            cache: ProofCache::new(store),
        })
    }

    fn trade_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.proof_retries, self.config.proof_retry_delay_ms)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct TradesQuery {
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TradeProofRequest {
    api_key: String,
    api_secret: String,
    symbol: String,
    #[serde(deserialize_with = "string_or_number")]
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct AssetProofRequest {
    api_key: String,
    api_secret: String,
    asset: String,
}

/// Accept an order id as either a JSON string or a JSON number
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

/// GET / - HTML view of the account's recent trades for a symbol
async fn trades_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> Response {
    let symbol = query.symbol.unwrap_or_else(|| "BTCUSDT".to_string());
    let credentials = Credentials::new(
        state.config.view_api_key.clone(),
        state.config.view_api_secret.clone(),
    );

    match state.exchange.recent_trades(&credentials, &symbol).await {
        Ok(trades) => Html(render_trades(&symbol, &trades)).into_response(),
        Err(err) => {
            error!(%err, %symbol, "trades view failed");
            error_response(&err)
        }
    }
}

/// POST /generateUSDMTradeProof - prove that a trade belongs to the caller
async fn generate_trade_proof(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TradeProofRequest>,
) -> Response {
    if let Err(err) = validate_order_id(&body.order_id) {
        error!(%err, "rejected trade proof request");
        return error_response(&err);
    }

    let credentials = Credentials::new(body.api_key, body.api_secret);
    let key = fingerprint(&credentials.api_key, &body.symbol, &body.order_id);

    match state.cache.read(&key) {
        Ok(Some(entry)) => {
            info!(api_key = %credentials.redacted(), symbol = %body.symbol, "trade proof served from cache");
            return (StatusCode::OK, Json(entry.data)).into_response();
        }
        Ok(None) => {}
        Err(err) => {
            error!(%err, "cache read failed");
            return error_response(&err);
        }
    }

    let timestamp = ExchangeClient::local_timestamp_ms();
    let url = state
        .exchange
        .user_trades_url(&credentials, &body.symbol, Some(&body.order_id), timestamp);

    let matches = vec![
        ResponseMatch::Contains {
            value: format!(r#""symbol":"{}""#, body.symbol),
        },
        ResponseMatch::Regex {
            pattern: format!(r#""orderId":(?<orderId>{})"#, body.order_id),
        },
    ];

    let result = state
        .requester
        .request_proof(
            url,
            api_key_headers(&credentials),
            matches,
            Some(state.trade_retry()),
        )
        .await
        .and_then(|bundle| bundle.to_value());

    match result {
        Ok(value) => {
            if let Err(err) = state.cache.write(&key, value.clone()) {
                error!(%err, "cache write failed");
                return error_response(&err);
            }
            info!(api_key = %credentials.redacted(), symbol = %body.symbol, "trade proof generated");
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(err) => {
            error!(%err, api_key = %credentials.redacted(), symbol = %body.symbol, "trade proof failed");
            error_response(&err)
        }
    }
}

/// POST /generateAssetProof - prove an asset's free balance
async fn generate_asset_proof(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AssetProofRequest>,
) -> Response {
    if let Err(err) = validate_asset(&body.asset) {
        error!(%err, "rejected asset proof request");
        return error_response(&err);
    }

    let credentials = Credentials::new(body.api_key, body.api_secret);

    let timestamp = ExchangeClient::local_timestamp_ms();
    let url = state.exchange.balance_url(&credentials, timestamp);

    let matches = vec![ResponseMatch::Regex {
        pattern: format!(r#""asset":"{}","balance":"(?<free>[0-9.]+)""#, body.asset),
    }];

    let result = state
        .requester
        .request_proof(url, api_key_headers(&credentials), matches, None)
        .await
        .and_then(|bundle| bundle.to_value());

    match result {
        Ok(value) => {
            info!(api_key = %credentials.redacted(), asset = %body.asset, "asset proof generated");
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(err) => {
            error!(%err, api_key = %credentials.redacted(), asset = %body.asset, "asset proof failed");
            error_response(&err)
        }
    }
}

/// POST /debugproxy - attest the relay's visible IP via a public page
async fn debug_proxy(State(state): State<Arc<AppState>>) -> Response {
    let result = state
        .requester
        .request_proof_full(DEBUG_PROXY_URL, BTreeMap::new())
        .await
        .and_then(|bundle| bundle.to_value());

    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            error!(%err, "debug proxy proof failed");
            error_response(&err)
        }
    }
}

/// An order id ends up interpolated into a regex pattern sent to the
/// attestor, so it must be strictly numeric.
fn validate_order_id(order_id: &str) -> Result<()> {
    if order_id.is_empty() || !order_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidParameter {
            name: "order_id".into(),
            reason: "must be a decimal order id".into(),
        });
    }
    Ok(())
}

/// Asset names are interpolated into a regex pattern too; the exchange
/// only uses alphanumeric tickers.
fn validate_asset(asset: &str) -> Result<()> {
    if asset.is_empty() || !asset.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::InvalidParameter {
            name: "asset".into(),
            reason: "must be an alphanumeric asset name".into(),
        });
    }
    Ok(())
}

fn api_key_headers(credentials: &Credentials) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(API_KEY_HEADER.to_string(), credentials.api_key.clone());
    headers
}

fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRADES VIEW RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

fn render_trades(symbol: &str, trades: &[TradeRecord]) -> String {
    let mut rows = String::new();
    for trade in trades {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            trade.id,
            trade.order_id,
            trade.price,
            trade.qty,
            if trade.buyer { "BUY" } else { "SELL" },
            trade.time,
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Recent trades — {symbol}</title></head>\n<body>\n\
         <h1>Recent trades for {symbol}</h1>\n\
         <table border=\"1\">\n\
         <tr><th>Trade</th><th>Order</th><th>Price</th><th>Qty</th><th>Side</th><th>Time</th></tr>\n\
         {rows}</table>\n</body>\n</html>\n"
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Build the relay router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(trades_view))
        .route("/generateUSDMTradeProof", post(generate_trade_proof))
        .route("/generateAssetProof", post(generate_asset_proof))
        .route("/debugproxy", post(debug_proxy))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
