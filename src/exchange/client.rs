//! HTTP client for the exchange REST API.
//!
//! Two kinds of work happen here: the trades view fetches account data
//! directly (server time first, then a signed userTrades call), and the
//! proof endpoints only *build* signed URLs which the external attestor
//! fetches on the caller's behalf.

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::exchange::signer::{Credentials, SignedQuery};

/// Header carrying the API key on authenticated endpoints
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Server time response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTimeResponse {
    server_time: u64,
}

/// A single account trade, as returned by the userTrades endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Trading pair symbol
    pub symbol: String,
    /// Trade id
    pub id: u64,
    /// Order id this trade filled
    pub order_id: u64,
    /// Fill price as a decimal string
    pub price: String,
    /// Fill quantity as a decimal string
    pub qty: String,
    /// Realized pnl as a decimal string
    #[serde(default)]
    pub realized_pnl: String,
    /// Whether the account was the buyer
    pub buyer: bool,
    /// Trade timestamp (milliseconds)
    pub time: u64,
}

/// HTTP client for the exchange REST API
pub struct ExchangeClient {
    client: Client,
    base_url: String,
    recv_window: u64,
}

impl ExchangeClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>, recv_window: u64, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!("zkrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            recv_window,
        })
    }

    /// Current local timestamp in milliseconds
    pub fn local_timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Fetch the exchange server time
    pub async fn server_time(&self) -> Result<u64> {
        let url = format!("{}/fapi/v1/time", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("server time request failed: {}", e)))?;

        let data: ServerTimeResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("failed to parse server time: {}", e)))?;

        Ok(data.server_time)
    }

    /// Fetch the account's recent trades for `symbol`.
    ///
    /// Reads the exchange server time first so the signed timestamp is
    /// within the server's tolerance window.
    pub async fn recent_trades(
        &self,
        credentials: &Credentials,
        symbol: &str,
    ) -> Result<Vec<TradeRecord>> {
        let timestamp = self.server_time().await?;
        let url = self.user_trades_url(credentials, symbol, None, timestamp);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &credentials.api_key)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("userTrades request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "userTrades returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("failed to parse userTrades: {}", e)))
    }

    /// Signed URL for the userTrades endpoint, optionally filtered by order id
    pub fn user_trades_url(
        &self,
        credentials: &Credentials,
        symbol: &str,
        order_id: Option<&str>,
        timestamp_ms: u64,
    ) -> String {
        let mut query = SignedQuery::new(timestamp_ms).param("symbol", symbol);
        if let Some(order_id) = order_id {
            query = query.param("orderId", order_id);
        }
        let query = query.finish(self.recv_window, &credentials.api_secret);

        format!("{}/fapi/v1/userTrades?{}", self.base_url, query)
    }

    /// Signed URL for the account balance endpoint
    pub fn balance_url(&self, credentials: &Credentials, timestamp_ms: u64) -> String {
        let query = SignedQuery::new(timestamp_ms).finish(self.recv_window, &credentials.api_secret);
        format!("{}/fapi/v2/balance?{}", self.base_url, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::signer::sign;

    fn test_client() -> ExchangeClient {
        ExchangeClient::new("https://fapi.example.com", 5000, 10_000).unwrap()
    }

    #[test]
    fn test_user_trades_url_shape() {
        let client = test_client();
        let creds = Credentials::new("key", "secret");

        let url = client.user_trades_url(&creds, "BTCUSDT", Some("123"), 1_700_000_000_000);

        assert!(url.starts_with(
            "https://fapi.example.com/fapi/v1/userTrades?timestamp=1700000000000&symbol=BTCUSDT&orderId=123&recvWindow=5000&signature="
        ));

        let unsigned = "timestamp=1700000000000&symbol=BTCUSDT&orderId=123&recvWindow=5000";
        assert!(url.ends_with(&sign(unsigned, "secret")));
    }

    #[test]
    fn test_balance_url_shape() {
        let client = test_client();
        let creds = Credentials::new("key", "secret");

        let url = client.balance_url(&creds, 42);
        assert!(url.starts_with(
            "https://fapi.example.com/fapi/v2/balance?timestamp=42&recvWindow=5000&signature="
        ));
    }

    #[test]
    fn test_signed_urls_are_deterministic() {
        let client = test_client();
        let creds = Credentials::new("key", "secret");

        let a = client.user_trades_url(&creds, "ETHUSDT", Some("9"), 1000);
        let b = client.user_trades_url(&creds, "ETHUSDT", Some("9"), 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_trade_record_parsing() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "id": 698759,
            "orderId": 25851813,
            "price": "7819.01",
            "qty": "0.002",
            "realizedPnl": "-0.91539999",
            "buyer": false,
            "time": 1569514978020
        }"#;

        let trade: TradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.order_id, 25851813);
        assert!(!trade.buyer);
    }
}
