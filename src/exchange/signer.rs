//! HMAC-SHA256 request signing for the exchange API.
//!
//! The exchange authenticates requests by an HMAC-SHA256 signature of the
//! serialized query string, computed with the caller's secret. Parameter
//! order is fixed: `timestamp` first, then the endpoint-specific fields,
//! then `recvWindow`, with `signature` appended last. Recomputing with the
//! same inputs always yields the same signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 digest of `query` keyed by `secret`.
///
/// Pure and deterministic. An empty secret produces a well-defined but
/// meaningless signature; enforcing non-emptiness is the caller's job.
pub fn sign(query: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// API credentials supplied by a caller.
///
/// `Debug` renders only a short key prefix so credentials never leak into
/// logs or error traces verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API key, sent as a request header
    pub api_key: String,
    /// API secret, used only to compute signatures
    pub api_secret: String,
}

impl Credentials {
    /// Create credentials from key and secret
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Redacted form of the API key, safe for logging
    pub fn redacted(&self) -> String {
        let prefix: String = self.api_key.chars().take(4).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.redacted())
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// An ordered, signed query string for an authenticated endpoint.
///
/// Field order is part of the signature, so parameters are kept as an
/// ordered sequence rather than a map.
#[derive(Debug, Clone)]
pub struct SignedQuery {
    params: Vec<(String, String)>,
}

impl SignedQuery {
    /// Start a query with the mandatory leading `timestamp` parameter
    /// (milliseconds since epoch)
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            params: vec![("timestamp".into(), timestamp_ms.to_string())],
        }
    }

    /// Append an endpoint-specific parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Append the trailing `recvWindow` parameter, sign the serialized
    /// query with `secret`, and return the final query string including
    /// the `signature` parameter
    pub fn finish(mut self, recv_window: u64, secret: &str) -> String {
        self.params.push(("recvWindow".into(), recv_window.to_string()));
        let query = serialize(&self.params);
        let signature = sign(&query, secret);
        format!("{}&signature={}", query, signature)
    }
}

fn serialize(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_signature_known_vector() {
        // Test vector from the exchange API documentation
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

        assert_eq!(
            sign(query, secret),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let sig = sign("a=1", "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signed_query_field_order() {
        let query = SignedQuery::new(1_700_000_000_000)
            .param("symbol", "BTCUSDT")
            .param("orderId", "123")
            .finish(5000, "secret");

        let expected_prefix = "timestamp=1700000000000&symbol=BTCUSDT&orderId=123&recvWindow=5000&signature=";
        assert!(query.starts_with(expected_prefix), "got {}", query);

        // Signature covers exactly the query before the signature parameter.
        let unsigned = "timestamp=1700000000000&symbol=BTCUSDT&orderId=123&recvWindow=5000";
        assert!(query.ends_with(&sign(unsigned, "secret")));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("AKIA1234SECRETKEY", "topsecret");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("SECRETKEY"));
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("AKIA…"));
    }

    proptest! {
        #[test]
        fn prop_sign_is_deterministic(query in ".*", secret in ".*") {
            prop_assert_eq!(sign(&query, &secret), sign(&query, &secret));
        }

        #[test]
        fn prop_distinct_secrets_distinct_signatures(
            query in "[a-z=&]{1,40}",
            secret in "[a-z]{1,20}",
        ) {
            let other = format!("{}x", secret);
            prop_assert_ne!(sign(&query, &secret), sign(&query, &other));
        }
    }
}
