//! Relay configuration.
//!
//! All settings have production defaults and can be overridden through
//! `ZKRELAY_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default recvWindow forwarded to the exchange (milliseconds)
pub const DEFAULT_RECV_WINDOW: u64 = 5_000;

/// Default retry count passed through to the attestor for trade proofs
pub const DEFAULT_PROOF_RETRIES: u32 = 3;

/// Default delay between attestor retries (milliseconds)
pub const DEFAULT_PROOF_RETRY_DELAY_MS: u64 = 2_000;

/// Relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Bind address for the HTTP server
    pub bind: String,
    /// Directory where cached proof results are persisted
    pub cache_dir: PathBuf,
    /// Base URL of the exchange REST API
    pub exchange_url: String,
    /// Base URL of the external attestor service
    pub attestor_url: String,
    /// Application id presented to the attestor
    pub app_id: String,
    /// Application secret presented to the attestor
    pub app_secret: String,
    /// API key used by the trades view page
    pub view_api_key: String,
    /// API secret used by the trades view page
    pub view_api_secret: String,
    /// recvWindow query parameter (milliseconds)
    pub recv_window: u64,
    /// Retry count passed through to the attestor for trade proofs
    pub proof_retries: u32,
    /// Delay between attestor retries (milliseconds)
    pub proof_retry_delay_ms: u64,
    /// HTTP client timeout (milliseconds)
    pub http_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
            cache_dir: PathBuf::from("./proofs"),
            exchange_url: "https://fapi.binance.com".into(),
            attestor_url: "https://attestor.zkrelay.io".into(),
            app_id: String::new(),
            app_secret: String::new(),
            view_api_key: String::new(),
            view_api_secret: String::new(),
            recv_window: DEFAULT_RECV_WINDOW,
            proof_retries: DEFAULT_PROOF_RETRIES,
            proof_retry_delay_ms: DEFAULT_PROOF_RETRY_DELAY_MS,
            http_timeout_ms: 10_000,
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind: env_or("ZKRELAY_BIND", defaults.bind),
            cache_dir: std::env::var("ZKRELAY_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            exchange_url: env_or("ZKRELAY_EXCHANGE_URL", defaults.exchange_url),
            attestor_url: env_or("ZKRELAY_ATTESTOR_URL", defaults.attestor_url),
            app_id: env_or("ZKRELAY_APP_ID", defaults.app_id),
            app_secret: env_or("ZKRELAY_APP_SECRET", defaults.app_secret),
            view_api_key: env_or("ZKRELAY_API_KEY", defaults.view_api_key),
            view_api_secret: env_or("ZKRELAY_API_SECRET", defaults.view_api_secret),
            recv_window: env_parsed("ZKRELAY_RECV_WINDOW", defaults.recv_window),
            proof_retries: env_parsed("ZKRELAY_PROOF_RETRIES", defaults.proof_retries),
            proof_retry_delay_ms: env_parsed(
                "ZKRELAY_PROOF_RETRY_DELAY_MS",
                defaults.proof_retry_delay_ms,
            ),
            http_timeout_ms: env_parsed("ZKRELAY_HTTP_TIMEOUT_MS", defaults.http_timeout_ms),
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.recv_window, DEFAULT_RECV_WINDOW);
        assert_eq!(config.proof_retries, DEFAULT_PROOF_RETRIES);
        assert_eq!(config.cache_dir, PathBuf::from("./proofs"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = RelayConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RelayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.exchange_url, config.exchange_url);
    }
}
