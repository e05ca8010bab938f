//! # zkrelay
//!
//! A small HTTP relay that asks an external zero-knowledge attestation
//! service to fetch authenticated exchange-API endpoints on a caller's
//! behalf, then verifies and forwards the resulting cryptographic proof.
//!
//! ## Architecture
//!
//! - **Exchange**: builds correctly-signed requests for the exchange REST
//!   API (HMAC-SHA256 over the query string)
//! - **Cache**: proof results keyed by a deterministic fingerprint of
//!   (api key, symbol, order id), over an injectable storage backend
//! - **Prover**: the capability interface to the external attestor and
//!   the prove → verify → transform orchestration around it
//! - **Rpc**: the axum HTTP facade
//!
//! The proving algorithm, circuit, and verification math live entirely in
//! the external service; the relay only speaks its request/response
//! contract.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cache;
pub mod config;
pub mod error;
pub mod exchange;
pub mod prover;
pub mod rpc;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{fingerprint, CacheEntry, FileStore, InMemoryStore, ProofCache, ProofStore};
    pub use crate::config::RelayConfig;
    pub use crate::error::{Error, Result};
    pub use crate::exchange::{sign, Credentials, ExchangeClient};
    pub use crate::prover::{
        Proof, ProofBundle, ProofProvider, ProofRequest, ProofRequester, ResponseMatch,
        RetryPolicy, TransformedProof, ZkFetchClient,
    };
    pub use crate::rpc::{router, AppState};
}

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
