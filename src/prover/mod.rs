//! Zero-knowledge attestation of HTTP responses.
//!
//! The proving work itself is owned by an external attestor service; this
//! module defines the request/response contract with it, the capability
//! trait it is reached through, and the orchestration around a single
//! proof: prove, verify, transform.

pub mod client;
pub mod requester;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub use client::{ProofProvider, ZkFetchClient};
pub use requester::{ProofRequester, RetryPolicy};

// ═══════════════════════════════════════════════════════════════════════════════
// PROOF REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// A rule telling the attestor which part of the fetched response to
/// attest, without revealing the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseMatch {
    /// Regex with a named capture group; only the captured fields are
    /// extracted and attested
    Regex {
        /// The pattern, e.g. `"balance":"(?<free>[\d.]+)"`
        pattern: String,
    },
    /// Substring containment check
    Contains {
        /// The required substring
        value: String,
    },
}

/// A request to the external proving capability.
///
/// The method is always GET; headers carry at least the API-key header
/// for authenticated endpoints. Retry and delay are passed through to the
/// attestor, never re-implemented locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// Target URL the attestor fetches
    pub url: String,
    /// HTTP method, fixed to GET
    pub method: String,
    /// Request headers (ordered for a stable wire encoding)
    pub headers: BTreeMap<String, String>,
    /// Response-matching rules; empty means full-response attestation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_matches: Vec<ResponseMatch>,
    /// Number of attempts the attestor should make
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Delay between attestor attempts (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

impl ProofRequest {
    /// Build a GET proof request for `url` with the given headers
    pub fn get(url: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".into(),
            headers,
            response_matches: Vec::new(),
            retry_count: None,
            retry_delay_ms: None,
        }
    }

    /// Attach response-matching rules
    pub fn with_matches(mut self, matches: Vec<ResponseMatch>) -> Self {
        self.response_matches = matches;
        self
    }

    /// Attach pass-through retry parameters
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry_count = Some(policy.count);
        self.retry_delay_ms = Some(policy.delay_ms);
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROOF TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Claim data inside a proof
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimData {
    /// Provider identifier (e.g. "http")
    pub provider: String,
    /// Serialized request parameters the claim covers
    pub parameters: String,
    /// Address of the claim owner
    pub owner: String,
    /// Claim timestamp (seconds)
    pub timestamp_s: u64,
    /// Serialized context, including extracted fields
    #[serde(default)]
    pub context: String,
    /// Claim identifier
    pub identifier: String,
    /// Attestor epoch the claim was signed in
    pub epoch: u64,
}

/// A cryptographic attestation produced by the external service,
/// certifying that a specific HTTP response (or matched fragment) was
/// observed from a given URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Claim identifier
    pub identifier: String,
    /// The attested claim
    pub claim_data: ClaimData,
    /// Attestor signatures over the claim
    pub signatures: Vec<String>,
    /// Values extracted by named capture groups, when matches were supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_parameter_values: Option<serde_json::Value>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORMED PROOF
// ═══════════════════════════════════════════════════════════════════════════════

/// Claim info section of the on-chain encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInfo {
    /// Provider identifier
    pub provider: String,
    /// Serialized request parameters
    pub parameters: String,
    /// Serialized context
    pub context: String,
}

/// The signed claim section of the on-chain encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedClaim {
    /// The claim tuple the signatures cover
    pub claim: CompleteClaimData,
    /// Attestor signatures
    pub signatures: Vec<String>,
}

/// The claim tuple inside a signed claim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteClaimData {
    /// Claim identifier
    pub identifier: String,
    /// Claim owner address
    pub owner: String,
    /// Claim timestamp (seconds)
    pub timestamp_s: u64,
    /// Attestor epoch
    pub epoch: u64,
}

/// A proof re-encoded into the form consumable by an external
/// ledger/verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedProof {
    /// Claim info section
    pub claim_info: ClaimInfo,
    /// Signed claim section
    pub signed_claim: SignedClaim,
}

/// The success payload returned to callers: both the raw proof and its
/// ledger-consumable form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// The transformed, ledger-consumable proof
    pub transformed_proof: TransformedProof,
    /// The raw proof as returned by the attestor
    pub proof: Proof,
}

impl ProofBundle {
    /// Serialize the bundle to a JSON value for caching and responses
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize proof bundle: {}", e)))
    }
}
