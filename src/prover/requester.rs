//! Proof orchestration: prove, verify, transform.
//!
//! A single proof request flows through three steps against the external
//! capability. The attestor owns retry and backoff; this module only
//! passes the parameters through.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::prover::client::ProofProvider;
use crate::prover::{ProofBundle, ProofRequest, ResponseMatch};

/// Retry parameters passed through to the attestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of attempts
    pub count: u32,
    /// Delay between attempts (milliseconds)
    pub delay_ms: u64,
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(count: u32, delay_ms: u64) -> Self {
        Self { count, delay_ms }
    }
}

/// Orchestrates proof requests against a [`ProofProvider`]
pub struct ProofRequester {
    provider: Arc<dyn ProofProvider>,
}

impl ProofRequester {
    /// Create a requester over the given provider
    pub fn new(provider: Arc<dyn ProofProvider>) -> Self {
        Self { provider }
    }

    /// Request a proof for `url` with selective disclosure.
    ///
    /// The attestor fetches the URL with the supplied headers, checks each
    /// match rule against the response, and attests only the matched
    /// fields. A returned-but-invalid proof is a distinct failure from no
    /// proof at all: verification runs even when the attestor reports
    /// success.
    pub async fn request_proof(
        &self,
        url: impl Into<String>,
        headers: BTreeMap<String, String>,
        matches: Vec<ResponseMatch>,
        retry: Option<RetryPolicy>,
    ) -> Result<ProofBundle> {
        let mut request = ProofRequest::get(url, headers).with_matches(matches);
        if let Some(policy) = retry {
            request = request.with_retry(policy);
        }

        self.run(request).await
    }

    /// Request a full-response attestation of `url`: no match rules, no
    /// field redaction, no retry. Used for debugging and health-check
    /// style calls where selective disclosure is not required.
    pub async fn request_proof_full(
        &self,
        url: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Result<ProofBundle> {
        self.run(ProofRequest::get(url, headers)).await
    }

    async fn run(&self, request: ProofRequest) -> Result<ProofBundle> {
        debug!(url = %request.url, matches = request.response_matches.len(), "requesting proof");

        let proof = self
            .provider
            .fetch_and_prove(&request)
            .await?
            .ok_or(Error::ProofGenerationFailed)?;

        if !self.provider.verify(&proof).await? {
            warn!(identifier = %proof.identifier, "proof failed signature verification");
            return Err(Error::ProofInvalid);
        }

        let transformed_proof = self.provider.transform(&proof)?;

        Ok(ProofBundle {
            transformed_proof,
            proof,
        })
    }
}
