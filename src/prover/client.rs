//! Capability interface to the external attestor service.
//!
//! The attestor is a black box reached over HTTP: it fetches a URL on our
//! behalf, runs its zero-knowledge circuit over the TLS transcript, and
//! returns a signed claim. `ProofProvider` is the seam the rest of the
//! relay (and the tests) program against; `ZkFetchClient` is the
//! production adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::prover::{
    ClaimInfo, CompleteClaimData, Proof, ProofRequest, SignedClaim, TransformedProof,
};

/// The external proving capability.
///
/// `fetch_and_prove` and `verify` are remote calls; `transform` is a pure
/// re-encoding of an already-obtained proof.
#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Ask the attestor to fetch the request's URL and produce a proof.
    ///
    /// Returns `Ok(None)` when the attestor completed without producing a
    /// proof; transport and protocol failures are errors.
    async fn fetch_and_prove(&self, request: &ProofRequest) -> Result<Option<Proof>>;

    /// Independently verify a proof's signatures against the attestor's
    /// verification routine
    async fn verify(&self, proof: &Proof) -> Result<bool>;

    /// Re-encode a proof into its ledger-consumable form
    fn transform(&self, proof: &Proof) -> Result<TransformedProof>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProveEnvelope<'a> {
    application_id: &'a str,
    #[serde(flatten)]
    request: &'a ProofRequest,
}

#[derive(Debug, Deserialize)]
struct ProveResponse {
    proof: Option<Proof>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// HTTP adapter for the attestor service
pub struct ZkFetchClient {
    client: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl ZkFetchClient {
    /// Create a client for the attestor at `base_url`, authenticated with
    /// the relay's application credentials
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!("zkrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        })
    }
}

#[async_trait]
impl ProofProvider for ZkFetchClient {
    async fn fetch_and_prove(&self, request: &ProofRequest) -> Result<Option<Proof>> {
        let url = format!("{}/prove", self.base_url);
        let envelope = ProveEnvelope {
            application_id: &self.app_id,
            request,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.app_secret)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| Error::Attestor(format!("prove request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Attestor(format!("prove returned {}: {}", status, body)));
        }

        let data: ProveResponse = response
            .json()
            .await
            .map_err(|e| Error::Attestor(format!("failed to parse prove response: {}", e)))?;

        Ok(data.proof)
    }

    async fn verify(&self, proof: &Proof) -> Result<bool> {
        let url = format!("{}/verify", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.app_secret)
            .json(proof)
            .send()
            .await
            .map_err(|e| Error::Attestor(format!("verify request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Attestor(format!("verify returned {}: {}", status, body)));
        }

        let data: VerifyResponse = response
            .json()
            .await
            .map_err(|e| Error::Attestor(format!("failed to parse verify response: {}", e)))?;

        Ok(data.valid)
    }

    fn transform(&self, proof: &Proof) -> Result<TransformedProof> {
        transform_for_ledger(proof)
    }
}

/// Re-encode a raw proof into the on-chain tuple form.
///
/// The encoding splits the claim into its info section (provider,
/// parameters, context) and the signed tuple (identifier, owner,
/// timestamp, epoch) the signatures cover.
pub fn transform_for_ledger(proof: &Proof) -> Result<TransformedProof> {
    if proof.signatures.is_empty() {
        return Err(Error::TransformFailed("proof carries no signatures".into()));
    }

    Ok(TransformedProof {
        claim_info: ClaimInfo {
            provider: proof.claim_data.provider.clone(),
            parameters: proof.claim_data.parameters.clone(),
            context: proof.claim_data.context.clone(),
        },
        signed_claim: SignedClaim {
            claim: CompleteClaimData {
                identifier: proof.identifier.clone(),
                owner: proof.claim_data.owner.clone(),
                timestamp_s: proof.claim_data.timestamp_s,
                epoch: proof.claim_data.epoch,
            },
            signatures: proof.signatures.clone(),
        },
    })
}
