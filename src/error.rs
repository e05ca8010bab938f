//! Error types for the zkrelay service.
//!
//! This module defines all error types used throughout the relay,
//! providing clear and actionable error messages. The two proof-failure
//! variants render the exact strings the HTTP contract promises to
//! callers.

use thiserror::Error;

/// Result type alias for zkrelay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the zkrelay service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Proof Errors
    // ═══════════════════════════════════════════════════════════════════

    /// The proving service returned no proof
    #[error("Failed to generate proof")]
    ProofGenerationFailed,

    /// A proof was returned but failed signature verification
    #[error("Proof is invalid")]
    ProofInvalid,

    /// Re-encoding the proof into its on-chain form failed
    #[error("Proof transform failed: {0}")]
    TransformFailed(String),

    // ═══════════════════════════════════════════════════════════════════
    // Upstream Errors
    // ═══════════════════════════════════════════════════════════════════

    /// The exchange API or a proxied page was unreachable or rejected us
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The attestor service itself failed (network, protocol, 5xx)
    #[error("Attestor request failed: {0}")]
    Attestor(String),

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Storage / Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code this error surfaces as.
    ///
    /// Proof failures are the caller's problem (400); everything else is
    /// a server-side or upstream fault (500).
    pub fn http_status(&self) -> u16 {
        match self {
            Error::ProofGenerationFailed | Error::ProofInvalid => 400,
            _ => 500,
        }
    }
}
