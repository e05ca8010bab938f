//! Exchange API integration.
//!
//! This module builds correctly-signed requests for the exchange's
//! authenticated REST endpoints and fetches the data the trades view
//! renders. The signing scheme is HMAC-SHA256 over the serialized query
//! string, with the API key carried in a request header.

pub mod client;
pub mod signer;

pub use client::{ExchangeClient, TradeRecord};
pub use signer::{sign, Credentials, SignedQuery};
