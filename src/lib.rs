//! Workspace umbrella crate for wmgate.
//!
//! wmgate sits between clients and a third-party watermark-removal vendor.
//! It signs and forwards erase requests, relays task status, and keeps a
//! local audit record of every call. The pieces live in their own crates and
//! are re-exported here:
//!
//! - [`upstream`]: vendor client (signature, e_id, browser headers, reqwest)
//! - [`store`]: call records in redb or memory
//! - [`gateway`]: submit and relay orchestration
//! - `server` (feature `server`): the axum HTTP surface and binary
//!
//! ```no_run
//! use std::sync::Arc;
//! use wmgate::{Gateway, GatewayConfig, HttpVendorClient, StoreConfig, UpstreamConfig};
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let vendor = Arc::new(HttpVendorClient::new(UpstreamConfig::default())?);
//! let store = StoreConfig::redb("data/wmgate.redb").build()?;
//! let gateway = Gateway::new(vendor, store, GatewayConfig::default());
//! # let _ = gateway;
//! # Ok(())
//! # }
//! ```

pub use gateway;
pub use store;
pub use upstream;

#[cfg(feature = "server")]
pub use server;

pub use gateway::{
    BenefitPolicy, ClientInfo, Gateway, GatewayConfig, GatewayError, Persistence, RelayOutcome,
    Submission, SubmitReceipt,
};
pub use store::{CallRecord, CallStats, CallStore, CallSummary, StoreConfig, StoreError};
pub use upstream::{
    HttpVendorClient, ImagePart, Signer, UpstreamConfig, UpstreamError, VendorApi,
};
