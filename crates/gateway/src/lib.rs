//! Erase-request orchestration.
//!
//! [`Gateway::submit`] takes an image and mask from a client, validates them
//! locally, checks the caller's vendor quota, uploads the pair, records the
//! call, and returns the vendor token. [`Gateway::relay_status`] forwards a
//! status query for that token and stores the result URL once the vendor
//! reports one.
//!
//! ```no_run
//! use std::sync::Arc;
//! use gateway::{ClientInfo, Gateway, GatewayConfig, Submission};
//! use store::StoreConfig;
//! use upstream::{HttpVendorClient, ImagePart, UpstreamConfig};
//!
//! # async fn demo(img: Vec<u8>, mask: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let vendor = Arc::new(HttpVendorClient::new(UpstreamConfig::default())?);
//! let store = StoreConfig::in_memory().build()?;
//! let gateway = Gateway::new(vendor, store, GatewayConfig::default());
//!
//! let receipt = gateway
//!     .submit(Submission {
//!         image: ImagePart::new(img).with_content_type("image/png"),
//!         mask: ImagePart::new(mask).with_content_type("image/png"),
//!         client: ClientInfo::default(),
//!     })
//!     .await?;
//! let status = gateway.relay_status(&receipt.token).await?;
//! println!("{}", status.response);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod gateway;
pub mod metrics;
mod relay;
mod submit;
mod types;
pub mod validate;

pub use crate::config::{BenefitPolicy, GatewayConfig};
pub use crate::error::GatewayError;
pub use crate::gateway::Gateway;
pub use crate::types::{ClientInfo, Persistence, RelayOutcome, Submission, SubmitReceipt};
