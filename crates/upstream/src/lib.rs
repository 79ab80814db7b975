//! Client for the watermark-removal vendor API.
//!
//! The vendor exposes a trial endpoint, a benefit (quota) endpoint, an upload
//! endpoint and two status endpoints. Every call is a form or multipart POST
//! carrying browser-style headers; uploads are additionally signed with
//! [`Signer`] and correlated through an ephemeral id from [`generate_e_id`].
//!
//! ```no_run
//! use upstream::{HttpVendorClient, UpstreamConfig, VendorApi};
//!
//! # async fn demo() -> Result<(), upstream::UpstreamError> {
//! let client = HttpVendorClient::new(UpstreamConfig::default())?;
//! let reply = client.query_status("task-token").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod headers;
mod request;
pub mod response;
mod sign;
mod types;

pub use crate::client::{HttpVendorClient, VendorApi};
pub use crate::config::{Endpoints, UpstreamConfig};
pub use crate::error::UpstreamError;
pub use crate::request::{FilePart, RequestBody, SignedRequest};
pub use crate::response::{extract_result_url, extract_token};
pub use crate::sign::{ephemeral_id_from, generate_e_id, Signature, Signer, E_ID_SEED};
pub use crate::types::{BenefitLimits, ImageFacts, ImagePart, UploadReceipt, UploadRequest};
