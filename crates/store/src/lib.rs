//! Audit store for erase calls.
//!
//! Every successful submission leaves one [`CallRecord`] keyed by the vendor
//! token; status relays later fill in its `result_url`. Records are never
//! deleted.
//!
//! # Backends
//!
//! - [`RedbCallStore`]: file-backed, records bincode-encoded in one redb table.
//! - [`InMemoryCallStore`]: `RwLock<HashMap>`, for tests and throwaway runs.
//!
//! ```
//! use store::{CallRecord, CallStore, StoreConfig, UrlUpdate};
//!
//! let store = StoreConfig::in_memory().build().unwrap();
//! store.create(CallRecord::new("tok", "eid", vec![1], vec![2])).unwrap();
//! let outcome = store.update_result_url("tok", "https://cdn/x.jpg").unwrap();
//! assert_eq!(outcome, UrlUpdate::Updated);
//! ```
//!
//! The trait is synchronous; async callers wrap calls in
//! `tokio::task::spawn_blocking`.

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;

mod backend;
mod record;

pub use backend::{InMemoryCallStore, StoreBackend, StoreConfig};
#[cfg(feature = "backend-redb")]
pub use backend::RedbCallStore;
pub use record::{CallRecord, CallStats, CallSummary, UrlUpdate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a call with token {0} already exists")]
    DuplicateToken(String),
    #[error("no call with token {0}")]
    UnknownToken(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

pub(crate) fn encode_record(record: &CallRecord) -> Result<Vec<u8>, StoreError> {
    Ok(encode_to_vec(record, standard())?)
}

pub(crate) fn decode_record(bytes: &[u8]) -> Result<CallRecord, StoreError> {
    let (record, _) = decode_from_slice(bytes, standard())?;
    Ok(record)
}

#[cfg(feature = "backend-redb")]
pub(crate) fn encode_summary(summary: &CallSummary) -> Result<Vec<u8>, StoreError> {
    Ok(encode_to_vec(summary, standard())?)
}

#[cfg(feature = "backend-redb")]
pub(crate) fn decode_summary(bytes: &[u8]) -> Result<CallSummary, StoreError> {
    let (summary, _) = decode_from_slice(bytes, standard())?;
    Ok(summary)
}

/// Persistence for [`CallRecord`]s.
pub trait CallStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::DuplicateToken`] if the
    /// token is already present; the existing record is left untouched.
    fn create(&self, record: CallRecord) -> Result<(), StoreError>;

    /// Set the result URL. Idempotent: an identical URL is a no-op.
    fn update_result_url(&self, token: &str, url: &str) -> Result<UrlUpdate, StoreError>;

    fn get(&self, token: &str) -> Result<Option<CallRecord>, StoreError>;

    /// Visit every record, in no particular order.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&CallRecord) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    fn exists(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.get(token)?.is_some())
    }

    /// Visit every record's summary. Backends that keep summaries apart from
    /// the blobs override this so listings never load image bytes.
    fn scan_summaries(
        &self,
        visitor: &mut dyn FnMut(CallSummary) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.scan(&mut |record| visitor(record.summary()))
    }

    /// Newest calls first, at most `limit` of them.
    fn recent(&self, limit: usize) -> Result<Vec<CallSummary>, StoreError> {
        let mut summaries = Vec::new();
        self.scan_summaries(&mut |summary| {
            summaries.push(summary);
            Ok(())
        })?;
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries.truncate(limit);
        Ok(summaries)
    }

    fn stats(&self) -> Result<CallStats, StoreError> {
        let today = Utc::now().date_naive();
        let mut stats = CallStats::default();
        let mut ips = HashSet::new();
        self.scan_summaries(&mut |summary| {
            stats.total_calls += 1;
            if summary.result_url.is_some() {
                stats.resolved_calls += 1;
            }
            if summary.created_at.date_naive() == today {
                stats.today_calls += 1;
            }
            if let Some(ip) = summary.client_ip {
                ips.insert(ip);
            }
            Ok(())
        })?;
        stats.unique_ips = ips.len() as u64;
        if stats.total_calls > 0 {
            let rate = stats.resolved_calls as f64 / stats.total_calls as f64 * 100.0;
            stats.success_rate = (rate * 100.0).round() / 100.0;
        }
        Ok(stats)
    }
}
