use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{CallRecord, CallStore, StoreError, UrlUpdate};

/// Which backend [`StoreConfig::build`] creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Redb,
    InMemory,
}

/// Backend selection.
///
/// ```yaml
/// store:
///   backend: "redb"
///   path: "data/wmgate.redb"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database file, used by the redb backend only.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "data/wmgate.redb".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_path(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::InMemory,
            ..Default::default()
        }
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        Self {
            backend: StoreBackend::Redb,
            path: path.into(),
        }
    }

    pub fn build(&self) -> Result<Arc<dyn CallStore>, StoreError> {
        match self.backend {
            StoreBackend::InMemory => Ok(Arc::new(InMemoryCallStore::new())),
            StoreBackend::Redb => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(RedbCallStore::open(&self.path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// Records held in a `RwLock<HashMap>`; lost on restart.
#[derive(Default)]
pub struct InMemoryCallStore {
    records: RwLock<HashMap<String, CallRecord>>,
}

impl InMemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CallStore for InMemoryCallStore {
    fn create(&self, record: CallRecord) -> Result<(), StoreError> {
        // Check and insert under one write lock.
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if guard.contains_key(&record.token) {
            return Err(StoreError::DuplicateToken(record.token));
        }
        guard.insert(record.token.clone(), record);
        Ok(())
    }

    fn update_result_url(&self, token: &str, url: &str) -> Result<UrlUpdate, StoreError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let record = guard
            .get_mut(token)
            .ok_or_else(|| StoreError::UnknownToken(token.to_string()))?;
        Ok(apply_result_url(record, url))
    }

    fn get(&self, token: &str) -> Result<Option<CallRecord>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.get(token).cloned())
    }

    fn exists(&self, token: &str) -> Result<bool, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.contains_key(token))
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&CallRecord) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        for record in guard.values() {
            visitor(record)?;
        }
        Ok(())
    }
}

/// Shared update rule for both backends.
pub(crate) fn apply_result_url(record: &mut CallRecord, url: &str) -> UrlUpdate {
    if record.result_url.as_deref() == Some(url) {
        return UrlUpdate::Unchanged;
    }
    record.result_url = Some(url.to_string());
    record.updated_at = chrono::Utc::now();
    UrlUpdate::Updated
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbCallStore;
