use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use store::{CallRecord, CallStats, CallStore, CallSummary, StoreError};
use upstream::VendorApi;

use crate::metrics::record_upstream;
use crate::{GatewayConfig, GatewayError};

/// Orchestrates erase submissions and status relays.
///
/// Cheap to clone; the vendor client and store are shared.
#[derive(Clone)]
pub struct Gateway {
    pub(crate) vendor: Arc<dyn VendorApi>,
    pub(crate) store: Arc<dyn CallStore>,
    pub(crate) config: Arc<GatewayConfig>,
}

impl Gateway {
    pub fn new(vendor: Arc<dyn VendorApi>, store: Arc<dyn CallStore>, config: GatewayConfig) -> Self {
        Self {
            vendor,
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Newest calls first.
    pub async fn history(&self, limit: usize) -> Result<Vec<CallSummary>, GatewayError> {
        self.with_store(move |store| store.recent(limit)).await
    }

    pub async fn stats(&self) -> Result<CallStats, GatewayError> {
        self.with_store(|store| store.stats()).await
    }

    /// Full record including image bytes.
    pub async fn record(&self, token: &str) -> Result<CallRecord, GatewayError> {
        let owned = token.to_string();
        self.with_store(move |store| store.get(&owned))
            .await?
            .ok_or_else(|| GatewayError::UnknownToken(token.to_string()))
    }

    /// Cheap liveness probe of the store, used by readiness checks.
    pub async fn store_ready(&self) -> bool {
        self.with_store(|store| store.exists("")).await.is_ok()
    }

    /// Run a blocking store call off the async workers.
    pub(crate) async fn with_store<T, F>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&dyn CallStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| GatewayError::Internal(format!("store task failed: {e}")))?
            .map_err(GatewayError::from)
    }
}

/// Await a vendor call and record its latency.
pub(crate) async fn timed<T>(operation: &'static str, call: impl Future<Output = T>) -> T {
    let started = Instant::now();
    let out = call.await;
    record_upstream(operation, started.elapsed());
    out
}
