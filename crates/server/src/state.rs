use crate::config::{AppConfig, ServerConfig};
use crate::error::{ServerError, ServerResult};
use gateway::Gateway;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use upstream::HttpVendorClient;

/// The Prometheus recorder is process-global; install it once.
static PROMETHEUS: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "could not install Prometheus recorder");
                None
            }
        })
        .clone()
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub gateway: Gateway,
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build the vendor client, open the store and wire the gateway.
    pub fn new(config: AppConfig) -> ServerResult<Self> {
        let vendor = HttpVendorClient::new(config.upstream)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let store = config
            .store
            .build()
            .map_err(|e| ServerError::Config(format!("failed to open store: {e}")))?;
        let gateway = Gateway::new(Arc::new(vendor), store, config.gateway);
        Ok(Self::with_gateway(config.server, gateway))
    }

    /// State around an already-built gateway.
    pub fn with_gateway(config: ServerConfig, gateway: Gateway) -> Self {
        let metrics = if config.metrics_enabled {
            prometheus_handle()
        } else {
            None
        };
        Self {
            config: Arc::new(config),
            gateway,
            metrics,
        }
    }

    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }
}
