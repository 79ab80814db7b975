use gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use store::StoreConfig;
use upstream::UpstreamConfig;

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds. Must exceed the vendor upload timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB (image and mask together).
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Accepted API keys. Empty disables authentication.
    #[serde(default)]
    pub api_keys: HashSet<String>,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// `tracing` env-filter directive, e.g. `info` or `gateway=debug,info`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log lines; plain text otherwise.
    #[serde(default = "default_true")]
    pub json_logs: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            json_logs: default_true(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

/// Everything the binary needs, one section per crate.
///
/// ```toml
/// [server]
/// port = 8080
///
/// [upstream]
/// timeout_secs = 10
///
/// [gateway]
/// benefit_policy = "best_effort"
///
/// [store]
/// path = "/var/lib/wmgate/calls.redb"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load from `.env`, an optional `wmgate.{toml,yaml,json}` file and
    /// `WMGATE__SECTION__KEY` environment variables, in increasing priority.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("wmgate").required(false))
            .add_source(
                config::Environment::with_prefix("WMGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.api_keys")
                    .with_list_parse_key("gateway.allowed_content_types")
                    .with_list_parse_key("upstream.user_agents")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.upstream.validate()?;
        if self.server.timeout_secs <= self.upstream.upload_timeout_secs {
            tracing::warn!(
                server_timeout = self.server.timeout_secs,
                upload_timeout = self.upstream.upload_timeout_secs,
                "request timeout does not exceed the vendor upload timeout"
            );
        }
        if self.server.max_body_size() as u64 <= self.gateway.max_file_bytes {
            tracing::warn!(
                max_body_mb = self.server.max_body_size_mb,
                max_file_bytes = self.gateway.max_file_bytes,
                "body limit is below the per-file limit; large uploads will be cut off"
            );
        }
        Ok(())
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    110
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
