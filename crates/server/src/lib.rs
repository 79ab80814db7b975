//! wmgate server: HTTP API for the image-erase gateway.
//!
//! Clients submit an image and mask, get back a vendor token, and later poll
//! status through the gateway, which stores the result URL once the vendor
//! reports it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! Public:
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (store reachable)
//! - `GET /metrics` - Prometheus metrics
//!
//! Under `/api` (API key required when keys are configured):
//!
//! - `POST /api/erase` - Submit `img` + `mask` multipart, returns `{token, message}`
//! - `POST /api/erase/status` - `{token}`, returns the vendor status JSON
//! - `GET /api/history?limit=N` - Recent calls
//! - `GET /api/history/stats` - Aggregate counters
//! - `GET /api/history/{token}` - One call, without image bytes
//! - `GET /api/history/{token}/image` - The submitted image

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{AppConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::ServerState;
