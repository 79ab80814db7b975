//! Configuration for the vendor client.
//!
//! Everything the client needs (endpoint URLs, signing material, timeouts and
//! the browser profile it presents) lives in [`UpstreamConfig`], which is
//! passed in at construction. Defaults point at the vendor's production API.
//!
//! ```yaml
//! upstream:
//!   endpoints:
//!     upload: "https://ai-api.apeaksoft.com/v6/removeWM/upload"
//!   product_id: "56"
//!   timeout_secs: 10
//!   upload_timeout_secs: 30
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::UpstreamError;

/// Vendor endpoint URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    #[serde(default = "default_trial_url")]
    pub trial: String,
    #[serde(default = "default_benefit_url")]
    pub benefit_status: String,
    #[serde(default = "default_upload_url")]
    pub upload: String,
    /// Initial probe issued right after upload.
    #[serde(default = "default_wm_url")]
    pub wm_status: String,
    /// Polled status endpoint used by the relay.
    #[serde(default = "default_status_url")]
    pub poll_status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            trial: default_trial_url(),
            benefit_status: default_benefit_url(),
            upload: default_upload_url(),
            wm_status: default_wm_url(),
            poll_status: default_status_url(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at `base`, keeping the vendor's path layout.
    ///
    /// Used by tests and staging setups that run a stand-in vendor.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            trial: format!("{base}/v9/product/trial"),
            benefit_status: format!("{base}/v9/benefit/status"),
            upload: format!("{base}/v6/removeWM/upload"),
            wm_status: format!("{base}/v6/removeWM/WM"),
            poll_status: format!("{base}/v6/removeWM/status"),
        }
    }
}

/// Runtime configuration for [`HttpVendorClient`](crate::HttpVendorClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Product id sent to the trial and benefit endpoints.
    #[serde(default = "default_product_id")]
    pub product_id: String,

    /// AES-128 key used for the upload signature (16 bytes).
    #[serde(default = "default_sign_key")]
    pub sign_key: String,

    /// AES-128-CBC IV used for the upload signature (16 bytes).
    #[serde(default = "default_sign_iv")]
    pub sign_iv: String,

    /// Timeout for benefit and trial calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for upload and status calls, in seconds.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User agents picked from at random, one per request.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            product_id: default_product_id(),
            sign_key: default_sign_key(),
            sign_iv: default_sign_iv(),
            timeout_secs: default_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agents: default_user_agents(),
            origin: default_origin(),
            referer: default_referer(),
            accept_language: default_accept_language(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check invariants that would otherwise only fail on the first upload.
    pub fn validate(&self) -> Result<(), UpstreamError> {
        if self.sign_key.len() != 16 {
            return Err(UpstreamError::InvalidConfig(format!(
                "sign_key must be 16 bytes, got {}",
                self.sign_key.len()
            )));
        }
        if self.sign_iv.len() != 16 {
            return Err(UpstreamError::InvalidConfig(format!(
                "sign_iv must be 16 bytes, got {}",
                self.sign_iv.len()
            )));
        }
        if self.timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(UpstreamError::InvalidConfig(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_trial_url() -> String {
    "https://account.api.apeaksoft.com/v9/product/trial".to_string()
}

fn default_benefit_url() -> String {
    "https://account.api.apeaksoft.com/v9/benefit/status".to_string()
}

fn default_upload_url() -> String {
    "https://ai-api.apeaksoft.com/v6/removeWM/upload".to_string()
}

fn default_wm_url() -> String {
    "https://ai-api.apeaksoft.com/v6/removeWM/WM".to_string()
}

fn default_status_url() -> String {
    "https://ai-api.apeaksoft.com/v6/removeWM/status".to_string()
}

fn default_product_id() -> String {
    "56".to_string()
}

fn default_sign_key() -> String {
    "5FA2MKT7miJ/sGTb".to_string()
}

fn default_sign_iv() -> String {
    "Aryx2NC77xtTX8Ju".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_upload_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/143.0.0.0 Safari/537.36 Edg/143.0.0.0"
            .to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/142.0.0.0 Safari/537.36"
            .to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/142.0.0.0 Safari/537.36 Edg/142.0.0.0"
            .to_string(),
    ]
}

fn default_origin() -> String {
    "https://www.apeaksoft.com".to_string()
}

fn default_referer() -> String {
    "https://www.apeaksoft.com/".to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = UpstreamConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.product_id, "56");
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.upload_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn short_key_is_rejected() {
        let cfg = UpstreamConfig {
            sign_key: "short".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(UpstreamError::InvalidConfig(_))
        ));
    }

    #[test]
    fn with_base_keeps_vendor_paths() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:9000/");
        assert_eq!(endpoints.upload, "http://127.0.0.1:9000/v6/removeWM/upload");
        assert_eq!(endpoints.wm_status, "http://127.0.0.1:9000/v6/removeWM/WM");
        assert_eq!(
            endpoints.poll_status,
            "http://127.0.0.1:9000/v6/removeWM/status"
        );
        assert_eq!(
            endpoints.benefit_status,
            "http://127.0.0.1:9000/v9/benefit/status"
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: UpstreamConfig = serde_json::from_str(r#"{"product_id": "77"}"#).unwrap();
        assert_eq!(cfg.product_id, "77");
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert_eq!(cfg.upload_timeout_secs, 30);
    }
}
