use serde::{Deserialize, Serialize};

/// What to do when the benefit endpoint itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitPolicy {
    /// Fail the submission.
    #[default]
    Strict,
    /// Log and upload without a quota check.
    BestEffort,
}

/// Submission rules.
///
/// ```yaml
/// gateway:
///   max_file_bytes: 52428800
///   allowed_content_types: ["image/jpeg", "image/png"]
///   benefit_policy: "strict"
///   send_trial: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    #[serde(default)]
    pub benefit_policy: BenefitPolicy,
    /// Register a trial with the vendor before each submission.
    #[serde(default = "default_send_trial")]
    pub send_trial: bool,
    /// Message returned with a successful submission.
    #[serde(default = "default_submit_message")]
    pub submit_message: String,
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/jpg", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_send_trial() -> bool {
    true
}

fn default_submit_message() -> String {
    "erase request submitted, processing".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            allowed_content_types: default_allowed_content_types(),
            benefit_policy: BenefitPolicy::default(),
            send_trial: default_send_trial(),
            submit_message: default_submit_message(),
        }
    }
}

impl GatewayConfig {
    /// Case-insensitive membership test; parameters after `;` are ignored.
    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&essence))
    }
}
