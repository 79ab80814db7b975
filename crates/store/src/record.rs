use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One erase request as persisted locally.
///
/// `token` is the vendor-issued task token and the only lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub token: String,
    pub e_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub image_filename: Option<String>,
    pub image_content_type: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub image: Vec<u8>,
    pub mask: Vec<u8>,
    /// `None` until a status query reveals the processed image.
    pub result_url: Option<String>,
}

impl CallRecord {
    /// New record stamped with the current time and no result yet.
    pub fn new(
        token: impl Into<String>,
        e_id: impl Into<String>,
        image: Vec<u8>,
        mask: Vec<u8>,
    ) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            e_id: e_id.into(),
            created_at: now,
            updated_at: now,
            client_ip: None,
            user_agent: None,
            image_filename: None,
            image_content_type: None,
            image_width: None,
            image_height: None,
            image,
            mask,
            result_url: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.result_url.is_some()
    }

    /// Metadata view without the image blobs.
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            token: self.token.clone(),
            e_id: self.e_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            client_ip: self.client_ip.clone(),
            user_agent: self.user_agent.clone(),
            image_filename: self.image_filename.clone(),
            image_content_type: self.image_content_type.clone(),
            image_size: self.image.len() as u64,
            mask_size: self.mask.len() as u64,
            image_width: self.image_width,
            image_height: self.image_height,
            result_url: self.result_url.clone(),
        }
    }
}

/// History listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub token: String,
    pub e_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub image_filename: Option<String>,
    pub image_content_type: Option<String>,
    pub image_size: u64,
    pub mask_size: u64,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub result_url: Option<String>,
}

/// Aggregate counters over the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CallStats {
    pub total_calls: u64,
    /// Calls with a result URL.
    pub resolved_calls: u64,
    pub unique_ips: u64,
    /// Calls created on the current UTC day.
    pub today_calls: u64,
    /// `resolved / total` as a percentage, two decimals.
    pub success_rate: f64,
}

/// Outcome of [`CallStore::update_result_url`](crate::CallStore::update_result_url).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlUpdate {
    Updated,
    /// The stored URL already matched.
    Unchanged,
}
