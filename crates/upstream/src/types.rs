use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UpstreamError;

/// One uploaded file as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl ImagePart {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the quota check needs to know about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageFacts {
    pub size_bytes: u64,
    /// `(width, height)` when the image header could be decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl ImageFacts {
    pub fn max_edge(&self) -> Option<u32> {
        self.dimensions.map(|(w, h)| w.max(h))
    }
}

/// Quota snapshot returned by the benefit endpoint.
///
/// `None` means the vendor reported no (positive) limit for that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BenefitLimits {
    pub max_size_bytes: Option<u64>,
    pub max_edge_px: Option<u32>,
}

impl BenefitLimits {
    /// Read limits from a benefit-status payload.
    ///
    /// Looks at `subscriptions[0].benefits[]`, keyed by `key`: `in_size.limit`
    /// is the byte ceiling and `in_edge.threshold` the longest-edge ceiling.
    pub fn from_status(status: &Value) -> Self {
        let benefits = status
            .get("subscriptions")
            .and_then(Value::as_array)
            .and_then(|subs| subs.first())
            .and_then(|sub| sub.get("benefits"))
            .and_then(Value::as_array);

        let mut limits = BenefitLimits::default();
        let Some(benefits) = benefits else {
            return limits;
        };

        for benefit in benefits {
            match benefit.get("key").and_then(Value::as_str) {
                Some("in_size") => {
                    limits.max_size_bytes = benefit
                        .get("limit")
                        .and_then(positive_int)
                        .and_then(|v| u64::try_from(v).ok());
                }
                Some("in_edge") => {
                    limits.max_edge_px = benefit
                        .get("threshold")
                        .and_then(positive_int)
                        .and_then(|v| u32::try_from(v).ok());
                }
                _ => {}
            }
        }
        limits
    }

    /// Fail with [`UpstreamError::QuotaExceeded`] if `facts` breach a limit.
    pub fn check(&self, facts: &ImageFacts) -> Result<(), UpstreamError> {
        if let Some(limit) = self.max_size_bytes {
            if facts.size_bytes > limit {
                return Err(UpstreamError::QuotaExceeded(format!(
                    "image size {:.2}MB exceeds the allowed {:.2}MB",
                    mib(facts.size_bytes),
                    mib(limit)
                )));
            }
        }
        if let (Some(threshold), Some(edge)) = (self.max_edge_px, facts.max_edge()) {
            if edge > threshold {
                return Err(UpstreamError::QuotaExceeded(format!(
                    "image longest edge {edge}px exceeds the allowed {threshold}px"
                )));
            }
        }
        Ok(())
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Accepts JSON integers, floats (truncated) and integer strings; only
/// positive values count as limits.
fn positive_int(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (parsed > 0).then_some(parsed)
}

/// Everything the upload call needs besides the signature, which the client
/// computes itself.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub image: ImagePart,
    pub mask: ImagePart,
    /// Display name sent to the vendor (the original filename).
    pub name: String,
    pub e_id: String,
}

/// Successful upload acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub token: String,
    pub task_id: Option<String>,
    /// Raw vendor reply, kept for logging.
    pub raw: Value,
}
