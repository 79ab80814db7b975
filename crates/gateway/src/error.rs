//! Errors surfaced by [`Gateway`](crate::Gateway) operations.
//!
//! | Error | HTTP |
//! |-------|------|
//! | `InvalidInput`, `QuotaExceeded` | 400 |
//! | `UnknownToken` | 404 |
//! | `UpstreamUnavailable`, `UpstreamRejected`, `MalformedResponse` | 502 |
//! | `DuplicateToken`, `Storage`, `Internal` | 500 |

use store::StoreError;
use thiserror::Error;
use upstream::UpstreamError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// Bad content type, empty or oversized part, empty token. Detected locally.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream rejected request (status {status}): {body}")]
    UpstreamRejected { status: String, body: String },
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("unknown token: {0}")]
    UnknownToken(String),
    #[error("duplicate token: {0}")]
    DuplicateToken(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidInput(_)
                | GatewayError::QuotaExceeded(_)
                | GatewayError::UnknownToken(_)
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidInput(_) | GatewayError::QuotaExceeded(_) => 400,
            GatewayError::UnknownToken(_) => 404,
            GatewayError::UpstreamUnavailable(_)
            | GatewayError::UpstreamRejected { .. }
            | GatewayError::MalformedResponse(_) => 502,
            GatewayError::DuplicateToken(_) | GatewayError::Storage(_) | GatewayError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code, used in error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::InvalidInput(_) => "INVALID_INPUT",
            GatewayError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GatewayError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            GatewayError::UpstreamRejected { .. } => "UPSTREAM_REJECTED",
            GatewayError::MalformedResponse(_) => "UPSTREAM_MALFORMED",
            GatewayError::UnknownToken(_) => "UNKNOWN_TOKEN",
            GatewayError::DuplicateToken(_) => "DUPLICATE_TOKEN",
            GatewayError::Storage(_) => "STORAGE_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::QuotaExceeded(msg) => GatewayError::QuotaExceeded(msg),
            UpstreamError::Unavailable(msg) => GatewayError::UpstreamUnavailable(msg),
            UpstreamError::Rejected { status, body } => GatewayError::UpstreamRejected { status, body },
            UpstreamError::MalformedResponse(msg) => GatewayError::MalformedResponse(msg),
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateToken(token) => GatewayError::DuplicateToken(token),
            StoreError::UnknownToken(token) => GatewayError::UnknownToken(token),
            other => GatewayError::Storage(other.to_string()),
        }
    }
}
