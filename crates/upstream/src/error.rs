use thiserror::Error;

/// Errors surfaced by calls to the vendor API.
///
/// Quota failures are kept apart from transport failures so callers can map
/// the former to a client error and the latter to a gateway error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The caller's image is over the limits reported by the benefit endpoint.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Network failure, timeout, or a 5xx reply.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// The vendor answered with a 4xx or a non-success status in its payload.
    #[error("upstream rejected request (status {status}): {body}")]
    Rejected { status: String, body: String },
    /// The vendor answered, but not in a shape we understand.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    /// Local signing or client setup failure (bad key length, unbuildable client).
    #[error("invalid upstream config: {0}")]
    InvalidConfig(String),
}

impl UpstreamError {
    /// True when the failure came from the transport rather than the vendor's answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Unavailable(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Unavailable(format!("request timed out: {err}"))
        } else if err.is_connect() {
            UpstreamError::Unavailable(format!("connect failed: {err}"))
        } else if err.is_decode() {
            UpstreamError::MalformedResponse(format!("invalid JSON response: {err}"))
        } else {
            UpstreamError::Unavailable(format!("HTTP request failed: {err}"))
        }
    }
}
