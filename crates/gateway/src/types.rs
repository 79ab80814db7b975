use serde::{Deserialize, Serialize};
use serde_json::Value;
use upstream::ImagePart;

/// Where a request came from, for the audit record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// One erase request: the image, the mask marking what to erase, and the caller.
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: ImagePart,
    pub mask: ImagePart,
    pub client: ClientInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub token: String,
    pub message: String,
}

/// What the relay did with the local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// A new result URL was stored.
    Updated,
    /// The stored URL already matched.
    Unchanged,
    /// The vendor reply carried no result URL.
    NoResultUrl,
    /// No local record exists for the token.
    UntrackedToken,
    /// The store failed; the vendor reply is still relayed.
    StoreFailed,
}

impl Persistence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Updated => "updated",
            Persistence::Unchanged => "unchanged",
            Persistence::NoResultUrl => "no_result_url",
            Persistence::UntrackedToken => "untracked_token",
            Persistence::StoreFailed => "store_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    /// Vendor reply, unmodified.
    pub response: Value,
    pub persistence: Persistence,
}
