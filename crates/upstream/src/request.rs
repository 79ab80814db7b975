//! Outbound request values.
//!
//! A [`SignedRequest`] is built fresh for every vendor call and consumed by
//! the sender, so signatures and ephemeral ids are never reused.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;

/// A file attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

impl RequestBody {
    /// Value of a text field, in either body kind.
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match self {
            RequestBody::Form(fields) => fields,
            RequestBody::Multipart { fields, .. } => fields,
        };
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        match self {
            RequestBody::Form(_) => None,
            RequestBody::Multipart { files, .. } => files.iter().find(|f| f.field == name),
        }
    }
}

/// One fully assembled vendor call.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Short label for logs (`upload`, `status`, ...).
    pub operation: &'static str,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl SignedRequest {
    pub fn post(operation: &'static str, url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            operation,
            method: Method::POST,
            url: url.into(),
            headers,
            body: RequestBody::Form(Vec::new()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub(crate) fn form<const N: usize>(pairs: [(&str, &str); N]) -> RequestBody {
    RequestBody::Form(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}
