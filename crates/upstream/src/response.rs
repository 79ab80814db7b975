//! Reading fields out of vendor replies.
//!
//! The vendor is inconsistent about where it puts things: a token or result
//! URL may sit at the top level or one level down under `data` or `result`.
//! Lookups are an ordered list of [`ExtractRule`]s; the first rule yielding a
//! non-empty string wins.

use serde_json::Value;

/// One place a field may live: a path of object keys from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractRule {
    pub path: &'static [&'static str],
}

impl ExtractRule {
    pub const fn new(path: &'static [&'static str]) -> Self {
        Self { path }
    }

    /// Non-empty string at this rule's path, if any.
    pub fn apply<'a>(&self, value: &'a Value) -> Option<&'a str> {
        let mut cursor = value;
        for key in self.path {
            cursor = cursor.get(key)?;
        }
        cursor.as_str().filter(|s| !s.is_empty())
    }
}

/// `url` → `data.url` → `result.url`.
pub const RESULT_URL_RULES: &[ExtractRule] = &[
    ExtractRule::new(&["url"]),
    ExtractRule::new(&["data", "url"]),
    ExtractRule::new(&["result", "url"]),
];

/// `token` → `data.token` → `result.token`.
pub const TOKEN_RULES: &[ExtractRule] = &[
    ExtractRule::new(&["token"]),
    ExtractRule::new(&["data", "token"]),
    ExtractRule::new(&["result", "token"]),
];

/// `taskId` → `data.taskId` → `result.taskId`.
pub const TASK_ID_RULES: &[ExtractRule] = &[
    ExtractRule::new(&["taskId"]),
    ExtractRule::new(&["data", "taskId"]),
    ExtractRule::new(&["result", "taskId"]),
];

/// First match across `rules`, in order.
pub fn first_match<'a>(value: &'a Value, rules: &[ExtractRule]) -> Option<&'a str> {
    rules.iter().find_map(|rule| rule.apply(value))
}

pub fn extract_result_url(value: &Value) -> Option<&str> {
    first_match(value, RESULT_URL_RULES)
}

pub fn extract_token(value: &Value) -> Option<&str> {
    first_match(value, TOKEN_RULES)
}

/// Task ids show up as strings or bare numbers.
pub fn extract_task_id(value: &Value) -> Option<String> {
    TASK_ID_RULES.iter().find_map(|rule| {
        let mut cursor = value;
        for key in rule.path {
            cursor = cursor.get(key)?;
        }
        match cursor {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    })
}

/// Vendor-level status code carried in the body (`"200"` or `200`).
pub fn vendor_status(value: &Value) -> Option<String> {
    match value.get("status")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// True when the body reports success.
pub fn is_vendor_success(value: &Value) -> bool {
    vendor_status(value).as_deref() == Some("200")
}

/// Human-readable vendor message, if the body has one.
pub fn vendor_message(value: &Value) -> Option<&str> {
    value.get("message").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_url_wins_over_nested() {
        let value = json!({"url": "https://x/top.jpg", "data": {"url": "https://x/nested.jpg"}});
        assert_eq!(extract_result_url(&value), Some("https://x/top.jpg"));
    }

    #[test]
    fn data_container_is_checked_before_result() {
        let value = json!({"data": {"url": "https://x/d.jpg"}, "result": {"url": "https://x/r.jpg"}});
        assert_eq!(extract_result_url(&value), Some("https://x/d.jpg"));

        let value = json!({"result": {"url": "https://x/r.jpg"}});
        assert_eq!(extract_result_url(&value), Some("https://x/r.jpg"));
    }

    #[test]
    fn empty_and_non_string_values_are_skipped() {
        let value = json!({"url": "", "data": {"url": null}, "result": {"url": "https://x/r.jpg"}});
        assert_eq!(extract_result_url(&value), Some("https://x/r.jpg"));

        let value = json!({"url": 42, "data": "not-an-object"});
        assert_eq!(extract_result_url(&value), None);
    }

    #[test]
    fn token_and_task_id_lookups() {
        let value = json!({"status": "200", "data": {"token": "abc", "taskId": 17}});
        assert_eq!(extract_token(&value), Some("abc"));
        assert_eq!(extract_task_id(&value).as_deref(), Some("17"));
    }

    #[test]
    fn vendor_status_accepts_strings_and_numbers() {
        assert!(is_vendor_success(&json!({"status": "200"})));
        assert!(is_vendor_success(&json!({"status": 200})));
        assert!(!is_vendor_success(&json!({"status": "500", "message": "busy"})));
        assert!(!is_vendor_success(&json!({})));
        assert_eq!(vendor_message(&json!({"message": "busy"})), Some("busy"));
    }
}
