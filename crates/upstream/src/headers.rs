//! Browser-shaped request headers.
//!
//! The vendor only serves its web client, so every outbound call presents a
//! consistent browser profile: one user agent per request plus the client
//! hints a Chromium browser would derive from it.

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::UpstreamConfig;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

const VERSION_MARKERS: [&str; 3] = ["Edg/", "Chrome/", "Chromium/"];
const DEFAULT_MAJOR: &str = "99";

/// Major browser version from the first `Edg/`, `Chrome/` or `Chromium/` token.
pub fn major_version(ua: &str) -> &str {
    for (idx, _) in ua.char_indices() {
        let rest = &ua[idx..];
        for marker in VERSION_MARKERS {
            if let Some(after) = rest.strip_prefix(marker) {
                let digits = after
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after.len());
                if digits > 0 {
                    return &after[..digits];
                }
            }
        }
    }
    DEFAULT_MAJOR
}

pub fn sec_ch_ua(ua: &str) -> String {
    let major = major_version(ua);
    let lower = ua.to_ascii_lowercase();
    if lower.contains("edg") {
        format!(r#""Microsoft Edge";v="{major}", "Chromium";v="{major}", "Not A(Brand";v="99""#)
    } else if lower.contains("chrome") || lower.contains("chromium") {
        format!(r#""Google Chrome";v="{major}", "Chromium";v="{major}", "Not A(Brand";v="99""#)
    } else {
        format!(r#""Chromium";v="{major}", "Not A(Brand";v="99""#)
    }
}

pub fn mobile_flag(ua: &str) -> &'static str {
    if ua.to_ascii_lowercase().contains("mobile") {
        "?1"
    } else {
        "?0"
    }
}

pub fn platform(ua: &str) -> &'static str {
    let lower = ua.to_ascii_lowercase();
    if lower.contains("windows") {
        r#""Windows""#
    } else if lower.contains("mac os x") || lower.contains("macintosh") {
        r#""macOS""#
    } else if lower.contains("android") {
        r#""Android""#
    } else if lower.contains("linux") {
        r#""Linux""#
    } else {
        r#""Unknown""#
    }
}

/// Static part of the browser profile, built once from config.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    user_agents: Vec<String>,
    origin: String,
    referer: String,
    accept_language: String,
}

impl BrowserProfile {
    pub fn from_config(cfg: &UpstreamConfig) -> Self {
        Self {
            user_agents: cfg.user_agents.clone(),
            origin: cfg.origin.clone(),
            referer: cfg.referer.clone(),
            accept_language: cfg.accept_language.clone(),
        }
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Headers for one request. `content_type` is omitted for multipart
    /// bodies, where the client sets the boundary itself.
    pub fn headers(&self, content_type: Option<&str>) -> HeaderMap {
        let ua = self.pick_user_agent();
        let pairs: [(&'static str, String); 13] = [
            ("accept", "*/*".to_string()),
            ("accept-language", self.accept_language.clone()),
            ("origin", self.origin.clone()),
            ("referer", self.referer.clone()),
            ("priority", "u=1, i".to_string()),
            ("user-agent", ua.to_string()),
            ("sec-ch-ua", sec_ch_ua(ua)),
            ("sec-ch-ua-mobile", mobile_flag(ua).to_string()),
            ("sec-ch-ua-platform", platform(ua).to_string()),
            ("sec-fetch-dest", "empty".to_string()),
            ("sec-fetch-mode", "cors".to_string()),
            ("sec-fetch-site", "same-site".to_string()),
            ("content-type", content_type.unwrap_or_default().to_string()),
        ];

        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(name), value);
                }
                Err(err) => tracing::warn!(header = name, error = %err, "skipping invalid header value"),
            }
        }
        headers
    }
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36 Edg/143.0.0.0";

#[cfg(test)]
mod tests {
    use super::*;

    const EDGE_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36 Edg/143.0.0.0";
    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn major_version_takes_first_marker() {
        assert_eq!(major_version(EDGE_LINUX), "143");
        assert_eq!(major_version(CHROME_WIN), "120");
        assert_eq!(major_version("curl/8.0"), "99");
    }

    #[test]
    fn client_hints_follow_user_agent() {
        assert!(sec_ch_ua(EDGE_LINUX).starts_with(r#""Microsoft Edge";v="143""#));
        assert!(sec_ch_ua(CHROME_WIN).starts_with(r#""Google Chrome";v="120""#));
        assert_eq!(platform(EDGE_LINUX), r#""Linux""#);
        assert_eq!(platform(CHROME_WIN), r#""Windows""#);
        assert_eq!(mobile_flag(CHROME_WIN), "?0");
        assert_eq!(mobile_flag("Mozilla/5.0 (Linux; Android 14) Mobile Safari"), "?1");
    }

    #[test]
    fn form_headers_carry_content_type() {
        let profile = BrowserProfile::from_config(&UpstreamConfig::default());
        let headers = profile.headers(Some(FORM_CONTENT_TYPE));
        assert_eq!(headers["content-type"], FORM_CONTENT_TYPE);
        assert_eq!(headers["origin"], "https://www.apeaksoft.com");
        assert!(headers.contains_key("sec-ch-ua"));
    }

    #[test]
    fn multipart_headers_omit_content_type() {
        let profile = BrowserProfile::from_config(&UpstreamConfig::default());
        let headers = profile.headers(None);
        assert!(!headers.contains_key("content-type"));
        assert!(headers.contains_key("user-agent"));
    }

    #[test]
    fn empty_pool_falls_back_to_default_agent() {
        let cfg = UpstreamConfig {
            user_agents: Vec::new(),
            ..Default::default()
        };
        let headers = BrowserProfile::from_config(&cfg).headers(None);
        assert_eq!(headers["user-agent"], DEFAULT_USER_AGENT);
    }
}
