//! Session cookie handling.
//!
//! The HTTP client keeps its own jar instead of delegating to reqwest's
//! cookie store so that the full jar can round-trip through the encrypted
//! session file between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    pub expires: Option<DateTime<Utc>>,
}

/// An ordered set of cookies carried across requests and runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: Vec<SessionCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Insert or replace a cookie, keyed by (name, domain, path).
    pub fn upsert(&mut self, cookie: SessionCookie) {
        if let Some(existing) = self.cookies.iter_mut().find(|c| {
            c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path
        }) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    /// Absorb every `Set-Cookie` line from a response.
    pub fn absorb_set_cookie<'a>(&mut self, headers: impl Iterator<Item = &'a str>) {
        for line in headers {
            if let Some(cookie) = parse_set_cookie(line) {
                self.upsert(cookie);
            }
        }
    }

    /// Render the jar as a `Cookie:` request header value.
    /// Empty jars render to an empty string; callers skip the header then.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionCookie> {
        self.cookies.iter()
    }
}

/// Parse a single `Set-Cookie` header line. Lines without a name=value
/// pair are ignored; unknown attributes are skipped.
fn parse_set_cookie(line: &str) -> Option<SessionCookie> {
    let mut parts = line.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = SessionCookie {
        name: name.to_string(),
        value: value.trim().trim_matches('"').to_string(),
        domain: String::new(),
        path: String::new(),
        expires: None,
    };

    for attr in parts {
        let (key, val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => continue, // valueless attributes (Secure, HttpOnly)
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
            "path" => cookie.path = val.to_string(),
            "expires" => {
                cookie.expires = DateTime::parse_from_rfc2822(val)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            }
            "max-age" => {
                if let Ok(secs) = val.parse::<i64>() {
                    cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                }
            }
            _ => {}
        }
    }

    Some(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_cookie_basic() {
        let c = parse_set_cookie("csrftoken=abc123; Path=/; Secure").unwrap();
        assert_eq!(c.name, "csrftoken");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.path, "/");
        assert!(c.expires.is_none());
    }

    #[test]
    fn test_parse_set_cookie_with_attributes() {
        let c = parse_set_cookie(
            "sessionid=\"xyz\"; Domain=.example.com; Expires=Wed, 21 Oct 2026 07:28:00 GMT",
        )
        .unwrap();
        assert_eq!(c.value, "xyz");
        assert_eq!(c.domain, "example.com");
        assert!(c.expires.is_some());
    }

    #[test]
    fn test_parse_set_cookie_rejects_garbage() {
        assert!(parse_set_cookie("no-equals-sign-here").is_none());
        assert!(parse_set_cookie("=value-without-name").is_none());
    }

    #[test]
    fn test_upsert_replaces_by_identity() {
        let mut jar = CookieJar::new();
        jar.upsert(parse_set_cookie("csrftoken=old; Path=/").unwrap());
        jar.upsert(parse_set_cookie("csrftoken=new; Path=/").unwrap());
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("csrftoken"), Some("new"));
    }

    #[test]
    fn test_header_value_order() {
        let mut jar = CookieJar::new();
        jar.upsert(parse_set_cookie("a=1").unwrap());
        jar.upsert(parse_set_cookie("b=2").unwrap());
        assert_eq!(jar.header_value(), "a=1; b=2");
    }
}
