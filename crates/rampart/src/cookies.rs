//! Minimal connection-wide cookie store.
//!
//! Remembers `name=value` pairs from `Set-Cookie` response headers and
//! echoes them on later requests. Attributes (path, domain, expiry) are
//! ignored; this is deliberately not an RFC 6265 jar, just enough for
//! session-token round trips against a single origin.

use std::collections::BTreeMap;
use std::sync::Mutex;

use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};

#[derive(Debug, Default)]
pub struct CookieStore {
    // BTreeMap keeps the emitted Cookie header deterministic.
    cookies: Mutex<BTreeMap<String, String>>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `Set-Cookie` pair in a response's headers.
    pub fn store(&self, headers: &HeaderMap) {
        let mut cookies = self.cookies.lock().expect("cookie store poisoned");
        for value in headers.get_all(SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let pair = value.split(';').next().unwrap_or("");
            if let Some((name, val)) = pair.split_once('=') {
                cookies.insert(name.trim().to_string(), val.trim().to_string());
            }
        }
    }

    /// Apply the stored cookies to an outgoing request's headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let cookies = self.cookies.lock().expect("cookie store poisoned");
        if cookies.is_empty() {
            return;
        }
        let joined = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        if let Ok(value) = joined.parse() {
            headers.insert(COOKIE, value);
        }
    }

    /// Drop any existing cookies.
    pub fn clear(&self) {
        self.cookies.lock().expect("cookie store poisoned").clear();
    }
}
