//! Cookie-backed session storage
//!
//! Each slot is one cookie. The token cookie carries no `Max-Age`, so the
//! browser drops it when the browsing session ends; the profile cookie lives
//! for the configured number of days. Values are base64url-encoded so any
//! string survives the cookie grammar.
//!
//! Writes and removals are queued as `Set-Cookie` headers and applied to the
//! outgoing response with [`CookieStorage::apply`].

use axum::http::{header, HeaderMap, HeaderValue};
use data_encoding::BASE64URL_NOPAD;
use std::collections::HashMap;

use super::{SessionStorage, Slot, SlotLifetime};
use crate::config::SessionConfig;

/// Session slots read from request cookies
#[derive(Debug, Clone)]
pub struct CookieStorage {
    config: SessionConfig,
    /// Raw cookie values by name, as sent by the browser
    values: HashMap<String, String>,
    /// Set-Cookie headers to send back
    pending: Vec<String>,
}

impl CookieStorage {
    /// Empty storage (no cookies sent)
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            values: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Read every `Cookie` header of a request
    pub fn from_headers(headers: &HeaderMap, config: &SessionConfig) -> Self {
        let mut storage = Self::new(config.clone());

        for value in headers.get_all(header::COOKIE) {
            let Ok(cookie_str) = value.to_str() else {
                continue;
            };
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    storage
                        .values
                        .insert(name.trim().to_string(), value.trim().to_string());
                }
            }
        }

        storage
    }

    /// Set-Cookie header values queued so far
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Append the queued Set-Cookie headers to a response
    pub fn apply(self, headers: &mut HeaderMap) {
        for cookie in self.pending {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("Dropping invalid Set-Cookie header: {}", e),
            }
        }
    }

    fn cookie_name(&self, slot: Slot) -> &str {
        match slot {
            Slot::Token => &self.config.token_cookie,
            Slot::Profile => &self.config.profile_cookie,
        }
    }

    fn attributes(&self) -> String {
        let mut attributes = String::from("Path=/; HttpOnly; SameSite=Lax");
        if self.config.secure_cookies {
            attributes.push_str("; Secure");
        }
        attributes
    }

    fn set_cookie(&self, slot: Slot, encoded: &str) -> String {
        let name = self.cookie_name(slot);
        match slot.lifetime() {
            SlotLifetime::BrowsingSession => format!("{}={}; {}", name, encoded, self.attributes()),
            SlotLifetime::Persistent => format!(
                "{}={}; {}; Max-Age={}",
                name,
                encoded,
                self.attributes(),
                self.config.profile_max_age_seconds()
            ),
        }
    }

    fn removal_cookie(&self, slot: Slot) -> String {
        format!("{}=; {}; Max-Age=0", self.cookie_name(slot), self.attributes())
    }
}

impl SessionStorage for CookieStorage {
    fn read(&self, slot: Slot) -> Option<String> {
        let raw = self.values.get(self.cookie_name(slot))?;
        if raw.is_empty() {
            return None;
        }
        let bytes = BASE64URL_NOPAD.decode(raw.as_bytes()).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn write(&mut self, slot: Slot, value: String) {
        let encoded = BASE64URL_NOPAD.encode(value.as_bytes());
        let cookie = self.set_cookie(slot, &encoded);
        let name = self.cookie_name(slot).to_string();
        self.values.insert(name, encoded);
        self.pending.push(cookie);
    }

    fn remove(&mut self, slot: Slot) {
        let name = self.cookie_name(slot).to_string();
        if self.values.remove(&name).is_some() {
            let cookie = self.removal_cookie(slot);
            self.pending.push(cookie);
        }
    }
}

/// Build a `Cookie` request header value carrying the given slots
///
/// Used by tests and tooling that need to impersonate a browser.
pub fn cookie_header(config: &SessionConfig, slots: &[(Slot, &str)]) -> String {
    slots
        .iter()
        .map(|(slot, value)| {
            let name = match slot {
                Slot::Token => &config.token_cookie,
                Slot::Profile => &config.profile_cookie,
            };
            format!("{}={}", name, BASE64URL_NOPAD.encode(value.as_bytes()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
