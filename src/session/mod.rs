//! Session state
//!
//! A signed-in session lives in two storage slots: the bearer token, scoped to
//! the browsing session, and the user profile, which outlives it. This module
//! is the only place that reads, writes or clears those slots.
//!
//! - `SessionStorage`: key-based slot storage
//! - `CookieStorage`: slots carried in browser cookies
//! - `MemoryStorage`: in-process slots
//! - `SessionContext`: typed access to the slots
//! - `guard`: the access check run before every protected view

pub mod cookie;
pub mod guard;
pub mod memory;

pub use cookie::CookieStorage;
pub use guard::{check, GuardOutcome, Redirect, ENTRY_PATH};
pub use memory::MemoryStorage;

use crate::models::{Session, UserProfile};

/// Storage slot of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Bearer token
    Token,
    /// Serialized user profile
    Profile,
}

/// How long a slot survives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLifetime {
    /// Gone when the browsing session ends
    BrowsingSession,
    /// Survives until explicitly cleared or aged out
    Persistent,
}

impl Slot {
    pub fn lifetime(&self) -> SlotLifetime {
        match self {
            Slot::Token => SlotLifetime::BrowsingSession,
            Slot::Profile => SlotLifetime::Persistent,
        }
    }
}

/// Key-based storage for the session slots
///
/// Removing a slot that holds nothing must be a no-op.
pub trait SessionStorage {
    /// Read a slot; unreadable values count as absent
    fn read(&self, slot: Slot) -> Option<String>;

    /// Replace the value of a slot
    fn write(&mut self, slot: Slot, value: String);

    /// Remove a slot
    fn remove(&mut self, slot: Slot);
}

/// Typed view over the two session slots
#[derive(Debug)]
pub struct SessionContext<S> {
    storage: S,
}

impl<S: SessionStorage> SessionContext<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.storage.read(Slot::Token).filter(|t| !t.is_empty())
    }

    /// Stored user profile, if present and readable
    pub fn profile(&self) -> Option<UserProfile> {
        let raw = self.storage.read(Slot::Profile)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::debug!("Ignoring unreadable stored profile: {}", e);
                None
            }
        }
    }

    /// Stored session, without any expiry check
    #[cfg(test)]
    pub fn session(&self) -> Option<Session> {
        self.token().map(|token| Session::new(token, self.profile()))
    }

    /// Store a new session, replacing whatever was there
    pub fn establish(&mut self, session: &Session) {
        self.storage.write(Slot::Token, session.token.clone());

        let profile = session
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose();
        match profile {
            Ok(Some(json)) => self.storage.write(Slot::Profile, json),
            Ok(None) => self.storage.remove(Slot::Profile),
            Err(e) => {
                tracing::warn!("Failed to serialize user profile: {}", e);
                self.storage.remove(Slot::Profile);
            }
        }
    }

    /// Remove both slots; safe to call on an already-cleared session
    pub fn clear(&mut self) {
        self.storage.remove(Slot::Token);
        self.storage.remove(Slot::Profile);
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
