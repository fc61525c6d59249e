//! User profile model
//!
//! The dashboard does not own users; it keeps the profile the backend returns
//! at sign-in and shows it in the navbar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend user identifier, which may be numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<UserId> for serde_json::Value {
    fn from(id: UserId) -> Self {
        match id {
            UserId::Number(n) => serde_json::Value::from(n),
            UserId::Text(s) => serde_json::Value::from(s),
        }
    }
}

/// Signed-in user's profile as issued by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id_user: UserId,
    #[serde(default)]
    pub nama_user: String,
    #[serde(default)]
    pub email_user: String,
    /// Any other fields the backend sends (kept so the record round-trips)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Name shown in the navbar, falling back to the email address
    pub fn display_name(&self) -> &str {
        if self.nama_user.trim().is_empty() {
            &self.email_user
        } else {
            &self.nama_user
        }
    }
}

/// Account role offered at sign-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id_role: UserId,
    pub nama_role: String,
}
