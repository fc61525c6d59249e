//! Session model

use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Signed-in session: the bearer token plus the profile issued with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token presented to the backend
    pub token: String,
    /// Profile of the signed-in user, if one was stored
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Option<UserProfile>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}
