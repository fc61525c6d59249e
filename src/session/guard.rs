//! Route guard
//!
//! Decides, for a navigation into a protected view, whether the stored session
//! may render it. Expiry is discovered only here, on the next navigation; there
//! is no background timer.
//!
//! ```text
//! [NoToken] --sign-in--> [Valid] --exp reached--> [Expired]
//! [Expired] --next check--> clear both slots --> [NoToken] --> redirect
//! ```

use super::{SessionContext, SessionStorage};
use crate::auth::token;
use crate::models::Session;

/// Public entry view that unauthenticated navigations are sent to
pub const ENTRY_PATH: &str = "/";

/// Redirect decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    /// Where to send the browser
    pub to: &'static str,
    /// Whether stale session state was cleared on the way
    pub cleared: bool,
}

/// Result of a guard check
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Session is live; render the protected view with it
    Render(Session),
    /// No usable session; go to the entry view
    Redirect(Redirect),
}

impl GuardOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutcome::Render(_))
    }
}

/// Run the guard against the stored session at the given clock reading
///
/// - no token: redirect, nothing is touched
/// - expired or unreadable token: clear both slots, then redirect
/// - live token: render
pub fn check<S: SessionStorage>(ctx: &mut SessionContext<S>, now_ms: i64) -> GuardOutcome {
    let Some(token) = ctx.token() else {
        return GuardOutcome::Redirect(Redirect {
            to: ENTRY_PATH,
            cleared: false,
        });
    };

    if token::is_expired_at(&token, now_ms) {
        tracing::debug!("Stored session expired; clearing");
        ctx.clear();
        return GuardOutcome::Redirect(Redirect {
            to: ENTRY_PATH,
            cleared: true,
        });
    }

    GuardOutcome::Render(Session::new(token, ctx.profile()))
}
