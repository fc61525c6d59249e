//! Sign-in throttling
//!
//! Failed sign-in attempts are counted per email address (case-insensitive).
//! Once an address reaches the limit inside the window, further attempts are
//! refused without contacting the backend.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failed attempts allowed per window
const MAX_FAILED_ATTEMPTS: usize = 5;

/// Window length in minutes
const WINDOW_MINUTES: i64 = 15;

/// Sign-in rate limiter
///
/// Clones share the same attempt records.
#[derive(Clone)]
pub struct SignInRateLimiter {
    /// Failed sign-in attempts by normalized email
    attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl SignInRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if an email is currently throttled
    pub async fn is_limited(&self, email: &str) -> bool {
        self.is_limited_at(email, Utc::now()).await
    }

    pub(crate) async fn is_limited_at(&self, email: &str, now: DateTime<Utc>) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = now - Duration::minutes(WINDOW_MINUTES);

        match attempts.get_mut(&normalize(email)) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= MAX_FAILED_ATTEMPTS
            }
            None => false,
        }
    }

    /// Record a failed sign-in attempt
    pub async fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Utc::now()).await;
    }

    pub(crate) async fn record_failure_at(&self, email: &str, now: DateTime<Utc>) {
        let mut attempts = self.attempts.write().await;
        attempts.entry(normalize(email)).or_default().push(now);
    }

    /// Forget failed attempts (on successful sign-in)
    pub async fn clear(&self, email: &str) {
        let mut attempts = self.attempts.write().await;
        attempts.remove(&normalize(email));
    }

    /// Drop attempts older than the window (called periodically)
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    /// Number of addresses with recorded attempts
    pub async fn tracked(&self) -> usize {
        self.attempts.read().await.len()
    }
}

impl Default for SignInRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_after_five_failures() {
        let limiter = SignInRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failure("admin@desa.id").await;
            assert!(!limiter.is_limited("admin@desa.id").await);
        }

        limiter.record_failure("admin@desa.id").await;
        assert!(limiter.is_limited("admin@desa.id").await);

        limiter.clear("admin@desa.id").await;
        assert!(!limiter.is_limited("admin@desa.id").await);
    }

    #[tokio::test]
    async fn test_case_insensitive_email() {
        let limiter = SignInRateLimiter::new();

        limiter.record_failure("Admin@Desa.id").await;
        limiter.record_failure("admin@desa.id").await;
        limiter.record_failure("ADMIN@DESA.ID").await;
        limiter.record_failure(" admin@desa.id ").await;
        assert!(!limiter.is_limited("admin@desa.id").await);

        limiter.record_failure("admin@desa.id").await;
        assert!(limiter.is_limited("Admin@desa.ID").await);
    }

    #[tokio::test]
    async fn test_window_expires() {
        let limiter = SignInRateLimiter::new();
        let start = Utc::now() - Duration::minutes(30);

        for _ in 0..5 {
            limiter.record_failure_at("old@desa.id", start).await;
        }
        assert!(limiter.is_limited_at("old@desa.id", start).await);
        assert!(!limiter.is_limited_at("old@desa.id", start + Duration::minutes(16)).await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_stale_entries() {
        let limiter = SignInRateLimiter::new();
        limiter
            .record_failure_at("stale@desa.id", Utc::now() - Duration::hours(1))
            .await;
        limiter.record_failure("fresh@desa.id").await;
        assert_eq!(limiter.tracked().await, 2);

        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, 1);
    }
}
