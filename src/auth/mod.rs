//! Authentication helpers
//!
//! - `token`: bearer token expiry checks
//! - `rate_limiter`: sign-in throttling

pub mod rate_limiter;
pub mod token;

pub use rate_limiter::SignInRateLimiter;
pub use token::{decode_claims, is_expired, is_expired_at, now_millis, TokenClaims, TokenError};
