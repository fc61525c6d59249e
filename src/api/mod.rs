//! HTTP layer - handlers and routing
//!
//! - `auth`: public account pages (sign in, sign up, password recovery, logout)
//! - `dashboard`: guarded section views and edits
//! - `middleware`: shared state, the session guard and page errors

pub mod auth;
pub mod dashboard;
pub mod middleware;


use axum::Router;
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, PageError};

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router(&state))
        .fallback(middleware::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
