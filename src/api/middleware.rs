//! HTTP middleware and shared handler plumbing
//!
//! Contains:
//! - `AppState`, the services shared by every handler
//! - `require_session`, the guard run before every dashboard route
//! - `PageError`, the error type of page handlers

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::auth::{now_millis, SignInRateLimiter};
use crate::backend::BackendClient;
use crate::cache::create_cache;
use crate::config::{Config, SessionConfig, UploadConfig};
use crate::services::ContentService;
use crate::session::{guard, CookieStorage, GuardOutcome, SessionContext, ENTRY_PATH};
use crate::views::{NotFoundPage, ViewError, Views};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub session_config: Arc<SessionConfig>,
    pub upload_config: Arc<UploadConfig>,
    pub backend: Arc<BackendClient>,
    pub content: Arc<ContentService>,
    pub views: Arc<Views>,
    pub rate_limiter: SignInRateLimiter,
}

impl AppState {
    /// Build every service from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let cache = create_cache(&config.cache);
        let content = Arc::new(ContentService::new(backend.clone(), cache));

        Ok(Self {
            session_config: Arc::new(config.session.clone()),
            upload_config: Arc::new(config.upload.clone()),
            backend,
            content,
            views: Arc::new(Views::new()?),
            rate_limiter: SignInRateLimiter::new(),
        })
    }

    /// Session context over the cookies of a request
    pub fn session_context(&self, headers: &HeaderMap) -> SessionContext<CookieStorage> {
        SessionContext::new(CookieStorage::from_headers(headers, &self.session_config))
    }
}

/// Errors surfaced by page handlers
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    View(#[from] ViewError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Page failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>500</h1><p>Terjadi kesalahan pada server.</p>"),
        )
            .into_response()
    }
}

/// Session guard middleware
///
/// Runs the guard once per protected navigation. A live session is handed to
/// the handler through request extensions; anything else is sent to the entry
/// page, with stale cookies removed.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = state.session_context(request.headers());

    match guard::check(&mut ctx, now_millis()) {
        GuardOutcome::Render(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardOutcome::Redirect(redirect) => {
            if redirect.cleared {
                tracing::info!("Expired session cleared on {}", request.uri().path());
            }
            redirect_with_cookies(redirect.to, ctx.into_storage())
        }
    }
}

/// Clear the session of a request and send the browser to the entry page
pub fn end_session(state: &AppState, headers: &HeaderMap) -> Response {
    let mut ctx = state.session_context(headers);
    ctx.clear();
    redirect_with_cookies(ENTRY_PATH, ctx.into_storage())
}

/// 303 redirect carrying the queued session cookies
pub fn redirect_with_cookies(to: &str, storage: CookieStorage) -> Response {
    let mut response = Redirect::to(to).into_response();
    storage.apply(response.headers_mut());
    response
}

/// Render the 404 page for a path
pub fn not_found_page(state: &AppState, path: &str) -> Result<Response, PageError> {
    let html = state.views.not_found(&NotFoundPage {
        path: path.to_string(),
    })?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

/// Router fallback
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> Result<Response, PageError> {
    not_found_page(&state, uri.path())
}
