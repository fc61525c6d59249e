//! Public account pages
//!
//! - GET/POST / - Sign in
//! - GET/POST /sign-up - Create an account
//! - GET/POST /forgot-password - Request a reset link
//! - GET/POST /reset-password/{token} - Choose a new password
//! - POST /logout - End the session

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::middleware::{end_session, redirect_with_cookies, AppState, PageError};
use crate::backend::{BackendError, SignUpInput};
use crate::models::{Role, Session};
use crate::views::{ForgotPasswordPage, ResetPasswordPage, SignInPage, SignUpPage};

pub const MSG_SIGN_IN_FAILED: &str = "Email atau password salah";
pub const MSG_SIGN_IN_THROTTLED: &str = "Terlalu banyak percobaan masuk. Coba lagi dalam 15 menit.";
pub const MSG_BACKEND_UNAVAILABLE: &str = "Terjadi kesalahan. Coba lagi nanti.";
pub const MSG_PASSWORD_CONFIRMATION: &str = "Password dan konfirmasi password tidak sama";
pub const MSG_ROLE_REQUIRED: &str = "Role wajib dipilih";
pub const MSG_SIGN_UP_FAILED: &str = "Gagal membuat akun";
pub const MSG_RESET_LINK_SENT: &str = "Link reset password berhasil dikirim. Silakan cek email kamu.";
pub const MSG_EMAIL_NOT_FOUND: &str = "Email tidak ditemukan";
pub const MSG_PASSWORD_MISMATCH: &str = "Password tidak sama";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password minimal 6 karakter";
pub const MSG_PASSWORD_RESET: &str = "Password berhasil direset";
pub const MSG_RESET_FAILED: &str = "Terjadi kesalahan";

/// Minimum length of a new password, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Where a successful sign-in lands
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Build the public router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sign_in_page).post(sign_in))
        .route("/sign-up", get(sign_up_page).post(sign_up))
        .route("/forgot-password", get(forgot_password_page).post(forgot_password))
        .route("/reset-password/{token}", get(reset_password_page).post(reset_password))
        .route("/logout", post(logout))
}

fn html(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}

// ============================================================================
// Sign in
// ============================================================================

async fn sign_in_page(State(state): State<AppState>) -> Result<Response, PageError> {
    let body = state.views.sign_in(&SignInPage::default())?;
    Ok(html(StatusCode::OK, body))
}

/// POST / - Sign in
///
/// Throttled per email. A successful sign-in replaces any stored session.
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Result<Response, PageError> {
    let email = form.email.trim().to_string();

    let failed = |status: StatusCode, message: &str| -> Result<Response, PageError> {
        let body = state.views.sign_in(&SignInPage {
            email: email.clone(),
            error: Some(message.to_string()),
        })?;
        Ok(html(status, body))
    };

    if state.rate_limiter.is_limited(&email).await {
        tracing::warn!("Sign-in throttled for {}", email);
        return failed(StatusCode::TOO_MANY_REQUESTS, MSG_SIGN_IN_THROTTLED);
    }

    match state.backend.sign_in(&email, &form.password).await {
        Ok(response) => {
            state.rate_limiter.clear(&email).await;

            let session = Session::new(response.token, response.user);
            let mut ctx = state.session_context(&headers);
            ctx.establish(&session);
            tracing::info!("User signed in: {}", email);

            Ok(redirect_with_cookies(DASHBOARD_PATH, ctx.into_storage()))
        }
        Err(BackendError::Request(e)) => {
            tracing::warn!("Sign-in request failed: {}", e);
            failed(StatusCode::BAD_GATEWAY, MSG_BACKEND_UNAVAILABLE)
        }
        Err(e) => {
            tracing::debug!("Sign-in rejected for {}: {}", email, e);
            state.rate_limiter.record_failure(&email).await;
            failed(StatusCode::UNAUTHORIZED, MSG_SIGN_IN_FAILED)
        }
    }
}

// ============================================================================
// Sign up
// ============================================================================

async fn load_roles(state: &AppState) -> Vec<Role> {
    match state.backend.roles(None).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!("Failed to load roles: {}", e);
            Vec::new()
        }
    }
}

async fn sign_up_page(State(state): State<AppState>) -> Result<Response, PageError> {
    let roles = load_roles(&state).await;
    let body = state.views.sign_up(&SignUpPage {
        roles: SignUpPage::role_options(&roles, ""),
        ..Default::default()
    })?;
    Ok(html(StatusCode::OK, body))
}

/// Role ids are numeric on the backend; anything else is passed through
fn role_id(raw: &str) -> Value {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(raw),
    }
}

/// POST /sign-up - Create an account
async fn sign_up(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, PageError> {
    let rejected = |roles: Vec<Role>, message: &str| -> Result<Response, PageError> {
        let body = state.views.sign_up(&SignUpPage {
            name: form.name.clone(),
            email: form.email.clone(),
            roles: SignUpPage::role_options(&roles, form.role.trim()),
            error: Some(message.to_string()),
        })?;
        Ok(html(StatusCode::BAD_REQUEST, body))
    };

    if form.password != form.confirm_password {
        return rejected(load_roles(&state).await, MSG_PASSWORD_CONFIRMATION);
    }
    if form.role.trim().is_empty() {
        return rejected(load_roles(&state).await, MSG_ROLE_REQUIRED);
    }

    let input = SignUpInput {
        nama_user: form.name.trim().to_string(),
        email_user: form.email.trim().to_string(),
        password_user: form.password.clone(),
        id_role: role_id(&form.role),
    };

    match state.backend.sign_up(&input).await {
        Ok(()) => {
            tracing::info!("Account created: {}", input.email_user);
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!("Sign-up failed for {}: {}", input.email_user, e);
            rejected(load_roles(&state).await, MSG_SIGN_UP_FAILED)
        }
    }
}

// ============================================================================
// Password recovery
// ============================================================================

async fn forgot_password_page(State(state): State<AppState>) -> Result<Response, PageError> {
    let body = state.views.forgot_password(&ForgotPasswordPage::default())?;
    Ok(html(StatusCode::OK, body))
}

/// POST /forgot-password - Ask the backend to mail a reset link
async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, PageError> {
    let email = form.email.trim().to_string();

    let result = state.backend.forgot_password(&email).await;
    let (status, page) = match result {
        Ok(()) => (
            StatusCode::OK,
            ForgotPasswordPage {
                email: String::new(),
                error: None,
                success: Some(MSG_RESET_LINK_SENT.to_string()),
            },
        ),
        Err(e) => {
            tracing::debug!("Forgot password failed for {}: {}", email, e);
            (
                StatusCode::BAD_REQUEST,
                ForgotPasswordPage {
                    email,
                    error: Some(MSG_EMAIL_NOT_FOUND.to_string()),
                    success: None,
                },
            )
        }
    };

    Ok(html(status, state.views.forgot_password(&page)?))
}

async fn reset_password_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, PageError> {
    let body = state.views.reset_password(&ResetPasswordPage {
        token,
        ..Default::default()
    })?;
    Ok(html(StatusCode::OK, body))
}

/// Check a new password pair before it is sent anywhere
pub fn validate_new_password(new_password: &str, confirm_password: &str) -> Result<(), &'static str> {
    if new_password != confirm_password {
        return Err(MSG_PASSWORD_MISMATCH);
    }
    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MSG_PASSWORD_TOO_SHORT);
    }
    Ok(())
}

/// POST /reset-password/{token} - Set a new password
async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, PageError> {
    if let Err(message) = validate_new_password(&form.new_password, &form.confirm_password) {
        let body = state.views.reset_password(&ResetPasswordPage {
            token,
            error: Some(message.to_string()),
            success: None,
        })?;
        return Ok(html(StatusCode::BAD_REQUEST, body));
    }

    let result = state.backend.reset_password(&token, &form.new_password).await;
    let (status, page) = match result {
        Ok(()) => {
            tracing::info!("Password reset completed");
            (
                StatusCode::OK,
                ResetPasswordPage {
                    token,
                    error: None,
                    success: Some(MSG_PASSWORD_RESET.to_string()),
                },
            )
        }
        Err(e) => {
            tracing::warn!("Password reset failed: {}", e);
            let message = e.backend_message().unwrap_or(MSG_RESET_FAILED).to_string();
            (
                StatusCode::BAD_REQUEST,
                ResetPasswordPage {
                    token,
                    error: Some(message),
                    success: None,
                },
            )
        }
    };

    Ok(html(status, state.views.reset_password(&page)?))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /logout - Clear both session cookies
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    end_session(&state, &headers)
}
