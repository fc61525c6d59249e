//! Dashboard pages
//!
//! Every route here sits behind `require_session`; handlers receive the
//! validated `Session` and never re-check expiry themselves. A backend 401
//! still ends the session the same way the guard does.
//!
//! - GET /dashboard - Redirect to the first section
//! - GET /dashboard/{section} - Section view and edit form
//! - POST /dashboard/{section} - Save the edit form
//! - POST /dashboard/{section}/image - Upload an image

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;

use crate::api::middleware::{end_session, not_found_page, require_session, AppState, PageError};
use crate::backend::ImageUploadInput;
use crate::config::UploadConfig;
use crate::models::{Section, Session};
use crate::services::{
    build_update_payload, editable_fields, fields_from_form, ContentError, EditableField,
};
use crate::views::DashboardPage;

pub const MSG_LOAD_FAILED: &str = "Gagal memuat konten";
pub const MSG_SAVED: &str = "Perubahan berhasil disimpan";
pub const MSG_SAVE_FAILED: &str = "Gagal menyimpan perubahan";
pub const MSG_UPLOADED: &str = "Gambar berhasil diunggah";
pub const MSG_UPLOAD_FAILED: &str = "Gagal mengunggah gambar";
pub const MSG_IMAGE_REQUIRED: &str = "Pilih gambar terlebih dahulu";
pub const MSG_IMAGE_TYPE: &str = "Tipe file tidak didukung";
pub const MSG_IMAGE_TOO_LARGE: &str = "Ukuran file melebihi batas";
pub const MSG_TITLE_REQUIRED: &str = "Judul wajib diisi";
pub const MSG_UPLOAD_UNREADABLE: &str = "Unggahan tidak dapat dibaca";

/// Room for the multipart framing and text fields around the image
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Outcome notice passed back after a redirect
#[derive(Debug, Default, Deserialize)]
pub struct SectionQuery {
    pub status: Option<String>,
}

/// Build the dashboard router
pub fn router(state: &AppState) -> Router<AppState> {
    let body_limit = upload_body_limit(&state.upload_config);

    Router::new()
        .route("/dashboard", get(dashboard_home))
        .route("/dashboard/{section}", get(show_section).post(update_section))
        .route(
            "/dashboard/{section}/image",
            post(upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

/// Request body limit for image uploads: the file plus the form around it
fn upload_body_limit(config: &UploadConfig) -> usize {
    let limit = config.max_file_size.saturating_add(MULTIPART_OVERHEAD);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

async fn dashboard_home() -> Redirect {
    Redirect::to(&section_path(Section::ALL[0]))
}

fn section_path(section: Section) -> String {
    format!("/dashboard/{}", section.slug())
}

fn render(state: &AppState, status: StatusCode, page: &DashboardPage) -> Result<Response, PageError> {
    let body = state.views.dashboard(page)?;
    Ok((status, Html(body)).into_response())
}

/// Re-render a section with an error, showing `fields` when given or the
/// current document otherwise
async fn render_with_error(
    state: &AppState,
    headers: &HeaderMap,
    section: Section,
    session: &Session,
    status: StatusCode,
    message: String,
    fields: Option<Vec<EditableField>>,
) -> Result<Response, PageError> {
    let fields = match fields {
        Some(fields) => fields,
        None => match state.content.section(section, &session.token).await {
            Ok(document) => editable_fields(&document),
            Err(e) if e.is_unauthorized() => return Ok(end_session(state, headers)),
            Err(_) => Vec::new(),
        },
    };

    let page = DashboardPage::new(section, session, fields).with_error(message);
    render(state, status, &page)
}

/// GET /dashboard/{section}
async fn show_section(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Query(query): Query<SectionQuery>,
) -> Result<Response, PageError> {
    let Ok(section) = slug.parse::<Section>() else {
        return not_found_page(&state, &format!("/dashboard/{}", slug));
    };

    let result = state.content.section(section, &session.token).await;
    let page = match result {
        Ok(document) => DashboardPage::new(section, &session, editable_fields(&document)),
        Err(e) if e.is_unauthorized() => {
            tracing::info!("Backend rejected session token; signing out");
            return Ok(end_session(&state, &headers));
        }
        Err(e) => {
            tracing::warn!("Failed to load section {}: {}", section, e);
            DashboardPage::new(section, &session, Vec::new()).with_error(MSG_LOAD_FAILED)
        }
    };

    let page = match query.status.as_deref() {
        Some("saved") => page.with_notice(MSG_SAVED),
        Some("uploaded") => page.with_notice(MSG_UPLOADED),
        _ => page,
    };

    render(&state, StatusCode::OK, &page)
}

fn failure_message(base: &str, error: &ContentError) -> String {
    match error {
        ContentError::Backend(e) => match e.backend_message() {
            Some(detail) => format!("{}: {}", base, detail),
            None => base.to_string(),
        },
        ContentError::Validation(message) => message.clone(),
    }
}

/// POST /dashboard/{section}
async fn update_section(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    let Ok(section) = slug.parse::<Section>() else {
        return not_found_page(&state, &format!("/dashboard/{}", slug));
    };

    let updated_by = session.user.as_ref().map(|user| &user.id_user);
    let payload = match build_update_payload(&fields, updated_by) {
        Ok(payload) => payload,
        Err(e) => {
            let message = failure_message(MSG_SAVE_FAILED, &e);
            return render_with_error(
                &state,
                &headers,
                section,
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                message,
                Some(fields_from_form(&fields)),
            )
            .await;
        }
    };

    let result = state.content.update(section, &payload, &session.token).await;
    match result {
        Ok(_) => Ok(Redirect::to(&format!("{}?status=saved", section_path(section))).into_response()),
        Err(e) if e.is_unauthorized() => Ok(end_session(&state, &headers)),
        Err(e) => {
            tracing::warn!("Failed to update section {}: {}", section, e);
            render_with_error(
                &state,
                &headers,
                section,
                &session,
                StatusCode::BAD_GATEWAY,
                failure_message(MSG_SAVE_FAILED, &e),
                Some(fields_from_form(&fields)),
            )
            .await
        }
    }
}

fn multipart_rejection(e: axum::extract::multipart::MultipartError) -> &'static str {
    tracing::warn!("Failed to read upload: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MSG_IMAGE_TOO_LARGE
    } else {
        MSG_UPLOAD_UNREADABLE
    }
}

/// Read and validate the upload form of a section
async fn read_upload(
    multipart: &mut Multipart,
    config: &UploadConfig,
    needs_title: bool,
) -> Result<ImageUploadInput, &'static str> {
    let mut image = None;
    let mut alt = None;
    let mut title = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_rejection)?;
                // Browsers send an empty part when no file was chosen
                if !data.is_empty() {
                    image = Some((file_name, content_type, data.to_vec()));
                }
            }
            "alt" => alt = Some(field.text().await.map_err(multipart_rejection)?),
            "title" => title = Some(field.text().await.map_err(multipart_rejection)?),
            _ => {}
        }
    }

    let Some((file_name, content_type, data)) = image else {
        return Err(MSG_IMAGE_REQUIRED);
    };
    if !config.is_type_allowed(&content_type) {
        return Err(MSG_IMAGE_TYPE);
    }
    if data.len() as u64 > config.max_file_size {
        return Err(MSG_IMAGE_TOO_LARGE);
    }

    let item_title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    if needs_title && item_title.is_none() {
        return Err(MSG_TITLE_REQUIRED);
    }

    Ok(ImageUploadInput {
        file_name,
        content_type,
        data,
        alt: alt.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
        item_title,
    })
}

/// POST /dashboard/{section}/image
async fn upload_image(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, PageError> {
    let path = format!("/dashboard/{}/image", slug);
    let Ok(section) = slug.parse::<Section>() else {
        return not_found_page(&state, &path);
    };
    let Some(upload) = section.image_upload() else {
        return not_found_page(&state, &path);
    };

    let image = match read_upload(&mut multipart, &state.upload_config, upload.title_field.is_some()).await {
        Ok(image) => image,
        Err(message) => {
            return render_with_error(
                &state,
                &headers,
                section,
                &session,
                StatusCode::BAD_REQUEST,
                message.to_string(),
                None,
            )
            .await;
        }
    };

    tracing::debug!("Uploading {} ({} bytes) to {}", image.file_name, image.data.len(), section);
    let result = state.content.upload_image(section, image, &session.token).await;
    match result {
        Ok(_) => Ok(Redirect::to(&format!("{}?status=uploaded", section_path(section))).into_response()),
        Err(e) if e.is_unauthorized() => Ok(end_session(&state, &headers)),
        Err(e) => {
            tracing::warn!("Failed to upload image to {}: {}", section, e);
            render_with_error(
                &state,
                &headers,
                section,
                &session,
                StatusCode::BAD_GATEWAY,
                failure_message(MSG_UPLOAD_FAILED, &e),
                None,
            )
            .await
        }
    }
}
