//! Content backend client
//!
//! The village REST API owns accounts and section documents. This client
//! speaks its endpoints:
//! - POST signInUsers / signUpUsers / forgotPassword / resetPassword/{token}
//! - GET getAllRoles
//! - GET get*Contents, POST updateSection/{id}, POST upload*Section/{id}

mod error;

pub use error::BackendError;

use reqwest::{multipart, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::models::{Role, Section, UserProfile};

/// Successful sign-in answer
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// New account request
#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub nama_user: String,
    pub email_user: String,
    pub password_user: String,
    pub id_role: Value,
}

/// Image to forward to a section's upload endpoint
#[derive(Debug, Clone)]
pub struct ImageUploadInput {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub alt: Option<String>,
    /// Title of the list item the image belongs to (wisata, sarana-prasarana)
    pub item_title: Option<String>,
}

/// HTTP client for the content backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    landingpage_id: i64,
}

impl BackendClient {
    /// Create a client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            landingpage_id: config.landingpage_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `path` followed by one caller-supplied segment, percent-encoded so it
    /// can never reach another endpoint
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, BackendError> {
        if matches!(segment, "" | "." | "..") {
            return Err(BackendError::InvalidUrl(format!("bad path segment {:?}", segment)));
        }

        let mut url = Url::parse(&self.url(path)).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .push(segment);
        Ok(url)
    }

    fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// POST signInUsers
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, BackendError> {
        let response = self
            .http
            .post(self.url("signInUsers"))
            .json(&json!({ "email_user": email, "password_user": password }))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    /// POST signUpUsers
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<(), BackendError> {
        let body = json!({
            "nama_user": input.nama_user,
            "email_user": input.email_user,
            "password_user": input.password_user,
            "id_landingpage": self.landingpage_id,
            "id_role": input.id_role,
        });

        let response = self.http.post(self.url("signUpUsers")).json(&body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// GET getAllRoles
    pub async fn roles(&self, token: Option<&str>) -> Result<Vec<Role>, BackendError> {
        let request = Self::authorized(self.http.get(self.url("getAllRoles")), token);
        let response = request.send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// POST forgotPassword
    pub async fn forgot_password(&self, email: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("forgotPassword"))
            .json(&json!({ "email_user": email }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// POST resetPassword/{token}
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), BackendError> {
        let url = self.url_with_segment("resetPassword", reset_token)?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "newPassword": new_password }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Fetch the document of a section
    pub async fn fetch_section(&self, section: Section, token: &str) -> Result<Value, BackendError> {
        let response = self
            .http
            .get(self.url(section.fetch_path()))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Submit an updated section document; returns the stored document
    pub async fn update_section(
        &self,
        section: Section,
        payload: &Value,
        token: &str,
    ) -> Result<Value, BackendError> {
        let response = self
            .http
            .post(self.url(&section.update_path()))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Upload an image to a section; returns the stored document
    ///
    /// Sections without an upload endpoint answer 404 without a request.
    pub async fn upload_image(
        &self,
        section: Section,
        image: ImageUploadInput,
        token: &str,
    ) -> Result<Value, BackendError> {
        let Some(upload) = section.image_upload() else {
            return Err(BackendError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: Some(format!("Section {} has no image upload", section)),
            });
        };

        let part = multipart::Part::bytes(image.data)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let mut form = multipart::Form::new().part("image", part);
        if let Some(alt) = image.alt {
            form = form.text("alt", alt);
        }
        if let (Some(field), Some(title)) = (upload.title_field, image.item_title) {
            form = form.text(field, title);
        }

        let response = self
            .http
            .post(self.url(upload.path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

/// Map non-success statuses to errors, keeping the backend's `message`
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from));
    tracing::warn!("Backend returned {}: {:?}", status, message);

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}
