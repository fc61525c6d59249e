//! Section content service
//!
//! Reads section documents through the backend client, serving repeated reads
//! from the cache. Cache entries belong to one token: a token the backend has
//! never accepted always reaches the backend. Successful updates and uploads
//! drop every copy of the section and keep the writer's fresh document.

use data_encoding::HEXLOWER;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::backend::{BackendClient, BackendError, ImageUploadInput};
use crate::cache::DynCache;
use crate::models::{Section, UserId};

/// Document keys the dashboard never lets an editor change
pub const READ_ONLY_KEYS: [&str; 4] = ["updatedAt", "updatedBy", "createdAt", "id"];

/// Form field prefix for plain string values
pub const STRING_FIELD_PREFIX: &str = "f.";
/// Form field prefix for JSON values
pub const JSON_FIELD_PREFIX: &str = "j.";

/// Error types for content operations
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Submitted form could not be turned into a document
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ContentError {
    /// Whether the backend rejected the session token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ContentError::Backend(BackendError::Unauthorized))
    }
}

/// How an editable field is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text input
    Text,
    /// JSON textarea
    Json,
}

/// One top-level field of a section document, ready for a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditableField {
    pub key: String,
    pub kind: FieldKind,
    pub value: String,
    /// Form field name carrying the prefix for the kind
    pub input_name: String,
}

/// Section content service
pub struct ContentService {
    backend: Arc<BackendClient>,
    cache: DynCache,
}

impl ContentService {
    pub fn new(backend: Arc<BackendClient>, cache: DynCache) -> Self {
        Self { backend, cache }
    }

    /// Get a section document, from this token's cache entry when present
    pub async fn section(&self, section: Section, token: &str) -> Result<Value, ContentError> {
        let key = cache_key(section, token);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        let document = self.backend.fetch_section(section, token).await?;
        self.cache.set(&key, document.clone()).await;
        Ok(document)
    }

    /// Send an updated document; the backend's answer replaces the cache entry
    pub async fn update(
        &self,
        section: Section,
        payload: &Value,
        token: &str,
    ) -> Result<Value, ContentError> {
        let stored = self.backend.update_section(section, payload, token).await?;
        self.refresh(section, token, &stored).await;
        tracing::info!("Section {} updated", section);
        Ok(stored)
    }

    /// Upload an image; the backend's answer replaces the cache entry
    pub async fn upload_image(
        &self,
        section: Section,
        image: ImageUploadInput,
        token: &str,
    ) -> Result<Value, ContentError> {
        let stored = self.backend.upload_image(section, image, token).await?;
        self.refresh(section, token, &stored).await;
        tracing::info!("Image uploaded to section {}", section);
        Ok(stored)
    }

    /// Drop every cached copy of a section document
    pub async fn invalidate(&self, section: Section) {
        self.cache.delete_prefix(&section.cache_prefix()).await;
    }

    async fn refresh(&self, section: Section, token: &str, stored: &Value) {
        self.invalidate(section).await;
        // Some endpoints answer with a status message rather than the document
        if stored.is_object() && !is_status_only(stored) {
            self.cache.set(&cache_key(section, token), stored.clone()).await;
        }
    }
}

/// Cache key of a section document as seen by one token
fn cache_key(section: Section, token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", section.cache_prefix(), HEXLOWER.encode(&digest))
}

fn is_status_only(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| !obj.is_empty() && obj.keys().all(|k| k == "message" || k == "status"))
        .unwrap_or(false)
}

/// Whether a document key may be edited
pub fn is_editable_key(key: &str) -> bool {
    !key.is_empty() && !READ_ONLY_KEYS.contains(&key)
}

/// Top-level fields of a document in the order the backend sent them
///
/// Strings become text inputs; everything else is edited as pretty JSON.
pub fn editable_fields(document: &Value) -> Vec<EditableField> {
    let Some(object) = document.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter(|(key, _)| is_editable_key(key))
        .map(|(key, value)| match value {
            Value::String(s) => EditableField {
                key: key.clone(),
                kind: FieldKind::Text,
                value: s.clone(),
                input_name: format!("{}{}", STRING_FIELD_PREFIX, key),
            },
            other => EditableField {
                key: key.clone(),
                kind: FieldKind::Json,
                value: serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
                input_name: format!("{}{}", JSON_FIELD_PREFIX, key),
            },
        })
        .collect()
}

/// Rebuild form fields from a submission, keeping what the editor typed
pub fn fields_from_form(fields: &[(String, String)]) -> Vec<EditableField> {
    fields
        .iter()
        .filter_map(|(name, raw)| {
            let (key, kind) = if let Some(key) = name.strip_prefix(STRING_FIELD_PREFIX) {
                (key, FieldKind::Text)
            } else if let Some(key) = name.strip_prefix(JSON_FIELD_PREFIX) {
                (key, FieldKind::Json)
            } else {
                return None;
            };
            is_editable_key(key).then(|| EditableField {
                key: key.to_string(),
                kind,
                value: raw.clone(),
                input_name: name.clone(),
            })
        })
        .collect()
}

/// Turn submitted form fields into an update payload
///
/// `f.<key>` fields are taken as strings, `j.<key>` fields are parsed as JSON.
/// Read-only keys and unprefixed fields are ignored. `updatedBy` is set to the
/// editor's id when one is known.
pub fn build_update_payload(
    fields: &[(String, String)],
    updated_by: Option<&UserId>,
) -> Result<Value, ContentError> {
    let mut payload = Map::new();

    for (name, raw) in fields {
        if let Some(key) = name.strip_prefix(STRING_FIELD_PREFIX) {
            if is_editable_key(key) {
                payload.insert(key.to_string(), Value::String(raw.clone()));
            }
        } else if let Some(key) = name.strip_prefix(JSON_FIELD_PREFIX) {
            if !is_editable_key(key) {
                continue;
            }
            let value = serde_json::from_str(raw).map_err(|e| {
                ContentError::Validation(format!("Kolom {} bukan JSON yang valid: {}", key, e))
            })?;
            payload.insert(key.to_string(), value);
        }
    }

    if let Some(id) = updated_by {
        payload.insert("updatedBy".to_string(), Value::from(id.clone()));
    }

    Ok(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::spawn_backend;
    use crate::cache::MemoryCache;
    use crate::config::BackendConfig;
    use axum::{
        extract::Path,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn service_for(router: Router) -> ContentService {
        let base_url = spawn_backend(router).await;
        let backend = BackendClient::new(&BackendConfig {
            api_url: base_url,
            timeout_seconds: 5,
            landingpage_id: 1,
        })
        .unwrap();
        ContentService::new(Arc::new(backend), Arc::new(MemoryCache::new()))
    }

    #[test]
    fn test_payload_from_string_and_json_fields() {
        let submitted = fields(&[
            ("f.title", "Desa Allakuang"),
            ("j.missions", r#"["Maju", "Sejahtera"]"#),
            ("j.population", "1520"),
            ("csrf", "ignored"),
        ]);

        let payload = build_update_payload(&submitted, Some(&UserId::Number(7))).unwrap();

        assert_eq!(
            payload,
            json!({
                "title": "Desa Allakuang",
                "missions": ["Maju", "Sejahtera"],
                "population": 1520,
                "updatedBy": 7
            })
        );
    }

    #[test]
    fn test_payload_skips_read_only_keys() {
        let submitted = fields(&[
            ("f.id", "99"),
            ("f.updatedAt", "2020-01-01"),
            ("j.createdAt", "not json at all"),
            ("f.updatedBy", "someone else"),
            ("f.description", "Teks"),
        ]);

        let payload = build_update_payload(&submitted, None).unwrap();

        assert_eq!(payload, json!({"description": "Teks"}));
    }

    #[test]
    fn test_payload_rejects_invalid_json() {
        let submitted = fields(&[("j.items", "[1, 2")]);

        let err = build_update_payload(&submitted, None).unwrap_err();

        match err {
            ContentError::Validation(message) => assert!(message.contains("items")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_updated_by_text_id() {
        let payload = build_update_payload(&[], Some(&UserId::Text("u-1".into()))).unwrap();
        assert_eq!(payload, json!({"updatedBy": "u-1"}));
    }

    #[test]
    fn test_editable_fields_kinds_and_order() {
        let document = json!({
            "id": 1,
            "title": "Selamat Datang",
            "stats": {"kk": 400},
            "updatedAt": "2024-05-01"
        });

        let fields = editable_fields(&document);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, "title");
        assert_eq!(fields[0].kind, FieldKind::Text);
        assert_eq!(fields[0].input_name, "f.title");
        assert_eq!(fields[1].key, "stats");
        assert_eq!(fields[1].kind, FieldKind::Json);
        assert_eq!(fields[1].input_name, "j.stats");
        assert!(fields[1].value.contains("\"kk\": 400"));
    }

    #[test]
    fn test_fields_from_form_keeps_submitted_text() {
        let submitted = fields(&[("f.title", "Baru"), ("j.items", "[1,"), ("f.id", "3"), ("x", "y")]);

        let rebuilt = fields_from_form(&submitted);

        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt[0].kind, FieldKind::Text);
        assert_eq!(rebuilt[1].value, "[1,");
        assert_eq!(rebuilt[1].input_name, "j.items");
    }

    #[test]
    fn test_editable_fields_of_non_object() {
        assert!(editable_fields(&json!([1, 2])).is_empty());
        assert!(editable_fields(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_section_reads_are_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/getSejarahContents",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"description": "Sejak 1920"}))
                }
            }),
        );
        let service = service_for(router).await;

        let first = service.section(Section::Sejarah, "t").await.unwrap();
        let second = service.section(Section::Sejarah, "t").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_cached_document() {
        let router = Router::new()
            .route(
                "/getPotensiContents",
                get(|| async { Json(json!({"title": "Lama"})) }),
            )
            .route(
                "/updateSection/{id}",
                post(|Path(_id): Path<u8>, Json(body): Json<Value>| async move { Json(body) }),
            );
        let service = service_for(router).await;

        service.section(Section::Potensi, "t").await.unwrap();
        service
            .update(Section::Potensi, &json!({"title": "Baru"}), "t")
            .await
            .unwrap();

        let cached = service.section(Section::Potensi, "t").await.unwrap();
        assert_eq!(cached["title"], "Baru");
    }

    #[tokio::test]
    async fn test_status_only_answer_invalidates_cache() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let router = Router::new()
            .route(
                "/getVisiMisiContents",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"vision": "Desa mandiri"}))
                    }
                }),
            )
            .route(
                "/updateSection/{id}",
                post(|| async { Json(json!({"message": "Section updated"})) }),
            );
        let service = service_for(router).await;

        service.section(Section::VisiMisi, "t").await.unwrap();
        service
            .update(Section::VisiMisi, &json!({"vision": "Desa mandiri"}), "t")
            .await
            .unwrap();
        service.section(Section::VisiMisi, "t").await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_document_is_not_shared_across_tokens() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/getBerandaContents",
            get(move |headers: axum::http::HeaderMap| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let accepted = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer live");
                    if accepted {
                        (axum::http::StatusCode::OK, Json(json!({"title": "Allakuang"})))
                    } else {
                        (axum::http::StatusCode::UNAUTHORIZED, Json(json!({})))
                    }
                }
            }),
        );
        let service = service_for(router).await;

        service.section(Section::Beranda, "live").await.unwrap();
        let err = service.section(Section::Beranda, "forged").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_drops_other_tokens_copies() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let router = Router::new()
            .route(
                "/getPemerintahanContents",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"kades": "Lama"}))
                    }
                }),
            )
            .route(
                "/updateSection/{id}",
                post(|Json(body): Json<Value>| async move { Json(body) }),
            );
        let service = service_for(router).await;

        service.section(Section::Pemerintahan, "editor-a").await.unwrap();
        service.section(Section::Pemerintahan, "editor-b").await.unwrap();
        service
            .update(Section::Pemerintahan, &json!({"kades": "Baru"}), "editor-a")
            .await
            .unwrap();

        let seen_by_a = service.section(Section::Pemerintahan, "editor-a").await.unwrap();
        service.section(Section::Pemerintahan, "editor-b").await.unwrap();

        assert_eq!(seen_by_a["kades"], "Baru");
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cache_key_hides_token() {
        let key = cache_key(Section::Galeri, "secret.token.value");

        assert!(key.starts_with("section:galeri:"));
        assert!(!key.contains("secret"));
        assert_eq!(key, cache_key(Section::Galeri, "secret.token.value"));
        assert_ne!(key, cache_key(Section::Galeri, "other.token.value"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported() {
        let router = Router::new().route(
            "/getGalleryContents",
            get(|| async { axum::http::StatusCode::UNAUTHORIZED }),
        );
        let service = service_for(router).await;

        let err = service.section(Section::Galeri, "stale").await.unwrap_err();

        assert!(err.is_unauthorized());
    }
}
