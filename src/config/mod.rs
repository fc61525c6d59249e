//! Configuration management
//!
//! Configuration is loaded from `config.yml` and may be overridden by
//! environment variables. Missing optional values are filled with defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Content backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Content cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Image upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Content backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the REST API (without trailing slash)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Landing page new accounts are attached to
    #[serde(default = "default_landingpage_id")]
    pub landingpage_id: i64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            landingpage_id: default_landingpage_id(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_landingpage_id() -> i64 {
    1
}

/// Session cookie configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie carrying the bearer token (browser-session lifetime)
    #[serde(default = "default_token_cookie")]
    pub token_cookie: String,
    /// Cookie carrying the user profile
    #[serde(default = "default_profile_cookie")]
    pub profile_cookie: String,
    /// Lifetime of the profile cookie in days
    #[serde(default = "default_profile_max_age_days")]
    pub profile_max_age_days: u32,
    /// Mark cookies `Secure` (HTTPS deployments)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_cookie: default_token_cookie(),
            profile_cookie: default_profile_cookie(),
            profile_max_age_days: default_profile_max_age_days(),
            secure_cookies: false,
        }
    }
}

impl SessionConfig {
    pub fn profile_max_age_seconds(&self) -> u64 {
        u64::from(self.profile_max_age_days) * 24 * 60 * 60
    }
}

fn default_token_cookie() -> String {
    "desa_token".to_string()
}

fn default_profile_cookie() -> String {
    "desa_user".to_string()
}

fn default_profile_max_age_days() -> u32 {
    30
}

/// Content cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached documents
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    100
}

/// Image upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the defaults; invalid YAML is an error
    /// carrying the location of the problem.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - DESA_SERVER_HOST
    /// - DESA_SERVER_PORT
    /// - DESA_BACKEND_API_URL
    /// - DESA_BACKEND_TIMEOUT_SECONDS
    /// - DESA_BACKEND_LANDINGPAGE_ID
    /// - DESA_SESSION_TOKEN_COOKIE
    /// - DESA_SESSION_PROFILE_COOKIE
    /// - DESA_SESSION_PROFILE_MAX_AGE_DAYS
    /// - DESA_SESSION_SECURE_COOKIES
    /// - DESA_CACHE_TTL_SECONDS
    /// - DESA_UPLOAD_MAX_FILE_SIZE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides; unparseable values are ignored
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DESA_SERVER_HOST") {
            self.server.host = host;
        }
        override_parsed("DESA_SERVER_PORT", &mut self.server.port);

        if let Ok(url) = std::env::var("DESA_BACKEND_API_URL") {
            self.backend.api_url = url.trim_end_matches('/').to_string();
        }
        override_parsed("DESA_BACKEND_TIMEOUT_SECONDS", &mut self.backend.timeout_seconds);
        override_parsed("DESA_BACKEND_LANDINGPAGE_ID", &mut self.backend.landingpage_id);

        if let Ok(name) = std::env::var("DESA_SESSION_TOKEN_COOKIE") {
            self.session.token_cookie = name;
        }
        if let Ok(name) = std::env::var("DESA_SESSION_PROFILE_COOKIE") {
            self.session.profile_cookie = name;
        }
        override_parsed(
            "DESA_SESSION_PROFILE_MAX_AGE_DAYS",
            &mut self.session.profile_max_age_days,
        );
        override_parsed("DESA_SESSION_SECURE_COOKIES", &mut self.session.secure_cookies);

        override_parsed("DESA_CACHE_TTL_SECONDS", &mut self.cache.ttl_seconds);
        override_parsed("DESA_UPLOAD_MAX_FILE_SIZE", &mut self.upload.max_file_size);
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw),
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
