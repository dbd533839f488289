//! Configuration module
//!
//! This module provides the configuration structures for the HTTP server and the
//! upload pipeline. Values are read once from the process environment at startup
//! and injected into the services that need them; nothing else reads the
//! environment directly.

use std::env;
use std::path::PathBuf;

use crate::messages::Locale;

// Common constants
const SERVER_PORT: u16 = 3000;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const STORAGE_ROOT: &str = "public";

/// Hard per-file ceiling (10 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
/// Uploads smaller than this are rejected before decoding.
pub const MIN_FILE_SIZE_BYTES: u64 = 2048;

/// Declared content types admitted by the type filter.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/png",
    "image/jpg",
    "image/jpeg",
    "image/gif",
    "image/svg+xml",
];

/// Extensions that may be carried over into a generated storage name.
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".svg"];

/// HTTP server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub http_concurrency_limit: usize,
    pub locale: Locale,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            locale: Locale::default(),
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Directory accepted files are written to.
    pub temp_dir: PathBuf,
    /// Public path segment prepended to stored file names (`UPLOAD_PATH`).
    pub public_path: Option<String>,
    pub max_file_size_bytes: u64,
    pub min_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    /// Lower-cased, dot-prefixed (".png").
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from(STORAGE_ROOT),
            public_path: None,
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            min_file_size_bytes: MIN_FILE_SIZE_BYTES,
            allowed_content_types: ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UploadConfig {
    /// Build the upload configuration from a key lookup.
    ///
    /// `UPLOAD_ROOT` is the storage root (default `public`); `UPLOAD_PATH_TEMP`,
    /// when set, names a sub-directory of that root that receives new uploads.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let root = lookup("UPLOAD_ROOT")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(STORAGE_ROOT));

        let temp_dir = match lookup("UPLOAD_PATH_TEMP").and_then(|s| normalize_segment(&s)) {
            Some(segment) => root.join(segment),
            None => root,
        };

        Self {
            temp_dir,
            public_path: lookup("UPLOAD_PATH").and_then(|s| normalize_segment(&s)),
            max_file_size_bytes: lookup("UPLOAD_MAX_FILE_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_file_size_bytes),
            min_file_size_bytes: lookup("UPLOAD_MIN_FILE_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_file_size_bytes),
            ..defaults
        }
    }

    /// Public, root-relative path under which a stored file is served.
    ///
    /// `/{UPLOAD_PATH}/{file_name}` when a public path is configured, `/{file_name}` otherwise.
    pub fn public_file_path(&self, file_name: &str) -> String {
        match self.public_path.as_deref() {
            Some(prefix) => format!("/{}/{}", prefix, file_name),
            None => format!("/{}", file_name),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.min_file_size_bytes >= self.max_file_size_bytes {
            return Err(anyhow::anyhow!(
                "UPLOAD_MIN_FILE_SIZE_BYTES ({}) must be smaller than UPLOAD_MAX_FILE_SIZE_BYTES ({})",
                self.min_file_size_bytes,
                self.max_file_size_bytes
            ));
        }

        if let Some(prefix) = &self.public_path {
            if prefix.split('/').any(|part| part == "..") {
                return Err(anyhow::anyhow!(
                    "UPLOAD_PATH must not contain '..' segments"
                ));
            }
        }

        if self
            .temp_dir
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(anyhow::anyhow!(
                "UPLOAD_PATH_TEMP must not contain '..' segments"
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("At least one content type must be allowed"));
        }

        Ok(())
    }
}

/// Trim surrounding slashes and whitespace; empty segments count as unset.
fn normalize_segment(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Load `.env` (if present) and read the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(anyhow::anyhow!("Failed to load .env file: {}", e));
            }
        }

        let config = Self::from_lookup(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let locale = match lookup("APP_LOCALE") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default locale");
                Locale::default()
            }),
            None => Locale::default(),
        };

        let server = ServerConfig {
            server_port: lookup("SERVER_PORT")
                .or_else(|| lookup("PORT"))
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or(defaults.environment),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs)
                .max(1),
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_concurrency_limit)
                .max(1),
            locale,
        };

        Config {
            server,
            upload: UploadConfig::from_lookup(lookup),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be a non-zero port number"));
        }
        self.upload.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.server.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server.server_port
    }

    pub fn locale(&self) -> Locale {
        self.server.locale
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.upload.max_file_size_bytes
    }
}
