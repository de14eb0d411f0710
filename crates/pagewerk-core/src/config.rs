// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Resolution order: built-in defaults, then an optional JSON file named by
// `PAGEWERK_CONFIG`, then individual environment variables.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagewerkError, Result};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_VAR: &str = "PAGEWERK_CONFIG";

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub ocr: OcrConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
        }
    }
}

/// Per-request resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted single upload, in bytes.
    pub max_upload_bytes: usize,
    /// Most documents accepted by one merge request.
    pub max_merge_files: usize,
    /// Most range extractions running at once within one split request.
    pub split_concurrency: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_merge_files: 20,
            split_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl LimitsConfig {
    /// Upper bound on a whole request body.
    pub fn max_body_bytes(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(self.max_merge_files.max(1))
            // Multipart framing and text fields.
            .saturating_add(64 * 1024)
    }
}

/// Recognition provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Bearer token for the provider. OCR is disabled when absent.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Ask the provider to return embedded images as base64.
    pub include_images: bool,
    /// Lifetime of the signed retrieval URL.
    pub signed_url_expiry_hours: u32,
    /// Connection timeout for provider calls. Request timeouts are left to the provider.
    pub connect_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.mistral.ai".to_owned(),
            model: "mistral-ocr-latest".to_owned(),
            include_images: true,
            signed_url_expiry_hours: 24,
            connect_timeout_secs: 10,
        }
    }
}

impl OcrConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("include_images", &self.include_images)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            PagewerkError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Override fields from environment-style variables supplied by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("PAGEWERK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PAGEWERK_PORT") {
            self.server.port = parse_var("PAGEWERK_PORT", &port)?;
        }
        if let Some(bytes) = lookup("PAGEWERK_MAX_UPLOAD_BYTES") {
            self.limits.max_upload_bytes = parse_var("PAGEWERK_MAX_UPLOAD_BYTES", &bytes)?;
        }
        if let Some(files) = lookup("PAGEWERK_MAX_MERGE_FILES") {
            self.limits.max_merge_files = parse_var("PAGEWERK_MAX_MERGE_FILES", &files)?;
        }
        if let Some(tasks) = lookup("PAGEWERK_SPLIT_CONCURRENCY") {
            let tasks: usize = parse_var("PAGEWERK_SPLIT_CONCURRENCY", &tasks)?;
            self.limits.split_concurrency = tasks.max(1);
        }
        if let Some(key) = lookup("MISTRAL_API_KEY") {
            self.ocr.api_key = Some(key);
        }
        if let Some(url) = lookup("PAGEWERK_OCR_BASE_URL") {
            self.ocr.base_url = url;
        }
        if let Some(model) = lookup("PAGEWERK_OCR_MODEL") {
            self.ocr.model = model;
        }
        if let Some(flag) = lookup("PAGEWERK_OCR_INCLUDE_IMAGES") {
            self.ocr.include_images = parse_var("PAGEWERK_OCR_INCLUDE_IMAGES", &flag)?;
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| PagewerkError::Config(format!("{name}={value:?}: {err}")))
}
