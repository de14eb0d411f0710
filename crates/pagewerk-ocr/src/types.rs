// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition types: per-page results and provider handles.

use std::fmt;

use pagewerk_core::config::OcrConfig;
use serde::{Deserialize, Serialize};

/// Purpose declared when handing a document to the provider's file store.
pub const OCR_PURPOSE: &str = "ocr";

/// Opaque identifier the provider assigns to an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteFileId(pub String);

impl fmt::Display for RemoteFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-limited retrieval URL for an uploaded document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedUrl(pub String);

impl SignedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Signed URLs grant read access; keep the query string out of logs.
impl fmt::Debug for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.0.split('?').next().unwrap_or_default();
        write!(f, "SignedUrl({base}?..)")
    }
}

/// Recognised content of one source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPageResult {
    /// Zero-based source page index.
    pub index: usize,
    /// Page text, in markdown.
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<PageImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<PageDimensions>,
}

/// An image embedded in a recognised page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_y: Option<f64>,
    /// Base64 data URL; only present when images were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// Rendered page size reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

/// Model selection for the recognition step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub model: String,
    pub include_images: bool,
}

impl From<&OcrConfig> for RecognitionSettings {
    fn from(config: &OcrConfig) -> Self {
        Self {
            model: config.model.clone(),
            include_images: config.include_images,
        }
    }
}
