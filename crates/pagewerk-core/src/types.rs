// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagewerk transform pipeline.
//
// Requests are validated once at the boundary and passed down as these typed
// structures; nothing below the boundary reads loosely-typed fields.

use serde::{Deserialize, Serialize};

/// MIME type of every document Pagewerk reads or writes.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// MIME type of multi-document split output.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// One uploaded file, as handed over by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-side file name, used to derive output names.
    pub file_name: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}

/// Validated split request.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub document: UploadedFile,
    /// Raw one-based range expression, e.g. `"1-3,7"`. `None` splits every page.
    pub ranges: Option<String>,
    /// Base name for outputs. `None` falls back to the uploaded file's stem.
    pub output_name: Option<String>,
    /// Merge the split outputs back into one document instead of archiving them.
    pub recombine: bool,
}

impl SplitRequest {
    pub fn new(document: UploadedFile) -> Self {
        Self {
            document,
            ranges: None,
            output_name: None,
            recombine: false,
        }
    }

    /// Set the range expression. Blank input is the same as no input.
    pub fn with_ranges(mut self, ranges: impl Into<String>) -> Self {
        self.ranges = non_blank(ranges.into());
        self
    }

    /// Set the output base name. Blank input is the same as no input.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = non_blank(name.into());
        self
    }

    pub fn with_recombine(mut self, recombine: bool) -> Self {
        self.recombine = recombine;
        self
    }
}

/// Validated merge request. Document order is output order.
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    pub documents: Vec<UploadedFile>,
    pub output_name: Option<String>,
}

impl MergeRequest {
    pub fn new(documents: Vec<UploadedFile>) -> Self {
        Self {
            documents,
            output_name: None,
        }
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = non_blank(name.into());
        self
    }
}

/// Validated recognition request.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub document: UploadedFile,
}

impl OcrRequest {
    pub fn new(document: UploadedFile) -> Self {
        Self { document }
    }
}

/// A finished output, ready for the response transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl OutputArtifact {
    /// A single PDF document.
    pub fn pdf(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: PDF_CONTENT_TYPE.to_owned(),
            file_name: file_name.into(),
        }
    }

    /// A zip archive of several documents.
    pub fn zip(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: ZIP_CONTENT_TYPE.to_owned(),
            file_name: file_name.into(),
        }
    }

    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .file_name
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();
        format!("attachment; filename=\"{safe}\"")
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
