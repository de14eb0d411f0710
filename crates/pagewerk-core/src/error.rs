// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.
//
// Every failure is reported once, at the request boundary. Callers branch on
// the variant (or on `class()` / `code()`), never on message text.

use std::fmt;

use thiserror::Error;

/// Which side of the request boundary a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something unusable. Retrying the same input fails again.
    Client,
    /// Pagewerk or one of its collaborators failed.
    Server,
}

/// Why a single page-range token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeErrorReason {
    /// Nothing between two commas.
    EmptyToken,
    /// A bound is not a non-negative integer.
    NotANumber,
    /// `start` is greater than `end`.
    StartAfterEnd,
    /// Page numbers are one-based; `0` is not a page.
    BelowFirstPage,
    /// `end` points past the last page of the document.
    BeyondLastPage { total: usize },
}

impl fmt::Display for RangeErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToken => write!(f, "empty range"),
            Self::NotANumber => write!(f, "page numbers must be positive integers"),
            Self::StartAfterEnd => write!(f, "start page is after end page"),
            Self::BelowFirstPage => write!(f, "page numbers start at 1"),
            Self::BeyondLastPage { total } => {
                write!(f, "document only has {total} page(s)")
            }
        }
    }
}

/// Stage of a recognition job at which the external provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStage {
    Upload,
    SignUrl,
    Process,
    /// The provider answered, but the answer does not describe the document.
    Response,
}

impl fmt::Display for ProviderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upload => "upload",
            Self::SignUrl => "url signing",
            Self::Process => "recognition",
            Self::Response => "response validation",
        };
        f.write_str(name)
    }
}

/// Top-level error type for all Pagewerk operations.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Request boundary --
    #[error("no document provided in field `{0}`")]
    InputMissing(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("file `{name}` exceeds the upload limit of {limit} bytes")]
    UploadTooLarge { name: String, limit: usize },

    // -- Document errors --
    #[error("invalid page range `{token}`: {reason}")]
    RangeFormat {
        token: String,
        reason: RangeErrorReason,
    },

    #[error("could not read PDF: {0}")]
    Decode(String),

    #[error("no PDF files provided to merge")]
    EmptyMergeSet,

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("archive build failed: {0}")]
    ArchiveBuild(String),

    // -- Recognition --
    #[error("recognition provider failed during {stage}: {detail}")]
    Provider { stage: ProviderStage, detail: String },

    #[error("recognition provider is not configured")]
    ProviderNotConfigured,

    #[error("recognition job {job} cannot move from {from} to {to}")]
    JobTransition {
        job: String,
        from: String,
        to: String,
    },

    // -- Plumbing --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagewerkError {
    /// Shorthand for a rejected range token.
    pub fn range(token: impl Into<String>, reason: RangeErrorReason) -> Self {
        Self::RangeFormat {
            token: token.into(),
            reason,
        }
    }

    /// Shorthand for a provider failure at `stage`.
    pub fn provider(stage: ProviderStage, detail: impl fmt::Display) -> Self {
        Self::Provider {
            stage,
            detail: detail.to_string(),
        }
    }

    /// Classify the error for the response layer.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InputMissing(_)
            | Self::InvalidRequest(_)
            | Self::UploadTooLarge { .. }
            | Self::RangeFormat { .. }
            | Self::Decode(_)
            | Self::EmptyMergeSet => ErrorClass::Client,

            Self::Pdf(_)
            | Self::ArchiveBuild(_)
            | Self::Provider { .. }
            | Self::ProviderNotConfigured
            | Self::JobTransition { .. }
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorClass::Server,
        }
    }

    /// Stable machine-readable code, included in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputMissing(_) => "INPUT_MISSING",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UploadTooLarge { .. } => "UPLOAD_TOO_LARGE",
            Self::RangeFormat { .. } => "RANGE_FORMAT",
            Self::Decode(_) => "DECODE_ERROR",
            Self::EmptyMergeSet => "EMPTY_MERGE_SET",
            Self::Pdf(_) => "PDF_ERROR",
            Self::ArchiveBuild(_) => "ARCHIVE_BUILD_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            Self::JobTransition { .. } => "JOB_STATE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;
