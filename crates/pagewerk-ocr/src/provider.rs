// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition provider seam.
//
// A provider stores an uploaded document, issues a time-limited URL for it,
// and runs recognition against that URL. Failures are reported as
// `PagewerkError::Provider` tagged with the stage that failed.

use async_trait::async_trait;
use pagewerk_core::error::Result;

use crate::types::{OcrPageResult, RemoteFileId, SignedUrl};

#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Store `bytes` under `file_name`, declared for `purpose`.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>, purpose: &str) -> Result<RemoteFileId>;

    /// Request a time-limited retrieval URL for an uploaded file.
    async fn signed_url(&self, file: &RemoteFileId) -> Result<SignedUrl>;

    /// Recognise the document at `document_url`. Page order is not guaranteed.
    async fn process(
        &self,
        model: &str,
        document_url: &SignedUrl,
        include_images: bool,
    ) -> Result<Vec<OcrPageResult>>;
}
