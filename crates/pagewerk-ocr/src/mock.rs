// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-process provider for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use pagewerk_core::error::{PagewerkError, ProviderStage, Result};

use crate::provider::RecognitionProvider;
use crate::types::{OcrPageResult, RemoteFileId, SignedUrl};

/// Arguments of the last `process` call.
#[derive(Debug, Clone)]
pub struct ProcessCall {
    pub model: String,
    pub document_url: SignedUrl,
    pub include_images: bool,
}

/// Returns canned pages, optionally failing at one stage, and records calls.
#[derive(Default)]
pub struct MockProvider {
    pages: Vec<OcrPageResult>,
    fail_at: Option<ProviderStage>,
    calls: Mutex<Vec<&'static str>>,
    upload_purpose: Mutex<Option<String>>,
    last_process: Mutex<Option<ProcessCall>>,
}

impl MockProvider {
    /// A provider whose `process` returns `pages` as given.
    pub fn returning(pages: Vec<OcrPageResult>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Fail the call for `stage` with a provider error.
    pub fn failing_at(mut self, stage: ProviderStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Provider calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub fn last_upload_purpose(&self) -> Option<String> {
        lock(&self.upload_purpose).clone()
    }

    pub fn last_process(&self) -> Option<ProcessCall> {
        lock(&self.last_process).clone()
    }

    /// The URL this provider hands out from `signed_url`.
    pub fn issued_url(&self) -> SignedUrl {
        SignedUrl("https://signed.mock/file-1?sig=test".into())
    }

    fn record(&self, call: &'static str, stage: ProviderStage) -> Result<()> {
        lock(&self.calls).push(call);
        if self.fail_at == Some(stage) {
            return Err(PagewerkError::provider(stage, "injected failure"));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RecognitionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, _file_name: &str, _bytes: Vec<u8>, purpose: &str) -> Result<RemoteFileId> {
        self.record("upload", ProviderStage::Upload)?;
        *lock(&self.upload_purpose) = Some(purpose.to_owned());
        Ok(RemoteFileId("file-1".into()))
    }

    async fn signed_url(&self, _file: &RemoteFileId) -> Result<SignedUrl> {
        self.record("signed_url", ProviderStage::SignUrl)?;
        Ok(self.issued_url())
    }

    async fn process(
        &self,
        model: &str,
        document_url: &SignedUrl,
        include_images: bool,
    ) -> Result<Vec<OcrPageResult>> {
        self.record("process", ProviderStage::Process)?;
        *lock(&self.last_process) = Some(ProcessCall {
            model: model.to_owned(),
            document_url: document_url.clone(),
            include_images,
        });
        Ok(self.pages.clone())
    }
}
