// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition job orchestration.
//
// A job moves Created -> Uploaded -> UrlSigned -> Submitted -> Completed, one
// provider call per step, or to Failed from any non-terminal state. There is
// no retry: the first provider error ends the job. Completed results are put
// into source page order and must cover every page exactly once.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pagewerk_core::error::{PagewerkError, ProviderStage, Result};
use pagewerk_document::Document;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::provider::RecognitionProvider;
use crate::types::{OCR_PURPOSE, OcrPageResult, RecognitionSettings, RemoteFileId, SignedUrl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrJobStatus {
    Created,
    Uploaded,
    UrlSigned,
    Submitted,
    Completed,
    Failed,
}

impl OcrJobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a job in this state may move to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use OcrJobStatus::*;
        match (self, next) {
            (Created, Uploaded) | (Uploaded, UrlSigned) | (UrlSigned, Submitted) => true,
            (Submitted, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OcrJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Uploaded => "uploaded",
            Self::UrlSigned => "url_signed",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of one recognition request. Lives only as long as the request.
#[derive(Debug)]
pub struct OcrJob {
    id: Uuid,
    created_at: DateTime<Utc>,
    /// Fingerprint of the source document.
    document: String,
    file_name: String,
    remote_file: Option<RemoteFileId>,
    signed_url: Option<SignedUrl>,
    status: OcrJobStatus,
    failed_stage: Option<ProviderStage>,
}

impl OcrJob {
    pub fn new(document: &Document, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            document: document.fingerprint().to_owned(),
            file_name: file_name.into(),
            remote_file: None,
            signed_url: None,
            status: OcrJobStatus::Created,
            failed_stage: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Fingerprint of the document being recognised.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn status(&self) -> OcrJobStatus {
        self.status
    }

    pub fn remote_file(&self) -> Option<&RemoteFileId> {
        self.remote_file.as_ref()
    }

    pub fn signed_url(&self) -> Option<&SignedUrl> {
        self.signed_url.as_ref()
    }

    /// Stage at which the job failed, if it failed at a provider call.
    pub fn failed_stage(&self) -> Option<ProviderStage> {
        self.failed_stage
    }

    fn transition(&mut self, next: OcrJobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PagewerkError::JobTransition {
                job: self.id.to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_uploaded(&mut self, file: RemoteFileId) -> Result<()> {
        self.transition(OcrJobStatus::Uploaded)?;
        self.remote_file = Some(file);
        Ok(())
    }

    pub fn mark_url_signed(&mut self, url: SignedUrl) -> Result<()> {
        self.transition(OcrJobStatus::UrlSigned)?;
        self.signed_url = Some(url);
        Ok(())
    }

    pub fn mark_submitted(&mut self) -> Result<()> {
        self.transition(OcrJobStatus::Submitted)
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(OcrJobStatus::Completed)
    }

    /// Move to `Failed`, recording the provider stage if `error` names one.
    pub fn fail(&mut self, error: &PagewerkError) -> Result<()> {
        self.transition(OcrJobStatus::Failed)?;
        if let PagewerkError::Provider { stage, .. } = error {
            self.failed_stage = Some(*stage);
        }
        Ok(())
    }
}

/// Runs recognition jobs against an injected provider.
#[derive(Clone)]
pub struct OcrOrchestrator {
    provider: Arc<dyn RecognitionProvider>,
    settings: RecognitionSettings,
}

impl OcrOrchestrator {
    pub fn new(provider: Arc<dyn RecognitionProvider>, settings: RecognitionSettings) -> Self {
        Self { provider, settings }
    }

    /// Recognise every page of `document`, returning results in page order.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn recognize(&self, document: &Document, file_name: &str) -> Result<Vec<OcrPageResult>> {
        let mut job = OcrJob::new(document, file_name);
        info!(
            job = %job.id(),
            document = job.document(),
            file_name = job.file_name(),
            pages = document.page_count(),
            "Recognition job created"
        );

        match self.run(&mut job, document).await {
            Ok(pages) => {
                info!(job = %job.id(), pages = pages.len(), "Recognition job completed");
                Ok(pages)
            }
            Err(err) => {
                let from = job.status();
                job.fail(&err)?;
                warn!(job = %job.id(), %from, error = %err, "Recognition job failed");
                Err(err)
            }
        }
    }

    async fn run(&self, job: &mut OcrJob, document: &Document) -> Result<Vec<OcrPageResult>> {
        let file = self
            .provider
            .upload(&job.file_name, document.to_vec(), OCR_PURPOSE)
            .await?;
        job.mark_uploaded(file.clone())?;

        let url = self.provider.signed_url(&file).await?;
        job.mark_url_signed(url.clone())?;

        job.mark_submitted()?;
        let pages = self
            .provider
            .process(&self.settings.model, &url, self.settings.include_images)
            .await?;

        let pages = into_page_order(pages, document.page_count())?;
        job.complete()?;
        Ok(pages)
    }
}

/// Sort results by page index and check they cover `0..page_count` exactly once.
pub fn into_page_order(mut pages: Vec<OcrPageResult>, page_count: usize) -> Result<Vec<OcrPageResult>> {
    if pages.len() != page_count {
        return Err(PagewerkError::provider(
            ProviderStage::Response,
            format!("expected {page_count} page result(s), got {}", pages.len()),
        ));
    }

    pages.sort_by_key(|page| page.index);
    if let Some((position, page)) = pages
        .iter()
        .enumerate()
        .find(|(position, page)| page.index != *position)
    {
        return Err(PagewerkError::provider(
            ProviderStage::Response,
            format!("page index {} where {position} was expected", page.index),
        ));
    }

    Ok(pages)
}
