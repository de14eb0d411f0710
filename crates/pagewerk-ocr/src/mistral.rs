// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mistral OCR client.
//
// Three calls per document: multipart upload to the file store, a signed URL
// request for the stored file, and a recognition request that references the
// URL. All calls use bearer authentication.

use std::time::Duration;

use async_trait::async_trait;
use pagewerk_core::config::OcrConfig;
use pagewerk_core::error::{PagewerkError, ProviderStage, Result};
use pagewerk_core::types::PDF_CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::RecognitionProvider;
use crate::types::{OcrPageResult, RemoteFileId, SignedUrl};

/// Longest provider error body quoted in an error message.
const MAX_ERROR_BODY: usize = 512;

pub struct MistralProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    url_expiry_hours: u32,
}

impl MistralProvider {
    /// Build a client from configuration.
    ///
    /// Fails with [`PagewerkError::ProviderNotConfigured`] when no API key is set.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => return Err(PagewerkError::ProviderNotConfigured),
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|err| PagewerkError::Config(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
            url_expiry_hours: config.signed_url_expiry_hours,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct StoredFile {
    id: String,
}

#[derive(Deserialize)]
struct SignedUrlBody {
    url: String,
}

#[derive(Serialize)]
struct OcrRequestBody<'a> {
    model: &'a str,
    document: DocumentReference<'a>,
    include_image_base64: bool,
}

#[derive(Serialize)]
struct DocumentReference<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: &'a str,
}

#[derive(Deserialize)]
struct OcrResponseBody {
    pages: Vec<OcrPageResult>,
}

#[async_trait]
impl RecognitionProvider for MistralProvider {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>, purpose: &str) -> Result<RemoteFileId> {
        let stage = ProviderStage::Upload;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(PDF_CONTENT_TYPE)
            .map_err(|err| PagewerkError::provider(stage, err))?;
        let form = Form::new().text("purpose", purpose.to_owned()).part("file", part);

        let response = self
            .client
            .post(self.endpoint("/v1/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| PagewerkError::provider(stage, err))?;

        let stored: StoredFile = read_json(response, stage).await?;
        debug!(file_id = %stored.id, "Document stored with provider");
        Ok(RemoteFileId(stored.id))
    }

    async fn signed_url(&self, file: &RemoteFileId) -> Result<SignedUrl> {
        let stage = ProviderStage::SignUrl;
        let response = self
            .client
            .get(self.endpoint(&format!("/v1/files/{}/url", file.0)))
            .query(&[("expiry", self.url_expiry_hours)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| PagewerkError::provider(stage, err))?;

        let body: SignedUrlBody = read_json(response, stage).await?;
        Ok(SignedUrl(body.url))
    }

    async fn process(
        &self,
        model: &str,
        document_url: &SignedUrl,
        include_images: bool,
    ) -> Result<Vec<OcrPageResult>> {
        let stage = ProviderStage::Process;
        let request = OcrRequestBody {
            model,
            document: DocumentReference {
                kind: "document_url",
                document_url: document_url.as_str(),
            },
            include_image_base64: include_images,
        };

        let response = self
            .client
            .post(self.endpoint("/v1/ocr"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| PagewerkError::provider(stage, err))?;

        let body: OcrResponseBody = read_json(response, stage).await?;
        Ok(body.pages)
    }
}

/// Decode a JSON body, turning non-2xx statuses into provider errors.
async fn read_json<T>(response: reqwest::Response, stage: ProviderStage) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PagewerkError::provider(
            stage,
            format!("HTTP {status}: {}", truncate(&body, MAX_ERROR_BODY)),
        ));
    }

    response
        .json()
        .await
        .map_err(|err| PagewerkError::provider(stage, format!("unreadable response: {err}")))
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    &text[..cut]
}
