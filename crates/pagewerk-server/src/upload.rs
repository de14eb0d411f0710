// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart forms to validated requests.
//
// Each form is read once, with per-file size limits enforced while streaming.
// Field names: `pdf` (split, ocr), repeated `pdfs` (merge), and the text
// fields `pageRanges`, `fileName`, `recombine`. Unknown fields are skipped.

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use pagewerk_core::config::LimitsConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{MergeRequest, OcrRequest, SplitRequest, UploadedFile};
use tracing::debug;

pub const FIELD_PDF: &str = "pdf";
pub const FIELD_PDFS: &str = "pdfs";
pub const FIELD_PAGE_RANGES: &str = "pageRanges";
pub const FIELD_FILE_NAME: &str = "fileName";
pub const FIELD_RECOMBINE: &str = "recombine";

/// Raw form contents, before per-endpoint validation.
#[derive(Debug, Default)]
struct UploadForm {
    pdf: Vec<UploadedFile>,
    pdfs: Vec<UploadedFile>,
    page_ranges: Option<String>,
    file_name: Option<String>,
    recombine: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, limits: &LimitsConfig) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| multipart_error(err, limits))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                FIELD_PDF => form.pdf.push(read_file(field, limits).await?),
                FIELD_PDFS => {
                    if form.pdfs.len() >= limits.max_merge_files {
                        return Err(PagewerkError::InvalidRequest(format!(
                            "at most {} files can be merged at once",
                            limits.max_merge_files
                        )));
                    }
                    form.pdfs.push(read_file(field, limits).await?);
                }
                FIELD_PAGE_RANGES => form.page_ranges = Some(read_text(field, limits).await?),
                FIELD_FILE_NAME => form.file_name = Some(read_text(field, limits).await?),
                FIELD_RECOMBINE => form.recombine = Some(read_text(field, limits).await?),
                other => debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// The single `pdf` upload.
    fn single_pdf(&mut self) -> Result<UploadedFile> {
        if self.pdf.len() > 1 {
            return Err(PagewerkError::InvalidRequest(format!(
                "expected one file in field `{FIELD_PDF}`, got {}",
                self.pdf.len()
            )));
        }
        self.pdf
            .pop()
            .ok_or_else(|| PagewerkError::InputMissing(FIELD_PDF.to_owned()))
    }
}

pub async fn split_request(multipart: Multipart, limits: &LimitsConfig) -> Result<SplitRequest> {
    let mut form = UploadForm::read(multipart, limits).await?;
    let mut request = SplitRequest::new(form.single_pdf()?);
    if let Some(ranges) = form.page_ranges {
        request = request.with_ranges(ranges);
    }
    if let Some(name) = form.file_name {
        request = request.with_output_name(name);
    }
    if let Some(flag) = form.recombine {
        request = request.with_recombine(parse_flag(&flag)?);
    }
    Ok(request)
}

/// An empty `pdfs` list is passed through; the merge itself rejects it.
pub async fn merge_request(multipart: Multipart, limits: &LimitsConfig) -> Result<MergeRequest> {
    let form = UploadForm::read(multipart, limits).await?;
    let mut request = MergeRequest::new(form.pdfs);
    if let Some(name) = form.file_name {
        request = request.with_output_name(name);
    }
    Ok(request)
}

pub async fn ocr_request(multipart: Multipart, limits: &LimitsConfig) -> Result<OcrRequest> {
    let mut form = UploadForm::read(multipart, limits).await?;
    Ok(OcrRequest::new(form.single_pdf()?))
}

async fn read_file(mut field: Field<'_>, limits: &LimitsConfig) -> Result<UploadedFile> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let limit = limits.max_upload_bytes;

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| multipart_error(err, limits))?
    {
        if data.len() + chunk.len() > limit {
            return Err(PagewerkError::UploadTooLarge {
                name: file_name,
                limit,
            });
        }
        data.extend_from_slice(&chunk);
    }

    debug!(file_name = %file_name, bytes = data.len(), "Received upload");
    Ok(UploadedFile::new(file_name, data))
}

async fn read_text(field: Field<'_>, limits: &LimitsConfig) -> Result<String> {
    field.text().await.map_err(|err| multipart_error(err, limits))
}

fn multipart_error(err: MultipartError, limits: &LimitsConfig) -> PagewerkError {
    // The request-wide body limit surfaces as a multipart read error.
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return PagewerkError::UploadTooLarge {
            name: "request body".to_owned(),
            limit: limits.max_body_bytes(),
        };
    }
    PagewerkError::InvalidRequest(format!("malformed multipart body: {}", err.body_text()))
}

/// Parse a form checkbox value.
fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => Err(PagewerkError::InvalidRequest(format!(
            "`{FIELD_RECOMBINE}` must be true or false, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_form_spellings() {
        for raw in ["true", "TRUE", "1", "on", " yes "] {
            assert!(parse_flag(raw).unwrap(), "{raw}");
        }
        for raw in ["false", "0", "off", "no", ""] {
            assert!(!parse_flag(raw).unwrap(), "{raw}");
        }
        assert!(matches!(
            parse_flag("maybe"),
            Err(PagewerkError::InvalidRequest(_))
        ));
    }

    #[test]
    fn single_pdf_requires_exactly_one_file() {
        let mut form = UploadForm::default();
        assert!(matches!(
            form.single_pdf(),
            Err(PagewerkError::InputMissing(field)) if field == "pdf"
        ));

        form.pdf = vec![
            UploadedFile::new("a.pdf", vec![1]),
            UploadedFile::new("b.pdf", vec![2]),
        ];
        assert!(matches!(form.single_pdf(), Err(PagewerkError::InvalidRequest(_))));

        form.pdf.truncate(1);
        assert_eq!(form.single_pdf().unwrap().file_name, "a.pdf");
    }
}
