// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform service: the composition root for split, merge and recognition.
//
// Takes validated requests, runs the document engines, and returns finished
// artifacts. Decoding and merging are CPU-bound and run on the blocking pool.

use std::sync::Arc;

use pagewerk_core::config::{AppConfig, LimitsConfig};
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::{MergeRequest, OcrRequest, OutputArtifact, SplitRequest, UploadedFile};
use pagewerk_document::archive::{ArchiveBuilder, ArchiveEntry};
use pagewerk_document::naming::{self, DEFAULT_BASE, MERGED_BASE};
use pagewerk_document::{Document, SplitPart, merge, range, split};
use pagewerk_ocr::{MistralProvider, OcrOrchestrator, OcrPageResult, RecognitionSettings};
use tracing::{info, instrument, warn};

/// File name given to the provider when the client sent none.
const FALLBACK_UPLOAD_NAME: &str = "document.pdf";

#[derive(Clone)]
pub struct TransformService {
    limits: LimitsConfig,
    ocr: Option<OcrOrchestrator>,
}

impl TransformService {
    pub fn new(limits: LimitsConfig, ocr: Option<OcrOrchestrator>) -> Self {
        Self { limits, ocr }
    }

    /// Build the service from configuration. OCR stays disabled without an API key.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let ocr = if config.ocr.is_enabled() {
            let provider = MistralProvider::new(&config.ocr)?;
            info!(model = %config.ocr.model, base_url = %config.ocr.base_url, "OCR provider configured");
            Some(OcrOrchestrator::new(
                Arc::new(provider),
                RecognitionSettings::from(&config.ocr),
            ))
        } else {
            warn!("MISTRAL_API_KEY not set; /ocr will answer 503");
            None
        };
        Ok(Self::new(config.limits.clone(), ocr))
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr.is_some()
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Split one document by page range.
    ///
    /// One output comes back as a PDF, several as a zip archive, and with
    /// `recombine` the outputs are merged back into a single PDF.
    #[instrument(skip_all, fields(file_name = %request.document.file_name, recombine = request.recombine))]
    pub async fn split(&self, request: SplitRequest) -> Result<OutputArtifact> {
        let base = naming::base_name(
            request.output_name.as_deref(),
            Some(&request.document.file_name),
            DEFAULT_BASE,
        );
        let document = load(request.document).await?;
        let ranges = range::parse(request.ranges.as_deref(), document.page_count())?;
        info!(
            pages = document.page_count(),
            ranges = ranges.len(),
            explicit = ranges.is_explicit(),
            "Splitting document"
        );

        let parts = split(Arc::new(document), &ranges, self.limits.split_concurrency).await?;

        if request.recombine {
            let documents: Vec<Document> = parts.into_iter().map(|part| part.document).collect();
            let merged = blocking(move || merge(&documents)).await?;
            return Ok(OutputArtifact::pdf(merged.to_vec(), naming::recombined_name(&base)));
        }

        match <[SplitPart; 1]>::try_from(parts) {
            Ok([only]) => Ok(OutputArtifact::pdf(
                only.document.to_vec(),
                naming::split_entry_name(&base, &only.range),
            )),
            Err(parts) => {
                let archive_base = base.clone();
                let bytes = blocking(move || {
                    let mut archive = ArchiveBuilder::new();
                    archive.extend(parts.into_iter().map(|part| {
                        ArchiveEntry::new(
                            naming::split_entry_name(&archive_base, &part.range),
                            part.document.to_vec(),
                        )
                    }));
                    archive.build()
                })
                .await?;
                Ok(OutputArtifact::zip(bytes, naming::archive_name(&base)))
            }
        }
    }

    /// Concatenate the uploaded documents in upload order.
    #[instrument(skip_all, fields(inputs = request.documents.len()))]
    pub async fn merge(&self, request: MergeRequest) -> Result<OutputArtifact> {
        if request.documents.is_empty() {
            return Err(PagewerkError::EmptyMergeSet);
        }
        let base = naming::base_name(request.output_name.as_deref(), None, MERGED_BASE);

        let merged = blocking(move || {
            let documents = request
                .documents
                .into_iter()
                .map(|upload| Document::load(upload.data))
                .collect::<Result<Vec<_>>>()?;
            merge(&documents)
        })
        .await?;

        Ok(OutputArtifact::pdf(merged.to_vec(), naming::merged_name(&base)))
    }

    /// Recognise every page of one document.
    #[instrument(skip_all, fields(file_name = %request.document.file_name))]
    pub async fn recognize(&self, request: OcrRequest) -> Result<Vec<OcrPageResult>> {
        let orchestrator = self.ocr.as_ref().ok_or(PagewerkError::ProviderNotConfigured)?;

        let file_name = upload_name(&request.document).to_owned();
        let document = load(request.document).await?;
        orchestrator.recognize(&document, &file_name).await
    }
}

fn upload_name(upload: &UploadedFile) -> &str {
    if upload.file_name.trim().is_empty() {
        FALLBACK_UPLOAD_NAME
    } else {
        &upload.file_name
    }
}

async fn load(upload: UploadedFile) -> Result<Document> {
    blocking(move || Document::load(upload.data)).await
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PagewerkError::Pdf(format!("worker task failed: {err}")))?
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use pagewerk_core::error::{ProviderStage, RangeErrorReason};
    use pagewerk_core::types::{PDF_CONTENT_TYPE, ZIP_CONTENT_TYPE};
    use pagewerk_document::pdf::fixtures::{page_labels, sample_pdf};
    use pagewerk_ocr::mock::MockProvider;

    use super::*;

    fn service() -> TransformService {
        TransformService::new(LimitsConfig::default(), None)
    }

    fn upload(name: &str, pages: usize) -> UploadedFile {
        UploadedFile::new(name, sample_pdf(pages))
    }

    fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).expect("entry");
                let mut data = Vec::new();
                file.read_to_end(&mut data).expect("read");
                (file.name().to_owned(), data)
            })
            .collect()
    }

    #[tokio::test]
    async fn ranges_are_archived_with_one_based_names() {
        let request = SplitRequest::new(upload("report.pdf", 10)).with_ranges("1-3,7-7");

        let artifact = service().split(request).await.unwrap();

        assert_eq!(artifact.content_type, ZIP_CONTENT_TYPE);
        assert_eq!(artifact.file_name, "report.zip");
        let entries = zip_entries(&artifact.bytes);
        let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["report-pages-1-3.pdf", "report-pages-7-7.pdf"]);
        assert_eq!(page_labels(&entries[0].1).len(), 3);
        assert_eq!(page_labels(&entries[1].1), vec!["Page 7"]);
    }

    #[tokio::test]
    async fn single_range_returns_pdf_directly() {
        let request = SplitRequest::new(upload("report.pdf", 4))
            .with_ranges("2-3")
            .with_output_name("chapter");

        let artifact = service().split(request).await.unwrap();

        assert_eq!(artifact.content_type, PDF_CONTENT_TYPE);
        assert_eq!(artifact.file_name, "chapter-pages-2-3.pdf");
        assert_eq!(page_labels(&artifact.bytes), vec!["Page 2", "Page 3"]);
    }

    #[tokio::test]
    async fn default_split_archives_every_page() {
        let artifact = service()
            .split(SplitRequest::new(upload("", 3)))
            .await
            .unwrap();

        assert_eq!(artifact.file_name, "document.zip");
        let names: Vec<String> = zip_entries(&artifact.bytes)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "document-pages-1-1.pdf",
                "document-pages-2-2.pdf",
                "document-pages-3-3.pdf",
            ]
        );
    }

    #[tokio::test]
    async fn recombine_skips_the_archive() {
        let request = SplitRequest::new(upload("scan.pdf", 5))
            .with_ranges("4-5,1-1")
            .with_recombine(true);

        let artifact = service().split(request).await.unwrap();

        assert_eq!(artifact.content_type, PDF_CONTENT_TYPE);
        assert_eq!(artifact.file_name, "scan-recombined.pdf");
        assert_eq!(page_labels(&artifact.bytes), vec!["Page 4", "Page 5", "Page 1"]);
    }

    #[tokio::test]
    async fn bad_range_fails_before_any_output() {
        let request = SplitRequest::new(upload("a.pdf", 4)).with_ranges("5-99");

        let err = service().split(request).await.unwrap_err();

        assert!(matches!(
            err,
            PagewerkError::RangeFormat {
                reason: RangeErrorReason::BeyondLastPage { total: 4 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn corrupt_upload_is_a_decode_error() {
        let request = SplitRequest::new(UploadedFile::new("bad.pdf", b"%PDF-garbage".to_vec()));
        let err = service().split(request).await.unwrap_err();
        assert!(matches!(err, PagewerkError::Decode(_)));
    }

    #[tokio::test]
    async fn merge_concatenates_in_upload_order() {
        let request = MergeRequest::new(vec![upload("a.pdf", 2), upload("b.pdf", 1)]);

        let artifact = service().merge(request).await.unwrap();

        assert_eq!(artifact.file_name, "merged.pdf");
        assert_eq!(page_labels(&artifact.bytes), vec!["Page 1", "Page 2", "Page 1"]);
    }

    #[tokio::test]
    async fn merge_uses_requested_name() {
        let request = MergeRequest::new(vec![upload("a.pdf", 1)]).with_output_name("bundle.pdf");
        let artifact = service().merge(request).await.unwrap();
        assert_eq!(artifact.file_name, "bundle.pdf");
    }

    #[tokio::test]
    async fn empty_merge_is_rejected() {
        let err = service().merge(MergeRequest::default()).await.unwrap_err();
        assert!(matches!(err, PagewerkError::EmptyMergeSet));
    }

    #[tokio::test]
    async fn ocr_without_provider_is_not_configured() {
        let err = service()
            .recognize(OcrRequest::new(upload("a.pdf", 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, PagewerkError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn ocr_results_come_back_in_page_order() {
        let pages = (0..3)
            .rev()
            .map(|index| OcrPageResult {
                index,
                markdown: format!("page {index}"),
                images: Vec::new(),
                dimensions: None,
            })
            .collect();
        let orchestrator = OcrOrchestrator::new(
            Arc::new(MockProvider::returning(pages)),
            RecognitionSettings {
                model: "test-model".into(),
                include_images: false,
            },
        );
        let service = TransformService::new(LimitsConfig::default(), Some(orchestrator));

        let results = service
            .recognize(OcrRequest::new(upload("scan.pdf", 3)))
            .await
            .unwrap();

        let indices: Vec<usize> = results.iter().map(|page| page.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_unchanged() {
        let orchestrator = OcrOrchestrator::new(
            Arc::new(MockProvider::returning(Vec::new()).failing_at(ProviderStage::SignUrl)),
            RecognitionSettings {
                model: "test-model".into(),
                include_images: true,
            },
        );
        let service = TransformService::new(LimitsConfig::default(), Some(orchestrator));

        let err = service
            .recognize(OcrRequest::new(upload("scan.pdf", 1)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PagewerkError::Provider { stage: ProviderStage::SignUrl, .. }
        ));
    }
}
