// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge engine: concatenate documents into one, in input order.

use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, info, instrument};

use crate::pdf::{Document, DocumentBuilder, SourcePdf};

/// Concatenate `documents` into a single document.
///
/// Pages keep their intra-document order and documents keep input order.
/// The output page count is the sum of the input page counts.
///
/// # Errors
///
/// [`PagewerkError::EmptyMergeSet`] when `documents` is empty, before any
/// output is produced.
#[instrument(skip_all, fields(inputs = documents.len()))]
pub fn merge(documents: &[Document]) -> Result<Document> {
    if documents.is_empty() {
        return Err(PagewerkError::EmptyMergeSet);
    }

    let mut builder = DocumentBuilder::new();
    for (position, document) in documents.iter().enumerate() {
        let source = SourcePdf::open(document)?;
        let indices: Vec<usize> = (0..source.page_count()).collect();
        builder.append_from(&source, &indices)?;
        debug!(
            position,
            fingerprint = %document.fingerprint(),
            pages = indices.len(),
            "Appended document"
        );
    }

    let page_count = builder.page_count();
    let bytes = builder.finish()?;
    info!(page_count, output_bytes = bytes.len(), "Merge complete");
    Ok(Document::assembled(bytes, page_count))
}
