// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-document: page-level PDF transforms for Pagewerk.
//
// Parses page-range expressions, splits a PDF into one document per range,
// merges PDFs in order, and packages several outputs into a zip archive.

pub mod archive;
pub mod integrity;
pub mod merge;
pub mod naming;
pub mod pdf;
pub mod range;
pub mod split;

// Re-export the primary types so callers can use `pagewerk_document::Document` etc.
pub use archive::{ArchiveBuilder, ArchiveEntry};
pub use merge::merge;
pub use pdf::{Document, DocumentBuilder, SourcePdf};
pub use range::{PageRange, RangeSet};
pub use split::{SplitPart, split};
