// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: decoding uploads and assembling new documents from their pages.

pub mod codec;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use codec::{CopiedPage, Document, DocumentBuilder, SourcePdf};
