// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-ocr: recognition jobs against an external OCR provider.
//
// The orchestrator drives one job per document through upload, URL signing
// and recognition, and hands back per-page results in source page order. The
// provider is injected, so the HTTP client is only one implementation.

pub mod mistral;
pub mod orchestrator;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use mistral::MistralProvider;
pub use orchestrator::{OcrJob, OcrJobStatus, OcrOrchestrator};
pub use provider::RecognitionProvider;
pub use types::{OcrPageResult, RecognitionSettings};
