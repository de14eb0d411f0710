// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared handler state. Read-only after startup.

use std::sync::Arc;

use pagewerk_core::config::LimitsConfig;

use crate::services::transform::TransformService;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<TransformService>,
}

impl AppState {
    pub fn new(service: TransformService) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    pub fn transform(&self) -> &TransformService {
        &self.inner
    }

    pub fn limits(&self) -> &LimitsConfig {
        self.inner.limits()
    }
}
