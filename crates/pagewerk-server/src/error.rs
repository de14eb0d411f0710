// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error responses.
//
// Every failure leaves the service as `{ "success": false, "error", "code" }`
// with a status derived from the error kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagewerk_core::error::{ErrorClass, PagewerkError};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

/// A [`PagewerkError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub PagewerkError);

impl From<PagewerkError> for ApiError {
    fn from(err: PagewerkError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            PagewerkError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PagewerkError::Provider { .. } => StatusCode::BAD_GATEWAY,
            PagewerkError::ProviderNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            err => match err.class() {
                ErrorClass::Client => StatusCode::BAD_REQUEST,
                ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.0.code();
        match self.0.class() {
            ErrorClass::Client => warn!(%status, code, error = %self.0, "Request rejected"),
            ErrorClass::Server => error!(%status, code, error = %self.0, "Request failed"),
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.0.to_string(),
            code,
        });
        (status, body).into_response()
    }
}
