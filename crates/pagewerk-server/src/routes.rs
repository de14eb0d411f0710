// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
// Endpoints:
// - GET  /        liveness text
// - GET  /health  JSON status
// - POST /split   multipart `pdf` + optional `pageRanges`, `fileName`, `recombine`
// - POST /merge   multipart repeated `pdfs` + optional `fileName`
// - POST /ocr     multipart `pdf`; JSON array of page results

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pagewerk_core::types::OutputArtifact;
use pagewerk_ocr::OcrPageResult;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    ocr_enabled: bool,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.limits().max_body_bytes();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/split", post(split_pdf))
        .route("/merge", post(merge_pdfs))
        .route("/ocr", post(ocr_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Pagewerk PDF service is running"
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        ocr_enabled: state.transform().ocr_enabled(),
    })
}

async fn split_pdf(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let request = upload::split_request(multipart, state.limits()).await?;
    let artifact = state.transform().split(request).await?;
    info!(file_name = %artifact.file_name, bytes = artifact.bytes.len(), "Split response ready");
    Ok(attachment(artifact))
}

async fn merge_pdfs(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let request = upload::merge_request(multipart, state.limits()).await?;
    let artifact = state.transform().merge(request).await?;
    info!(file_name = %artifact.file_name, bytes = artifact.bytes.len(), "Merge response ready");
    Ok(attachment(artifact))
}

async fn ocr_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<OcrPageResult>>, ApiError> {
    let request = upload::ocr_request(multipart, state.limits()).await?;
    let pages = state.transform().recognize(request).await?;
    Ok(Json(pages))
}

/// Send an artifact as a file download.
fn attachment(artifact: OutputArtifact) -> Response {
    let disposition = HeaderValue::from_str(&artifact.content_disposition())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let content_type = HeaderValue::from_str(&artifact.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
