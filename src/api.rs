//! HTTP surface for the knowledge-base server.
//!
//! This module exposes a compact Axum router over the pipeline:
//!
//! - `POST /documents` – Upload a document (filename + content), chunk and index it.
//! - `POST /documents/batch` – Upload several documents; one failure does not abort the rest.
//! - `POST /search` – Similarity search with optional document filter and threshold.
//! - `POST /qa/ask` – Extractive question answering over retrieved chunks.
//! - `POST /qa/completeness` – Topic coverage analysis with recommendations.
//! - `GET /documents` – List stored documents.
//! - `DELETE /documents/{id}` – Remove a document's chunks (idempotent).
//! - `PUT /documents/{id}` – Replace a document (delete, then re-index).
//! - `GET /status` – Index statistics.
//! - `GET /metrics` – Activity counters for observability.
//!
//! Handlers validate and delegate only; all pipeline behavior lives in the services.

use crate::processing::{
    ExtractError, ProcessingApi, ProcessingError, SearchError, SearchOptions,
};
use crate::qa::QaApi;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handler state: the processing pipeline and the QA layer.
pub struct AppState<S, Q> {
    processing: Arc<S>,
    qa: Arc<Q>,
}

impl<S, Q> Clone for AppState<S, Q> {
    fn clone(&self) -> Self {
        Self {
            processing: Arc::clone(&self.processing),
            qa: Arc::clone(&self.qa),
        }
    }
}

/// Build the HTTP router exposing the knowledge-base API surface.
pub fn create_router<S, Q>(processing: Arc<S>, qa: Arc<Q>) -> Router
where
    S: ProcessingApi + 'static,
    Q: QaApi + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<S, Q>).post(upload_document::<S, Q>),
        )
        .route("/documents/batch", post(upload_batch::<S, Q>))
        .route(
            "/documents/:document_id",
            axum::routing::delete(delete_document::<S, Q>).put(update_document::<S, Q>),
        )
        .route("/search", post(search::<S, Q>))
        .route("/qa/ask", post(ask_question::<S, Q>))
        .route("/qa/completeness", post(check_completeness::<S, Q>))
        .route("/status", get(index_status::<S, Q>))
        .route("/metrics", get(get_metrics::<S, Q>))
        .with_state(AppState { processing, qa })
}

/// Request body for document upload.
#[derive(Deserialize)]
struct UploadRequest {
    /// Original filename; its extension selects the extractor.
    filename: String,
    /// Raw document content.
    content: String,
}

/// Success response for a single upload.
#[derive(Serialize)]
struct UploadResponse {
    document_id: String,
    filename: String,
    status: &'static str,
    chunks_added: usize,
}

async fn upload_document<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let outcome = state
        .processing
        .index_document(&request.filename, request.content.as_bytes())
        .await?;
    tracing::info!(
        filename = %request.filename,
        document_id = %outcome.document_id,
        chunks = outcome.chunks_added,
        "Upload completed"
    );
    Ok(Json(UploadResponse {
        document_id: outcome.document_id,
        filename: request.filename,
        status: "success",
        chunks_added: outcome.chunks_added,
    }))
}

/// Per-file entry in a batch upload response.
#[derive(Serialize)]
struct BatchUploadEntry {
    filename: String,
    status: &'static str,
    document_id: Option<String>,
    chunks_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Upload several documents in one call.
///
/// Files are processed in order; a failing file is reported in place and the loop continues
/// with the remaining files.
async fn upload_batch<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(requests): Json<Vec<UploadRequest>>,
) -> Json<Vec<BatchUploadEntry>>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let mut entries = Vec::with_capacity(requests.len());

    for request in requests {
        match state
            .processing
            .index_document(&request.filename, request.content.as_bytes())
            .await
        {
            Ok(outcome) => entries.push(BatchUploadEntry {
                filename: request.filename,
                status: "success",
                document_id: Some(outcome.document_id),
                chunks_added: outcome.chunks_added,
                error: None,
            }),
            Err(error) => {
                tracing::warn!(filename = %request.filename, error = %error, "Batch upload entry failed");
                entries.push(BatchUploadEntry {
                    filename: request.filename,
                    status: "failed",
                    document_id: None,
                    chunks_added: 0,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    Json(entries)
}

/// Request body for `POST /search`.
#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    document_ids: Option<Vec<String>>,
    #[serde(default)]
    similarity_threshold: Option<f32>,
}

async fn search<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<crate::processing::SearchResult>>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let results = state
        .processing
        .search(SearchOptions {
            query: request.query,
            max_results: request.max_results,
            document_ids: request.document_ids,
            similarity_threshold: request.similarity_threshold,
        })
        .await?;
    Ok(Json(results))
}

/// Request body for `POST /qa/ask`.
#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
    #[serde(default)]
    max_results: Option<usize>,
}

async fn ask_question<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<crate::qa::AnswerResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let response = state
        .qa
        .answer_question(&request.question, request.max_results)
        .await?;
    Ok(Json(response))
}

/// Request body for `POST /qa/completeness`.
#[derive(Deserialize)]
struct CompletenessRequest {
    topics: Vec<String>,
    #[serde(default)]
    document_ids: Option<Vec<String>>,
}

async fn check_completeness<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(request): Json<CompletenessRequest>,
) -> Result<Json<crate::qa::CompletenessResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let response = state
        .qa
        .check_completeness(&request.topics, request.document_ids)
        .await?;
    Ok(Json(response))
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentListResponse {
    total_documents: usize,
    documents: Vec<crate::processing::DocumentSummary>,
}

async fn list_documents<S, Q>(
    State(state): State<AppState<S, Q>>,
) -> Result<Json<DocumentListResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let documents = state.processing.list_documents().await?;
    Ok(Json(DocumentListResponse {
        total_documents: documents.len(),
        documents,
    }))
}

/// Response body for `DELETE /documents/{id}`.
#[derive(Serialize)]
struct DeleteResponse {
    document_id: String,
    status: &'static str,
    chunks_deleted: usize,
}

async fn delete_document<S, Q>(
    State(state): State<AppState<S, Q>>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let outcome = state.processing.delete_document(&document_id).await?;
    Ok(Json(DeleteResponse {
        status: outcome.status(),
        document_id: outcome.document_id,
        chunks_deleted: outcome.chunks_deleted,
    }))
}

async fn update_document<S, Q>(
    State(state): State<AppState<S, Q>>,
    Path(document_id): Path<String>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let outcome = state
        .processing
        .update_document(&document_id, &request.filename, request.content.as_bytes())
        .await?;
    Ok(Json(UploadResponse {
        document_id: outcome.document_id,
        filename: request.filename,
        status: "success",
        chunks_added: outcome.chunks_added,
    }))
}

async fn index_status<S, Q>(
    State(state): State<AppState<S, Q>>,
) -> Result<Json<crate::processing::IndexStats>, AppError>
where
    S: ProcessingApi,
    Q: QaApi,
{
    let stats = state.processing.stats().await?;
    Ok(Json(stats))
}

async fn get_metrics<S, Q>(
    State(state): State<AppState<S, Q>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: ProcessingApi,
    Q: QaApi,
{
    Json(state.processing.metrics_snapshot())
}

enum AppError {
    Processing(ProcessingError),
    Search(SearchError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Processing(ProcessingError::Extract(ExtractError::UnsupportedFormat(_))) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Processing(ProcessingError::Extract(_))
            | Self::Processing(ProcessingError::EmptyBatch)
            | Self::Processing(ProcessingError::Chunking(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Processing(error) => error.to_string(),
            Self::Search(error) => error.to_string(),
        };
        (status, message).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<SearchError> for AppError {
    fn from(inner: SearchError) -> Self {
        Self::Search(inner)
    }
}
