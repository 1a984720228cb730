//! HTTP request boundary.
//!
//! - `POST /api/generate`: multipart form, one generation
//! - `POST /api/batch`: same fields plus `batchPosts`, one reply per post
//! - `GET  /health`: server status
//!
//! Errors are JSON `{error}` with a non-2xx status. Generation is blocking
//! and runs on tokio's blocking pool.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::batch::{BatchOrchestrator, GenerationResult, SharedContext, parse_batch};
use crate::config::QuillConfig;
use crate::error::{ErrorKind, QuillError};
use crate::generate::{GenerationForm, Generator};
use crate::ingest::UploadedResource;

/// Shared by every handler.
#[derive(Debug)]
pub struct AppState {
    config: QuillConfig,
    generator: Generator,
}

impl AppState {
    pub fn new(config: QuillConfig, generator: Generator) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }
}

/// A failed request: status plus the message shown to the user.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        let status = match err.kind() {
            ErrorKind::InputShape => StatusCode::BAD_REQUEST,
            ErrorKind::Boundary => StatusCode::BAD_GATEWAY,
            ErrorKind::Normalization | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, error = %self.message, "request failed");
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

// ── Response types ────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    model: String,
    pdf_mode: String,
}

#[derive(Serialize)]
struct GenerateResponse {
    content: String,
    #[serde(rename = "type")]
    request_type: String,
}

#[derive(Serialize)]
struct BatchItemResponse {
    name: String,
    post: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<GenerationResult> for BatchItemResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            response: result.output_text().map(str::to_string),
            error: result.failure_reason().map(str::to_string),
            name: result.display_name,
            post: result.input_echo,
        }
    }
}

#[derive(Serialize)]
struct BatchResponse {
    results: Vec<BatchItemResponse>,
    total: usize,
    failed: usize,
}

// ── Form parsing ──────────────────────────────────────────────────────────

/// Multipart fields, plus the raw batch text when present.
async fn read_form(mut multipart: Multipart) -> Result<(GenerationForm, Option<String>), ApiError> {
    let mut form = GenerationForm::default();
    let mut batch_posts = None;

    let multipart_err = |e: axum::extract::multipart::MultipartError| {
        ApiError::new(e.status(), e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_err)?;
            tracing::debug!(file = %filename, %content_type, size = bytes.len(), "received upload");
            form.files
                .push(UploadedResource::new(filename, content_type, bytes.to_vec()));
            continue;
        }

        let value = field.text().await.map_err(multipart_err)?;
        match name.as_str() {
            "type" => form.request_type = value,
            "context" => form.context = value,
            "additionalInstructions" => form.additional_instructions = value,
            "pageCount" => form.page_count = Some(value),
            "discussionPost" => form.discussion_post = Some(value),
            "fileSources" => form.file_sources = Some(value),
            "aiModel" => form.model = Some(value),
            "batchPosts" => batch_posts = Some(value),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok((form, batch_posts))
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, QuillError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("generation task failed: {e}"),
            )
        })?
        .map_err(ApiError::from)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.generator.invoker().model().to_string(),
        pdf_mode: state.generator.normalizer().config().pdf_mode.to_string(),
    })
}

async fn generate(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, ApiError> {
    let (form, _) = read_form(multipart).await?;
    let request = form.into_request()?;
    tracing::info!(
        request_type = %request.request_type,
        files = request.resources.len(),
        "generation requested"
    );

    let output = run_blocking(move || state.generator.generate(&request)).await?;
    Ok(Json(GenerateResponse {
        content: output.content,
        request_type: output.request_type.to_string(),
    }))
}

async fn batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchResponse>, ApiError> {
    let (mut form, batch_posts) = read_form(multipart).await?;
    let items = parse_batch(batch_posts.as_deref().unwrap_or_default());
    let shared = SharedContext {
        resources: form.take_resources(),
        context: form.context,
        additional_instructions: form.additional_instructions,
        model: form.model,
    };
    tracing::info!(items = items.len(), files = shared.resources.len(), "batch requested");

    let results = run_blocking(move || {
        Ok(BatchOrchestrator::new(&state.generator).run_all(&items, &shared, |event| {
            tracing::debug!(processed = event.processed, total = event.total, "batch progress");
        }))
    })
    .await?;

    let total = results.len();
    let failed = results.iter().filter(|r| r.is_failure()).count();
    Ok(Json(BatchResponse {
        results: results.into_iter().map(BatchItemResponse::from).collect(),
        total,
        failed,
    }))
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state.config().server.max_upload_bytes();
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/batch", post(batch))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
