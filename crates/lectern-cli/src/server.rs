//! HTTP request/response boundary: a build endpoint and a query endpoint.
//!
//! Builds hold the index lock exclusively and questions share it, so a question
//! never reads an index this server is in the middle of replacing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lectern_core::{BuildReport, Error, PdfSource, Pipeline, VectorStore};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// Upper bound for one multipart upload.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    index_lock: Arc<RwLock<()>>,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState {
        pipeline,
        index_lock: Arc::new(RwLock::new(())),
    };
    Router::new()
        .route("/api/status", get(status))
        .route("/api/process", post(process))
        .route("/api/ask", post(ask))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn serve(pipeline: Arc<Pipeline>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    println!("Listening on http://{addr}");
    axum::serve(listener, router(pipeline)).await
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    index_dir: String,
    index_ready: bool,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let dir = &state.pipeline.config().index.dir;
    Json(StatusResponse {
        status: lectern_core::status(),
        index_dir: dir.display().to_string(),
        index_ready: VectorStore::exists(dir),
    })
}

/// Every file part of the form is one PDF.
async fn process(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<BuildReport>, ApiError> {
    let mut sources = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(ApiError::bad_request)? {
        let name = field
            .file_name()
            .or_else(|| field.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}.pdf", sources.len() + 1));
        let bytes = field.bytes().await.map_err(ApiError::bad_request)?;
        if !bytes.is_empty() {
            sources.push(PdfSource::new(name, bytes.to_vec()));
        }
    }

    let _guard = state.index_lock.write().await;
    let report = state.pipeline.process(&sources).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct SourceRef {
    source: String,
    index: usize,
    score: f32,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
    unavailable: bool,
    sources: Vec<SourceRef>,
}

async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Result<Json<AskResponse>, ApiError> {
    let _guard = state.index_lock.read().await;
    let answer = state.pipeline.ask(&req.question).await?;
    Ok(Json(AskResponse {
        unavailable: answer.is_unavailable(),
        sources: answer
            .passages
            .iter()
            .map(|p| SourceRef {
                source: p.chunk.source.clone(),
                index: p.chunk.index,
                score: p.score,
            })
            .collect(),
        answer: answer.text,
    }))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(e: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: e.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::IndexNotFound(_) => StatusCode::NOT_FOUND,
            Error::Extraction { .. } | Error::NoDocuments | Error::EmptyQuestion => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::IndexBuild(_) | Error::AnswerGeneration(_) => StatusCode::BAD_GATEWAY,
            Error::Retrieval(_) | Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(kind = e.kind(), "{e}");
        }
        Self {
            status,
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}
