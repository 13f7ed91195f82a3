use axum::{
    Router,
    extract::{Json, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::Instrument;

use super::AppState;
use crate::error::CoreError;
use crate::evaluate::{self, Metric, ScoreTable};
use crate::extract::{self, DocumentKind};
use crate::model::models;
use crate::pipeline::Summary;
use crate::validation::{decode_upload, resolve_lengths, sanitize_error};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/models", get(list_models))
        .route("/v1/summarize", post(summarize))
        .route("/v1/summarize/download", post(summarize_download))
        .route("/v1/score", post(score))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "service": "condense",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let opts = state.pipeline.options();
    Json(json!({
        "service": "condense",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.model,
        "backend": state.config.backend.to_string(),
        "summarizer": state.pipeline.summarizer_name(),
        "tokenizer": state.pipeline.tokenizer_name(),
        "token_budget": opts.token_budget,
        "chunk_word_limit": opts.chunk_word_limit,
        "chunk_strategy": opts.strategy.to_string(),
        "coverage": opts.coverage.to_string(),
        "lengths": state.config.lengths,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let list: Vec<Value> = models::MODELS
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "name": m.name,
                "token_budget": m.token_budget,
                "size_mb": m.size_mb,
                "description": m.description,
                "current": m.id == state.config.model,
            })
        })
        .collect();
    Json(json!({ "ok": true, "models": list }))
}

fn fail(kind: &str, error: impl Into<String>) -> Value {
    json!({ "ok": false, "kind": kind, "error": error.into() })
}

fn core_failure(e: &CoreError) -> Value {
    match e {
        CoreError::Summarizer { .. } => {
            tracing::warn!("{e}");
            fail(e.kind(), sanitize_error(e))
        }
        _ => fail(e.kind(), e.to_string()),
    }
}

fn parse_metric_names(names: &[String]) -> Result<Vec<Metric>, CoreError> {
    names.iter().map(|n| n.parse()).collect()
}

#[derive(Deserialize)]
struct FilePayload {
    name: String,
    #[serde(default)]
    mime: Option<String>,
    /// Base64-encoded file bytes.
    data: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    file: Option<FilePayload>,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    metrics: Vec<String>,
}

struct Outcome {
    summary: Summary,
    scores: Option<ScoreTable>,
}

async fn document_text(state: &AppState, body: &SummarizeRequest) -> Result<String, Value> {
    match (&body.text, &body.file) {
        (Some(text), None) => Ok(text.clone()),
        (None, Some(file)) => {
            let bytes = decode_upload(&file.data, state.config.max_upload_bytes).map_err(|e| fail("input_error", e))?;
            let kind = DocumentKind::detect(&file.name, file.mime.as_deref());
            tracing::info!("Extracting {} ({kind}, {} bytes)", file.name, bytes.len());

            // PDF parsing is CPU-bound
            tokio::task::spawn_blocking(move || extract::extract(&kind, &bytes))
                .await
                .map_err(|e| fail("input_error", format!("Extraction task failed: {e}")))?
                .map_err(|e| fail("input_error", sanitize_error(&e)))
        }
        (Some(_), Some(_)) => Err(fail("input_error", "Send either text or file, not both")),
        (None, None) => Err(fail("input_error", "Missing document: send text or file")),
    }
}

async fn run_summarize(state: &AppState, body: &SummarizeRequest) -> Result<Outcome, Value> {
    let params = resolve_lengths(&state.config.lengths, body.max_length, body.min_length)
        .map_err(|e| fail("input_error", e))?;
    let metrics = parse_metric_names(&body.metrics).map_err(|e| core_failure(&e))?;

    let document = document_text(state, body).await?;
    if document.trim().is_empty() {
        return Err(fail("input_error", "Document is empty"));
    }

    let summary = state
        .pipeline
        .summarize(&document, params)
        .await
        .map_err(|e| core_failure(&e))?;

    let scores = match &body.reference {
        Some(reference) => Some(score_blocking(reference.clone(), summary.text.clone(), metrics).await?),
        None => None,
    };

    Ok(Outcome { summary, scores })
}

async fn summarize(State(state): State<AppState>, Json(body): Json<SummarizeRequest>) -> Json<Value> {
    let span = tracing::info_span!("summarize", request_id = %uuid::Uuid::new_v4());
    match run_summarize(&state, &body).instrument(span).await {
        Ok(Outcome { summary, scores }) => Json(json!({
            "ok": true,
            "summary": summary.text,
            "chunks": summary.chunks,
            "token_count": summary.token_count,
            "truncated": summary.truncated,
            "scores": scores,
        })),
        Err(e) => Json(e),
    }
}

/// Same input as `/v1/summarize`; answers with the summary as a file.
async fn summarize_download(State(state): State<AppState>, Json(body): Json<SummarizeRequest>) -> Response {
    let span = tracing::info_span!("summarize_download", request_id = %uuid::Uuid::new_v4());
    match run_summarize(&state, &body).instrument(span).await {
        Ok(outcome) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"summary.txt\""),
            ],
            outcome.summary.text,
        )
            .into_response(),
        Err(e) => Json(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ScoreRequest {
    reference: String,
    generated: String,
    #[serde(default)]
    metrics: Vec<String>,
}

/// Scores on the blocking pool; LCS time is quadratic in input length.
async fn score_blocking(reference: String, generated: String, metrics: Vec<Metric>) -> Result<ScoreTable, Value> {
    tokio::task::spawn_blocking(move || evaluate::score(&reference, &generated, &metrics))
        .await
        .map_err(|e| fail("input_error", format!("Scoring task failed: {e}")))?
        .map_err(|e| core_failure(&e))
}

async fn score(Json(body): Json<ScoreRequest>) -> Json<Value> {
    let metrics = match parse_metric_names(&body.metrics) {
        Ok(m) => m,
        Err(e) => return Json(core_failure(&e)),
    };
    match score_blocking(body.reference, body.generated, metrics).await {
        Ok(scores) => Json(json!({ "ok": true, "scores": scores })),
        Err(e) => Json(e),
    }
}
