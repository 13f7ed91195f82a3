pub mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state. The pipeline is built once at startup and
/// shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, config: Config) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

/// Auth middleware: checks Bearer token on all routes except /health and /.
async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if path == "/" || path == "/health" {
        return next.run(request).await;
    }

    let Some(expected) = state.config.auth_token.as_deref() else {
        return next.run(request).await;
    };

    let authenticated = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|auth| auth.strip_prefix("Bearer ") == Some(expected));

    if !authenticated {
        return (
            axum::http::StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "ok": false, "error": "Unauthorized" })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Full application: routes plus auth, CORS and body limit layers.
pub fn app(state: AppState) -> Router {
    let origins: Vec<axum::http::HeaderValue> = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(86400));

    // base64 payloads are ~4/3 of the raw upload, plus the JSON envelope
    let body_limit = state.config.max_upload_bytes / 3 * 4 + 64 * 1024;

    Router::new()
        .merge(routes::router(state.clone()))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit))
}

pub async fn serve(cfg: Config, pipeline: Arc<Pipeline>, port: u16) -> Result<()> {
    let state = AppState::new(pipeline, cfg);
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tracing::info!("HTTP API listening on http://localhost:{port}");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
