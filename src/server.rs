//! JSON HTTP API over the validator and the knowledge base.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Version and knowledge load status |
//! | `POST` | `/tools/validate` | Validate a script |
//! | `POST` | `/tools/search` | Retrieve passages for a query |
//! | `POST` | `/tools/context` | Validate + retrieve for a workbench run |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "knowledge_unavailable", "message": "reference document 'AUTOMATER7' unavailable: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `knowledge_unavailable` (503).
//!
//! The knowledge base is loaded in the background at start-up. If that
//! fails, the next retrieval request retries the load.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::knowledge::{KnowledgeBase, KnowledgeError};
use crate::models::{AutomationMode, ValidationIssue};
use crate::query::{assemble_context, ContextBundle, ContextRequest};
use crate::rank::CorpusStats;
use crate::validate::{validate_automation, ValidateOptions};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    knowledge: Arc<KnowledgeBase>,
}

/// Starts the HTTP server on `[server].bind`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let knowledge = Arc::new(KnowledgeBase::new(config));
    let bind_addr = config.server.bind.clone();

    let warm = knowledge.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.ensure_loaded().await {
            warn!(error = %e, "knowledge warm-up failed; will retry on first retrieval");
        }
    });

    let state = AppState {
        config: Arc::new(config.clone()),
        knowledge,
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/validate", post(handle_validate))
        .route("/tools/search", post(handle_search))
        .route("/tools/context", post(handle_context))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<KnowledgeError> for AppError {
    fn from(err: KnowledgeError) -> Self {
        warn!(source = err.source_tag(), error = %err, "retrieval failed");
        AppError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "knowledge_unavailable".to_string(),
            message: err.to_string(),
        }
    }
}

fn resolve_limit(limit: Option<usize>, config: &Config) -> Result<usize, AppError> {
    match limit {
        Some(0) => Err(bad_request("limit must be >= 1")),
        Some(n) => Ok(n),
        None => Ok(config.retrieval.max_chunks),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    knowledge: Option<CorpusStats>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge: state.knowledge.loaded().map(|c| c.stats()),
    })
}

// ============ POST /tools/validate ============

#[derive(Deserialize)]
struct ValidateRequest {
    script: String,
    #[serde(default)]
    mode: AutomationMode,
    #[serde(default)]
    allow_empty: Option<bool>,
}

#[derive(Serialize)]
struct ValidateResponse {
    issues: Vec<ValidationIssue>,
}

async fn handle_validate(Json(req): Json<ValidateRequest>) -> Json<ValidateResponse> {
    let mut options = ValidateOptions::for_mode(req.mode, &req.script);
    if let Some(allow) = req.allow_empty {
        options.allow_empty = allow;
    }
    Json(ValidateResponse {
        issues: validate_automation(&req.script, &options),
    })
}

// ============ POST /tools/search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    passages: Vec<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = resolve_limit(req.limit, &state.config)?;
    let passages = state.knowledge.retrieve(&req.query, limit).await?;
    Ok(Json(SearchResponse { passages }))
}

// ============ POST /tools/context ============

#[derive(Deserialize)]
struct ContextCall {
    #[serde(flatten)]
    request: ContextRequest,
    #[serde(default)]
    limit: Option<usize>,
}

async fn handle_context(
    State(state): State<AppState>,
    Json(call): Json<ContextCall>,
) -> Result<Json<ContextBundle>, AppError> {
    let limit = resolve_limit(call.limit, &state.config)?;
    let bundle = assemble_context(&state.knowledge, &call.request, limit).await?;
    Ok(Json(bundle))
}
