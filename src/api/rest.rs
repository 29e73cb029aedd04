// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// The UI surface: a static page plus three JSON endpoints under `/api/v1/`.
// Analysis failures are reported inside the `AnalysisReport` body (status
// 200), never as HTTP errors.
//
// CORS is configured permissively so the page can also be served elsewhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::sheets::SheetBackend;
use crate::symbols::{resolve_symbol, select_default};

const INDEX_HTML: &str = include_str!("../../static/index.html");

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware and shared state.
pub fn router<B>(state: Arc<AppState<B>>) -> Router
where
    B: SheetBackend + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols::<B>))
        .route("/api/v1/analyze", post(analyze::<B>))
        .layer(cors)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Symbols
// =============================================================================

#[derive(Serialize)]
struct SymbolsResponse<'a> {
    tickers: &'a [String],
    default: Option<&'a str>,
}

async fn symbols<B: SheetBackend>(State(state): State<Arc<AppState<B>>>) -> impl IntoResponse {
    Json(SymbolsResponse { tickers: &state.tickers, default: state.default_ticker() })
        .into_response()
}

// =============================================================================
// Analyze
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    /// Free-text ticker; wins over `selected` when non-blank.
    #[serde(default)]
    typed: Option<String>,
    /// Dropdown choice; must be one of the configured tickers.
    #[serde(default)]
    selected: Option<String>,
}

async fn analyze<B: SheetBackend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let Some(default) = select_default(req.selected.as_deref(), &state.tickers) else {
        let body = serde_json::json!({ "error": "no tickers configured" });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    };
    let symbol = resolve_symbol(req.typed.as_deref(), default);
    info!(symbol = %symbol, typed = ?req.typed, "analysis requested");

    let report = state.analyzer.analyze(&symbol).await;
    Json(report).into_response()
}
