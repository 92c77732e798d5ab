use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::constants::{DEFAULT_DISCOVERY_LIMIT, DEFAULT_SEARCH_LIMIT};
use crate::models::{AnalysisResult, ForumSummary};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/search-subreddits", post(search_subreddits))
        .route("/health", get(health))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub search_limit: Option<u32>,
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(request) = payload?;
    let limit = request.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let result = state.analyzer.analyze(&request.subreddits, limit).await;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub subreddits: Vec<ForumSummary>,
    pub count: usize,
}

async fn search_subreddits(
    State(state): State<AppState>,
    payload: Result<Json<DiscoverRequest>, JsonRejection>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    let Json(request) = payload?;
    let query = request.query.trim();
    if query.is_empty() {
        return Err(anyhow::anyhow!("query cannot be empty").into());
    }
    let limit = request.limit.unwrap_or(DEFAULT_DISCOVERY_LIMIT);

    let subreddits = state.analyzer.discover(query, limit).await?;
    Ok(Json(DiscoverResponse {
        count: subreddits.len(),
        subreddits,
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
