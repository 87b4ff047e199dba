use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{CatalogItem, RecommendationResponse},
    services::catalog_search::lookup_books,
};

#[derive(Debug, Deserialize)]
pub struct BookSearchParams {
    #[serde(default)]
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookSearchResponse {
    pub items: Vec<CatalogItem>,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personalized recommendations for the stored library
///
/// Only a pipeline failure that survived the heuristic retry reaches the
/// error branch; its details stay in the logs.
pub async fn recommendations(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
) -> AppResult<Json<RecommendationResponse>> {
    let response = state.recommender.recommend().await.map_err(|e| {
        let request_id = request_id.map(|Extension(id)| id.to_string());
        tracing::error!(
            request_id = request_id.as_deref().unwrap_or("unknown"),
            error = %e,
            "Failed to fetch recommendations"
        );
        AppError::RecommendationsUnavailable
    })?;

    Ok(Json(response))
}

/// Catalog lookup for the "add book" form
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<BookSearchParams>,
) -> Json<BookSearchResponse> {
    let items = lookup_books(
        state.catalog.as_ref(),
        state.fallback_catalog.as_deref(),
        &params.query,
        params.limit,
    )
    .await;

    tracing::info!(query = %params.query, results = items.len(), "Book search completed");

    Json(BookSearchResponse { items })
}
