//! Search API endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::search::SearchHit;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Deepest result offset a search may start from.
const MAX_SEARCH_OFFSET: usize = 10_000;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub kind: &'static str,
    pub id: i64,
    pub title: String,
    pub url: String,
    pub score: f32,
}

impl From<SearchHit> for SearchResultItem {
    fn from(hit: SearchHit) -> Self {
        Self {
            kind: hit.kind.as_str(),
            id: hit.object_id,
            title: hit.title,
            url: hit.url,
            score: hit.score,
        }
    }
}

/// GET /api/search/ - Full-text search over live pages and team members.
pub async fn search_content(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) = query?;
    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    if params.offset > MAX_SEARCH_OFFSET {
        return Err(AppError::BadRequest(format!(
            "offset cannot be higher than {}",
            MAX_SEARCH_OFFSET
        )));
    }

    let (hits, total) = state.search.search(&params.q, limit, params.offset)?;

    Ok(Json(SearchResponse {
        results: hits.into_iter().map(SearchResultItem::from).collect(),
        total,
        limit,
        offset: params.offset,
    }))
}
