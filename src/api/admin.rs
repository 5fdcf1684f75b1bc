//! Administrative endpoints, guarded by the PSK middleware.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::search::{self, SearchDocument, SearchKind};
use crate::seed::{self, SeedReport};
use crate::AppState;

/// POST /api/admin/seed/team - Create the sample departments and members.
pub async fn seed_team(State(state): State<AppState>) -> Result<Json<SeedReport>, AppError> {
    let report = seed::seed_sample_team(&state.repo).await?;

    for member in &report.created {
        state
            .search
            .index_document(&SearchDocument::from_member(member))
            .await?;
    }

    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub indexed: usize,
}

/// POST /api/admin/search/rebuild - Rebuild the search index from the database.
pub async fn rebuild_search(State(state): State<AppState>) -> Result<Json<RebuildResponse>, AppError> {
    let indexed = search::rebuild_from(&state.repo, &state.search).await?;
    Ok(Json(RebuildResponse { indexed }))
}

/// DELETE /api/admin/departments/{id}
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_department(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/pages/{id} - Delete a page and everything below it.
pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let subtree = state.repo.page_subtree_ids(id).await?;
    state.repo.delete_page(id).await?;

    if let Err(e) = state.search.remove(SearchKind::Page, &subtree).await {
        tracing::error!("Failed to drop deleted pages from search index: {:?}", e);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/images/{id}
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_image(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
