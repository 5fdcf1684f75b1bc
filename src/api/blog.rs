//! Blog endpoints: index listings, tag filtering and post detail.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::pagination::{Listing, ListingParams};
use crate::errors::AppError;
use crate::models::PageType;
use crate::projection::PageView;
use crate::tagging;
use crate::AppState;

/// Query parameters of the tag listing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagListingQuery {
    pub tag: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /api/blog/indexes/{id}/posts/ - Live posts under a blog index, newest first.
pub async fn list_index_posts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<Listing<PageView>>, AppError> {
    let Query(listing) = query?;

    let index = state
        .repo
        .get_page(id)
        .await?
        .filter(|p| p.meta.page_type == PageType::BlogIndex && p.meta.live)
        .ok_or_else(|| AppError::not_found("Blog index", id))?;

    let posts = listing.window(state.repo.live_blog_posts(Some(index.meta.id)).await?)?;
    let items = state.projector.page_details(&posts.items).await?;
    Ok(Json(posts.with_items(items)))
}

/// GET /api/blog/tags/?tag= - Live posts carrying a tag, or all of them.
pub async fn list_tagged_posts(
    State(state): State<AppState>,
    query: Result<Query<TagListingQuery>, QueryRejection>,
) -> Result<Json<Listing<PageView>>, AppError> {
    let Query(params) = query?;
    let listing = ListingParams {
        limit: params.limit,
        offset: params.offset,
    };

    let posts = listing.window(tagging::posts_tagged(&state.repo, params.tag.as_deref()).await?)?;
    let items = state.projector.page_details(&posts.items).await?;
    Ok(Json(posts.with_items(items)))
}

/// GET /api/blog/posts/{id}/
pub async fn get_blog_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PageView>, AppError> {
    let post = state
        .repo
        .get_page(id)
        .await?
        .filter(|p| p.meta.page_type == PageType::Blog && p.meta.live)
        .ok_or_else(|| AppError::not_found("Blog post", id))?;

    Ok(Json(state.projector.page_detail(&post).await?))
}
