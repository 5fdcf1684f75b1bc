//! Generic content API: pages, images and documents.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::pagination::{Listing, ListingParams};
use crate::db::PageFilter;
use crate::errors::AppError;
use crate::projection::{DocumentView, ImageView, PageView};
use crate::registry::registry;
use crate::AppState;

/// Query parameters of the page listing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageListingQuery {
    #[serde(rename = "type")]
    pub page_type: Option<String>,
    pub child_of: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageListingQuery {
    fn listing(&self) -> ListingParams {
        ListingParams {
            limit: self.limit.clone(),
            offset: self.offset.clone(),
        }
    }
}

/// Query parameters of the image and document listings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaListingQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl From<MediaListingQuery> for ListingParams {
    fn from(query: MediaListingQuery) -> Self {
        ListingParams {
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// GET /api/v2/pages/
pub async fn list_pages(
    State(state): State<AppState>,
    query: Result<Query<PageListingQuery>, QueryRejection>,
) -> Result<Json<Listing<PageView>>, AppError> {
    let Query(params) = query?;

    let page_type = params
        .page_type
        .as_deref()
        .map(|name| registry().page_type_named(name))
        .transpose()?;

    let child_of = match params.child_of.as_deref() {
        None => None,
        Some(raw) => {
            let id = raw
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| AppError::BadRequest("child_of must be a positive integer".to_string()))?;
            if state.repo.get_page(id).await?.is_none() {
                return Err(AppError::BadRequest("parent page doesn't exist".to_string()));
            }
            Some(id)
        }
    };

    let pages = state
        .repo
        .list_pages(&PageFilter {
            page_type,
            child_of,
            live_only: true,
        })
        .await?;

    let listing = params.listing().window(pages)?;
    let items = listing.items.iter().map(|p| state.projector.page_summary(p)).collect();
    Ok(Json(listing.with_items(items)))
}

/// GET /api/v2/pages/{id}/
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PageView>, AppError> {
    let page = state
        .repo
        .get_page(id)
        .await?
        .filter(|p| p.meta.live)
        .ok_or_else(|| AppError::not_found("Page", id))?;

    Ok(Json(state.projector.page_detail(&page).await?))
}

/// GET /api/v2/images/
pub async fn list_images(
    State(state): State<AppState>,
    query: Result<Query<MediaListingQuery>, QueryRejection>,
) -> Result<Json<Listing<ImageView>>, AppError> {
    let Query(params) = query?;

    let listing = ListingParams::from(params).window(state.repo.list_images().await?)?;
    let items = listing.items.iter().map(|i| state.projector.image(i)).collect();
    Ok(Json(listing.with_items(items)))
}

/// GET /api/v2/images/{id}/
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ImageView>, AppError> {
    let image = state
        .repo
        .get_image(id)
        .await?
        .ok_or_else(|| AppError::not_found("Image", id))?;

    Ok(Json(state.projector.image_detail(&image).await?))
}

/// GET /api/v2/documents/
pub async fn list_documents(
    State(state): State<AppState>,
    query: Result<Query<MediaListingQuery>, QueryRejection>,
) -> Result<Json<Listing<DocumentView>>, AppError> {
    let Query(params) = query?;

    let listing = ListingParams::from(params).window(state.repo.list_documents().await?)?;
    let items = listing.items.iter().map(|d| state.projector.document(d)).collect();
    Ok(Json(listing.with_items(items)))
}

/// GET /api/v2/documents/{id}/
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentView>, AppError> {
    let document = state
        .repo
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::not_found("Document", id))?;

    Ok(Json(state.projector.document(&document)))
}
