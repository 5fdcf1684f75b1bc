//! Page tree persistence.
//!
//! Common page columns are stored relationally; type-specific fields are a
//! JSON document in `pages.fields`.

use std::collections::HashMap;

use sqlx::{Row, Sqlite, Transaction};

use super::repository::{format_datetime, now, parse_datetime, placeholders, Repository};
use crate::errors::AppError;
use crate::models::{FaqItem, NewFaqItem, NewPage, Page, PageContent, PageMeta, PageType};
use crate::registry::registry;

const PAGE_COLUMNS: &str = "id, parent_id, page_type, title, slug, url_path, live, first_published_at, last_published_at, fields";

/// Criteria for listing pages.
#[derive(Debug, Clone, Default)]
pub struct PageFilter {
    pub page_type: Option<PageType>,
    pub child_of: Option<i64>,
    pub live_only: bool,
}

impl Repository {
    /// Create a page under `parent_id` (`None` creates a tree root).
    pub async fn create_page(&self, parent_id: Option<i64>, request: &NewPage) -> Result<Page, AppError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_page(&mut tx, parent_id, request).await?;
        tx.commit().await?;

        self.get_page(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Page {} vanished", id)))
    }

    pub async fn get_page(&self, id: i64) -> Result<Option<Page>, AppError> {
        let sql = format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(page_from_row).transpose()
    }

    /// Pages matching `filter`, in tree-insertion order.
    pub async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<Page>, AppError> {
        let mut sql = format!("SELECT {} FROM pages WHERE 1 = 1", PAGE_COLUMNS);
        if filter.page_type.is_some() {
            sql.push_str(" AND page_type = ?");
        }
        if filter.child_of.is_some() {
            sql.push_str(" AND parent_id = ?");
        }
        if filter.live_only {
            sql.push_str(" AND live = 1");
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        if let Some(page_type) = filter.page_type {
            query = query.bind(page_type.as_str());
        }
        if let Some(parent) = filter.child_of {
            query = query.bind(parent);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(page_from_row).collect()
    }

    /// Page metadata for several ids at once; missing ids are skipped.
    pub async fn get_page_metas(&self, ids: &[i64]) -> Result<HashMap<i64, PageMeta>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT {} FROM pages WHERE id IN ({})",
            PAGE_COLUMNS,
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(page_meta_from_row)
            .map(|meta| (meta.id, meta))
            .collect())
    }

    /// Ids of a page and all of its descendants.
    pub async fn page_subtree_ids(&self, id: i64) -> Result<Vec<i64>, AppError> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM pages WHERE id = ?
                UNION ALL
                SELECT p.id FROM pages p JOIN subtree s ON p.parent_id = s.id
            )
            SELECT id FROM subtree ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Delete a page and its whole subtree.
    pub async fn delete_page(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Page", id));
        }

        tracing::info!("Deleted page {} and its descendants", id);
        Ok(())
    }

    // ==================== FAQ ITEMS ====================

    pub async fn add_faq_item(&self, page_id: i64, request: &NewFaqItem) -> Result<FaqItem, AppError> {
        request.validate()?;

        let page = self
            .get_page(page_id)
            .await?
            .ok_or_else(|| AppError::not_found("Page", page_id))?;
        if page.meta.page_type != PageType::Faq {
            return Err(AppError::Validation(format!(
                "Page {} is not a FAQ page",
                page_id
            )));
        }

        let result = sqlx::query(
            "INSERT INTO faq_items (page_id, question, answer, sort_order) VALUES (?, ?, ?, (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM faq_items WHERE page_id = ?))",
        )
        .bind(page_id)
        .bind(&request.question)
        .bind(&request.answer)
        .bind(page_id)
        .execute(&self.pool)
        .await?;

        Ok(FaqItem {
            id: result.last_insert_rowid(),
            question: request.question.clone(),
            answer: request.answer.clone(),
        })
    }

    pub async fn faq_items(&self, page_id: i64) -> Result<Vec<FaqItem>, AppError> {
        let rows = sqlx::query(
            "SELECT id, question, answer FROM faq_items WHERE page_id = ? ORDER BY sort_order, id",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FaqItem {
                id: row.get("id"),
                question: row.get("question"),
                answer: row.get("answer"),
            })
            .collect())
    }
}

/// Insert one page row inside an open transaction. Placement, slug
/// uniqueness among siblings and field validation are checked first.
pub(super) async fn insert_page(
    tx: &mut Transaction<'_, Sqlite>,
    parent_id: Option<i64>,
    request: &NewPage,
) -> Result<i64, AppError> {
    request.validate()?;
    let slug = request.resolved_slug();
    let child_type = request.content.page_type();

    let (parent_type, parent_url) = match parent_id {
        Some(pid) => {
            let row = sqlx::query("SELECT page_type, url_path FROM pages WHERE id = ?")
                .bind(pid)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Parent page {} does not exist", pid)))?;
            let type_name: String = row.get("page_type");
            let url_path: String = row.get("url_path");
            (Some(type_name.parse::<PageType>()?), url_path)
        }
        None => (None, String::new()),
    };

    registry().check_placement(parent_type, child_type)?;

    let sibling = sqlx::query("SELECT id FROM pages WHERE parent_id IS ? AND slug = ?")
        .bind(parent_id)
        .bind(&slug)
        .fetch_optional(&mut **tx)
        .await?;
    if sibling.is_some() {
        return Err(AppError::Validation(format!(
            "The slug '{}' is already in use within the parent page",
            slug
        )));
    }

    let url_path = match parent_id {
        Some(_) => format!("{}{}/", parent_url, slug),
        None => "/".to_string(),
    };

    let published = request.live.then(|| format_datetime(&now()));
    let (page_type, fields) = request.content.to_parts()?;

    let result = sqlx::query(
        "INSERT INTO pages (parent_id, page_type, title, slug, url_path, live, first_published_at, last_published_at, fields) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(parent_id)
    .bind(page_type.as_str())
    .bind(&request.title)
    .bind(&slug)
    .bind(&url_path)
    .bind(request.live as i32)
    .bind(&published)
    .bind(&published)
    .bind(serde_json::to_string(&fields)?)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(super) fn page_meta_from_row(row: &sqlx::sqlite::SqliteRow) -> PageMeta {
    let live: i32 = row.get("live");
    let page_type: String = row.get("page_type");
    let first_published_at: Option<String> = row.get("first_published_at");
    let last_published_at: Option<String> = row.get("last_published_at");

    PageMeta {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        page_type: page_type.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown page type '{}' in database", page_type);
            PageType::Standard
        }),
        title: row.get("title"),
        slug: row.get("slug"),
        url_path: row.get("url_path"),
        live: live != 0,
        first_published_at: first_published_at.as_deref().map(parse_datetime),
        last_published_at: last_published_at.as_deref().map(parse_datetime),
    }
}

pub(super) fn page_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Page, AppError> {
    let meta = page_meta_from_row(row);
    let fields: String = row.get("fields");
    let content = PageContent::from_parts(meta.page_type, serde_json::from_str(&fields)?)?;
    Ok(Page { meta, content })
}
