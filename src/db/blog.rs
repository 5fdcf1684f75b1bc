//! Blog persistence: authors, tags and post relations.

use std::collections::HashMap;

use sqlx::{Row, Sqlite, Transaction};

use super::pages::{insert_page, page_from_row};
use super::repository::{placeholders, Repository};
use crate::errors::AppError;
use crate::models::validation::slugify;
use crate::models::{
    Author, BlogPage, BlogRelations, GalleryImage, NewAuthor, NewBlogPost, NewPage, Page,
    PageContent, PageType, Tag,
};
use crate::tagging::TagQuery;

const BLOG_PAGE_COLUMNS: &str = "p.id, p.parent_id, p.page_type, p.title, p.slug, p.url_path, p.live, p.first_published_at, p.last_published_at, p.fields";

impl Repository {
    // ==================== AUTHOR OPERATIONS ====================

    pub async fn create_author(&self, request: &NewAuthor) -> Result<Author, AppError> {
        request.validate()?;

        let result = sqlx::query("INSERT INTO authors (name, image_id) VALUES (?, ?)")
            .bind(&request.name)
            .bind(request.image_id)
            .execute(&self.pool)
            .await?;

        Ok(Author {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            image_id: request.image_id,
        })
    }

    // ==================== POST OPERATIONS ====================

    /// Create a blog post page under `parent_id` with its authors, tags and
    /// gallery images, in one transaction.
    pub async fn create_blog_post(&self, parent_id: i64, request: &NewBlogPost) -> Result<Page, AppError> {
        request.validate()?;

        let page = NewPage {
            title: request.title.clone(),
            slug: request.slug.clone(),
            live: request.live,
            content: PageContent::Blog(BlogPage {
                date: request.date,
                intro: request.intro.clone(),
                body: request.body.clone(),
            }),
        };

        let mut tx = self.pool.begin().await?;
        let page_id = insert_page(&mut tx, Some(parent_id), &page).await?;

        for author_id in &request.author_ids {
            sqlx::query("INSERT OR IGNORE INTO blog_page_authors (page_id, author_id) VALUES (?, ?)")
                .bind(page_id)
                .bind(*author_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                        AppError::Validation(format!("Author {} does not exist", author_id))
                    }
                    other => other.into(),
                })?;
        }

        for label in request.normalized_tags() {
            let tag_id = get_or_create_tag(&mut tx, &label).await?;
            sqlx::query("INSERT OR IGNORE INTO blog_page_tags (page_id, tag_id) VALUES (?, ?)")
                .bind(page_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        for (position, item) in request.gallery_images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO blog_gallery_images (page_id, image_id, caption, sort_order) VALUES (?, ?, ?, ?)",
            )
            .bind(page_id)
            .bind(item.image_id)
            .bind(&item.caption)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    AppError::Validation(format!("Image {} does not exist", item.image_id))
                }
                other => other.into(),
            })?;
        }

        tx.commit().await?;

        self.get_page(page_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Page {} vanished", page_id)))
    }

    /// Authors, tags and gallery images of one post.
    pub async fn blog_relations(&self, page_id: i64) -> Result<BlogRelations, AppError> {
        let authors = sqlx::query(
            "SELECT a.id, a.name, a.image_id FROM authors a JOIN blog_page_authors pa ON pa.author_id = a.id WHERE pa.page_id = ? ORDER BY a.name, a.id",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        let gallery = sqlx::query(
            "SELECT id, image_id, caption, sort_order FROM blog_gallery_images WHERE page_id = ? ORDER BY sort_order, id",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        let mut tags = self.tags_for_pages(&[page_id]).await?;

        Ok(BlogRelations {
            authors: authors.iter().map(author_from_row).collect(),
            tags: tags.remove(&page_id).unwrap_or_default(),
            gallery_images: gallery
                .iter()
                .map(|row| GalleryImage {
                    id: row.get("id"),
                    image_id: row.get("image_id"),
                    caption: row.get("caption"),
                    sort_order: row.get("sort_order"),
                })
                .collect(),
        })
    }

    /// Tags of several posts, keyed by page id, each list in name order.
    pub async fn tags_for_pages(&self, page_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
        if page_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT pt.page_id, t.id, t.name, t.slug FROM tags t JOIN blog_page_tags pt ON pt.tag_id = t.id WHERE pt.page_id IN ({}) ORDER BY t.name, t.id",
            placeholders(page_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in page_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.get("page_id")).or_default().push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
            });
        }
        Ok(grouped)
    }

    /// Live blog posts, newest first, optionally restricted to one parent.
    pub async fn live_blog_posts(&self, child_of: Option<i64>) -> Result<Vec<Page>, AppError> {
        let mut sql = format!(
            "SELECT {} FROM pages p WHERE p.page_type = ? AND p.live = 1",
            BLOG_PAGE_COLUMNS
        );
        if child_of.is_some() {
            sql.push_str(" AND p.parent_id = ?");
        }
        sql.push_str(" ORDER BY p.first_published_at DESC, p.id DESC");

        let mut query = sqlx::query(&sql).bind(PageType::Blog.as_str());
        if let Some(parent) = child_of {
            query = query.bind(parent);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(page_from_row).collect()
    }

    /// Live blog posts selected by a tag query, newest first.
    pub async fn blog_posts_tagged(&self, query: &TagQuery) -> Result<Vec<Page>, AppError> {
        let label = match query {
            TagQuery::All => return self.live_blog_posts(None).await,
            TagQuery::Label(label) => label,
        };

        let sql = format!(
            "SELECT {} FROM pages p WHERE p.page_type = ? AND p.live = 1 AND EXISTS (\
                SELECT 1 FROM blog_page_tags pt JOIN tags t ON t.id = pt.tag_id \
                WHERE pt.page_id = p.id AND t.name = ?) \
             ORDER BY p.first_published_at DESC, p.id DESC",
            BLOG_PAGE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(PageType::Blog.as_str())
            .bind(label)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(page_from_row).collect()
    }
}

/// Find a tag by exact name or create it with a slug unique among tags.
async fn get_or_create_tag(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64, AppError> {
    if let Some(row) = sqlx::query("SELECT id FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?
    {
        return Ok(row.get("id"));
    }

    let base = match slugify(name) {
        s if s.is_empty() => "tag".to_string(),
        s => s,
    };
    let mut slug = base.clone();
    let mut suffix = 1;
    while sqlx::query("SELECT 1 FROM tags WHERE slug = ?")
        .bind(&slug)
        .fetch_optional(&mut **tx)
        .await?
        .is_some()
    {
        slug = format!("{}_{}", base, suffix);
        suffix += 1;
    }

    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(&slug)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

fn author_from_row(row: &sqlx::sqlite::SqliteRow) -> Author {
    Author {
        id: row.get("id"),
        name: row.get("name"),
        image_id: row.get("image_id"),
    }
}
