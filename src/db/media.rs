//! Image, rendition and document persistence.

use std::collections::HashMap;

use sqlx::Row;

use super::repository::{format_datetime, now, placeholders, Repository};
use crate::errors::AppError;
use crate::models::{Document, FilterSpec, Image, NewDocument, NewImage, PageType, Rendition};
use crate::projection::renditions;

impl Repository {
    // ==================== IMAGE OPERATIONS ====================

    pub async fn create_image(&self, request: &NewImage) -> Result<Image, AppError> {
        request.validate()?;
        let created_at = format_datetime(&now());

        let result = sqlx::query(
            "INSERT INTO images (title, file, width, height, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.file)
        .bind(request.width as i64)
        .bind(request.height as i64)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(Image {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            file: request.file.clone(),
            width: request.width,
            height: request.height,
            created_at,
        })
    }

    pub async fn get_image(&self, id: i64) -> Result<Option<Image>, AppError> {
        let row = sqlx::query("SELECT id, title, file, width, height, created_at FROM images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(image_from_row))
    }

    pub async fn list_images(&self) -> Result<Vec<Image>, AppError> {
        let rows = sqlx::query("SELECT id, title, file, width, height, created_at FROM images ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(image_from_row).collect())
    }

    /// Load several images at once, keyed by id. Missing ids are skipped.
    pub async fn get_images(&self, ids: &[i64]) -> Result<HashMap<i64, Image>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT id, title, file, width, height, created_at FROM images WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(image_from_row)
            .map(|image| (image.id, image))
            .collect())
    }

    /// Delete an image. Member photos, author images and standard-page
    /// header images referencing it are nulled; gallery items and
    /// renditions go with it.
    pub async fn delete_image(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE pages SET fields = json_set(fields, '$.header_image', NULL) WHERE page_type = ? AND json_extract(fields, '$.header_image') = ?",
        )
        .bind(PageType::Standard.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Image", id));
        }

        tx.commit().await?;
        tracing::info!("Deleted image {}", id);
        Ok(())
    }

    // ==================== RENDITION OPERATIONS ====================

    /// Return the stored rendition for `(image, spec)`, creating it on first use.
    pub async fn get_or_create_rendition(
        &self,
        image: &Image,
        spec: &FilterSpec,
    ) -> Result<Rendition, AppError> {
        let spec_str = spec.to_string();

        if let Some(existing) = self.find_rendition(image.id, &spec_str).await? {
            return Ok(existing);
        }

        let planned = renditions::plan(image, spec);
        sqlx::query(
            "INSERT OR IGNORE INTO renditions (image_id, filter_spec, file, width, height) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(image.id)
        .bind(&spec_str)
        .bind(&planned.file)
        .bind(planned.width as i64)
        .bind(planned.height as i64)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created rendition {} for image {}", spec_str, image.id);

        // A concurrent request may have won the insert; read back the stored row
        self.find_rendition(image.id, &spec_str)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Rendition {} vanished", spec_str)))
    }

    async fn find_rendition(&self, image_id: i64, spec: &str) -> Result<Option<Rendition>, AppError> {
        let row = sqlx::query(
            "SELECT image_id, filter_spec, file, width, height FROM renditions WHERE image_id = ? AND filter_spec = ?",
        )
        .bind(image_id)
        .bind(spec)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let width: i64 = row.get("width");
            let height: i64 = row.get("height");
            Rendition {
                image_id: row.get("image_id"),
                filter_spec: row.get("filter_spec"),
                file: row.get("file"),
                width: width as u32,
                height: height as u32,
            }
        }))
    }

    #[cfg(test)]
    pub async fn count_renditions(&self, image_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM renditions WHERE image_id = ?")
            .bind(image_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ==================== DOCUMENT OPERATIONS ====================

    pub async fn create_document(&self, request: &NewDocument) -> Result<Document, AppError> {
        request.validate()?;
        let created_at = format_datetime(&now());

        let result = sqlx::query("INSERT INTO documents (title, file, created_at) VALUES (?, ?, ?)")
            .bind(&request.title)
            .bind(&request.file)
            .bind(&created_at)
            .execute(&self.pool)
            .await?;

        Ok(Document {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            file: request.file.clone(),
            created_at,
        })
    }

    pub async fn get_document(&self, id: i64) -> Result<Option<Document>, AppError> {
        let row = sqlx::query("SELECT id, title, file, created_at FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query("SELECT id, title, file, created_at FROM documents ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    pub async fn get_documents(&self, ids: &[i64]) -> Result<HashMap<i64, Document>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT id, title, file, created_at FROM documents WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(document_from_row)
            .map(|doc| (doc.id, doc))
            .collect())
    }
}

fn image_from_row(row: &sqlx::sqlite::SqliteRow) -> Image {
    let width: i64 = row.get("width");
    let height: i64 = row.get("height");
    Image {
        id: row.get("id"),
        title: row.get("title"),
        file: row.get("file"),
        width: width as u32,
        height: height as u32,
        created_at: row.get("created_at"),
    }
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        title: row.get("title"),
        file: row.get("file"),
        created_at: row.get("created_at"),
    }
}
