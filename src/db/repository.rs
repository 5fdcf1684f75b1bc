//! Database repository shared by all content areas.
//!
//! The query methods live in per-area modules (`media`, `team`, `pages`,
//! `blog`) as additional `impl Repository` blocks.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::errors::AppError;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Helper functions for column conversion

pub(super) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically in time order.
pub(super) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!("Unparsable timestamp '{}' in database: {}", s, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}

pub(super) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(super) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Build `?, ?, ?` for an `IN (...)` clause.
pub(super) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
