//! Tag-based selection of blog posts.
//!
//! A missing or blank label selects every live post. Any other label matches
//! tag names exactly, including case.

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::Page;

/// How a blog post listing is narrowed by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagQuery {
    All,
    Label(String),
}

impl TagQuery {
    /// Interpret the raw `tag` request parameter.
    pub fn from_param(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") => TagQuery::All,
            Some(label) => TagQuery::Label(label.to_string()),
        }
    }
}

/// Live blog posts selected by `label`, newest first.
pub async fn posts_tagged(repo: &Repository, label: Option<&str>) -> Result<Vec<Page>, AppError> {
    let query = TagQuery::from_param(label);
    let posts = repo.blog_posts_tagged(&query).await?;
    tracing::debug!("Tag query {:?} matched {} posts", query, posts.len());
    Ok(posts)
}
