//! Blog models: index/post/tag-index pages, authors, tags and gallery images.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation;
use crate::errors::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlogIndexPage {
    pub intro: String,
}

/// Fields of a blog post page. Authors, tags and gallery images are
/// stored as relations of the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPage {
    pub date: NaiveDate,
    pub intro: String,
    #[serde(default)]
    pub body: String,
}

impl BlogPage {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Intro", &self.intro)?;
        validation::max_len("Intro", &self.intro, 250)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlogTagIndexPage {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub image_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    #[serde(default)]
    pub image_id: Option<i64>,
}

impl NewAuthor {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Author name", &self.name)?;
        validation::max_len("Author name", &self.name, 255)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub id: i64,
    pub image_id: i64,
    pub caption: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGalleryImage {
    pub image_id: i64,
    #[serde(default)]
    pub caption: String,
}

/// Relations hanging off a blog post page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogRelations {
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
    /// In editor-defined order
    pub gallery_images: Vec<GalleryImage>,
}

impl BlogRelations {
    /// Image of the first gallery item.
    pub fn main_image(&self) -> Option<i64> {
        self.gallery_images.first().map(|g| g.image_id)
    }
}

/// Everything needed to create a blog post under a blog index.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlogPost {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_live")]
    pub live: bool,
    pub date: NaiveDate,
    pub intro: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author_ids: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub gallery_images: Vec<NewGalleryImage>,
}

fn default_live() -> bool {
    true
}

impl NewBlogPost {
    pub fn new(title: impl Into<String>, date: NaiveDate, intro: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: None,
            live: true,
            date,
            intro: intro.into(),
            body: String::new(),
            author_ids: Vec::new(),
            tags: Vec::new(),
            gallery_images: Vec::new(),
        }
    }

    /// Tag labels trimmed, blank ones dropped, duplicates removed in order.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for tag in &self.tags {
            let label = tag.trim();
            if !label.is_empty() && !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        labels
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for label in self.normalized_tags() {
            validation::max_len("Tag", &label, 100)?;
        }
        for item in &self.gallery_images {
            validation::max_len("Caption", &item.caption, 250)?;
        }
        Ok(())
    }
}
