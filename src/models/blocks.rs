//! Flexible page content stream.
//!
//! A flexible page body is an ordered list of typed blocks. Each block
//! serializes as `{"type": "...", "id": "...", "value": ...}`; the id is a
//! UUID assigned on first save and kept stable across edits.

use serde::{Deserialize, Serialize};

use super::validation;
use crate::errors::AppError;

fn new_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallToAction {
    pub title: String,
    /// Rich text
    pub text: String,
    pub button_text: String,
    #[serde(default)]
    pub button_link: String,
    #[serde(default)]
    pub button_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    #[serde(default)]
    pub heading: String,
    /// Rich text
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Columns {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlexibleBlock {
    Heading {
        #[serde(default = "new_block_id")]
        id: String,
        value: String,
    },
    Paragraph {
        #[serde(default = "new_block_id")]
        id: String,
        value: String,
    },
    Image {
        #[serde(default = "new_block_id")]
        id: String,
        value: i64,
    },
    Embed {
        #[serde(default = "new_block_id")]
        id: String,
        value: String,
    },
    Document {
        #[serde(default = "new_block_id")]
        id: String,
        value: i64,
    },
    CallToAction {
        #[serde(default = "new_block_id")]
        id: String,
        value: CallToAction,
    },
    Quote {
        #[serde(default = "new_block_id")]
        id: String,
        value: Quote,
    },
    Columns {
        #[serde(default = "new_block_id")]
        id: String,
        value: Columns,
    },
    Anchor {
        #[serde(default = "new_block_id")]
        id: String,
        value: String,
    },
}

impl FlexibleBlock {
    pub fn id(&self) -> &str {
        match self {
            FlexibleBlock::Heading { id, .. }
            | FlexibleBlock::Paragraph { id, .. }
            | FlexibleBlock::Image { id, .. }
            | FlexibleBlock::Embed { id, .. }
            | FlexibleBlock::Document { id, .. }
            | FlexibleBlock::CallToAction { id, .. }
            | FlexibleBlock::Quote { id, .. }
            | FlexibleBlock::Columns { id, .. }
            | FlexibleBlock::Anchor { id, .. } => id,
        }
    }

    pub fn block_type(&self) -> &'static str {
        match self {
            FlexibleBlock::Heading { .. } => "heading",
            FlexibleBlock::Paragraph { .. } => "paragraph",
            FlexibleBlock::Image { .. } => "image",
            FlexibleBlock::Embed { .. } => "embed",
            FlexibleBlock::Document { .. } => "document",
            FlexibleBlock::CallToAction { .. } => "call_to_action",
            FlexibleBlock::Quote { .. } => "quote",
            FlexibleBlock::Columns { .. } => "columns",
            FlexibleBlock::Anchor { .. } => "anchor",
        }
    }

    /// Field-level checks applied when a page is saved.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            FlexibleBlock::Heading { value, .. } => {
                validation::required("Heading", value)?;
                validation::max_len("Heading", value, 255)
            }
            FlexibleBlock::Paragraph { value, .. } => validation::required("Paragraph", value),
            FlexibleBlock::Image { .. } | FlexibleBlock::Document { .. } => Ok(()),
            FlexibleBlock::Embed { value, .. } => validation::url("Embed URL", value),
            FlexibleBlock::CallToAction { value, .. } => {
                validation::required("Call to action title", &value.title)?;
                validation::max_len("Call to action title", &value.title, 255)?;
                validation::required("Call to action text", &value.text)?;
                validation::required("Button text", &value.button_text)?;
                validation::max_len("Button text", &value.button_text, 50)?;
                validation::optional_url("Button link", &value.button_link)
            }
            FlexibleBlock::Quote { value, .. } => {
                validation::required("Quote text", &value.text)?;
                validation::max_len("Quote author", &value.author, 100)?;
                validation::max_len("Quote author title", &value.author_title, 100)
            }
            FlexibleBlock::Columns { value, .. } => {
                for column in &value.columns {
                    validation::max_len("Column heading", &column.heading, 255)?;
                    validation::required("Column content", &column.content)?;
                }
                Ok(())
            }
            FlexibleBlock::Anchor { value, .. } => {
                validation::required("Anchor", value)?;
                validation::max_len("Anchor", value, 100)
            }
        }
    }
}
