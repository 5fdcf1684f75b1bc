//! Image and document models, and the rendition filter specification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation;
use crate::errors::AppError;

/// A source image uploaded through the authoring surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: i64,
    pub title: String,
    /// Storage path relative to the media root, e.g. `original_images/team.jpg`
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewImage {
    pub title: String,
    pub file: String,
    pub width: u32,
    pub height: u32,
}

impl NewImage {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Title", &self.title)?;
        validation::max_len("Title", &self.title, 255)?;
        validation::required("File", &self.file)?;
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Validation(
                "Image dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A downloadable document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub file: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub file: String,
}

impl NewDocument {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Title", &self.title)?;
        validation::max_len("Title", &self.title, 255)?;
        validation::required("File", &self.file)
    }
}

/// A resize operation applied to a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterSpec {
    Original,
    Fill { width: u32, height: u32 },
    Max { width: u32, height: u32 },
    Min { width: u32, height: u32 },
    Width(u32),
    Height(u32),
}

impl FilterSpec {
    pub const fn fill(width: u32, height: u32) -> Self {
        FilterSpec::Fill { width, height }
    }
}

fn parse_box(spec: &str, dims: &str) -> Result<(u32, u32), AppError> {
    let (w, h) = dims
        .split_once('x')
        .ok_or_else(|| AppError::BadRequest(format!("Invalid filter spec: {}", spec)))?;
    Ok((parse_side(spec, w)?, parse_side(spec, h)?))
}

fn parse_side(spec: &str, side: &str) -> Result<u32, AppError> {
    match side.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!("Invalid filter spec: {}", spec))),
    }
}

impl FromStr for FilterSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "original" {
            return Ok(FilterSpec::Original);
        }
        let (op, arg) = s
            .split_once('-')
            .ok_or_else(|| AppError::BadRequest(format!("Invalid filter spec: {}", s)))?;
        match op {
            "fill" => parse_box(s, arg).map(|(width, height)| FilterSpec::Fill { width, height }),
            "max" => parse_box(s, arg).map(|(width, height)| FilterSpec::Max { width, height }),
            "min" => parse_box(s, arg).map(|(width, height)| FilterSpec::Min { width, height }),
            "width" => parse_side(s, arg).map(FilterSpec::Width),
            "height" => parse_side(s, arg).map(FilterSpec::Height),
            _ => Err(AppError::BadRequest(format!("Invalid filter spec: {}", s))),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Original => write!(f, "original"),
            FilterSpec::Fill { width, height } => write!(f, "fill-{}x{}", width, height),
            FilterSpec::Max { width, height } => write!(f, "max-{}x{}", width, height),
            FilterSpec::Min { width, height } => write!(f, "min-{}x{}", width, height),
            FilterSpec::Width(w) => write!(f, "width-{}", w),
            FilterSpec::Height(h) => write!(f, "height-{}", h),
        }
    }
}

/// A stored rendition row.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    pub image_id: i64,
    pub filter_spec: String,
    pub file: String,
    pub width: u32,
    pub height: u32,
}

/// Wire shape of a rendition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenditionDescriptor {
    pub url: String,
    pub full_url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}
