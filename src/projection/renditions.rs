//! Rendition geometry and file naming.
//!
//! Renditions never upscale: a target larger than the source yields the
//! largest variant the source supports.

use std::path::Path;

use crate::config::MediaSettings;
use crate::models::{FilterSpec, Image, Rendition, RenditionDescriptor};

/// Output file and dimensions of a rendition before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRendition {
    pub file: String,
    pub width: u32,
    pub height: u32,
}

/// Work out the file name and size of `spec` applied to `image`.
pub fn plan(image: &Image, spec: &FilterSpec) -> PlannedRendition {
    let (width, height) = dimensions(image.width, image.height, spec);
    PlannedRendition {
        file: rendition_file(&image.file, spec),
        width,
        height,
    }
}

/// Output size of `spec` applied to a `w`×`h` source.
pub fn dimensions(w: u32, h: u32, spec: &FilterSpec) -> (u32, u32) {
    match *spec {
        FilterSpec::Original => (w, h),
        FilterSpec::Fill { width, height } => {
            // Largest centred crop with the target aspect ratio
            let (crop_w, crop_h) = if (w as u64) * (height as u64) > (h as u64) * (width as u64) {
                (scale(h, width, height), h)
            } else {
                (w, scale(w, height, width))
            };
            if crop_w > width {
                (width, height)
            } else {
                (crop_w.max(1), crop_h.max(1))
            }
        }
        FilterSpec::Max { width, height } => {
            if w <= width && h <= height {
                return (w, h);
            }
            // Fit inside the box: the tighter side decides
            if (w as u64) * (height as u64) > (h as u64) * (width as u64) {
                (width, scale(h, width, w).max(1))
            } else {
                (scale(w, height, h).max(1), height)
            }
        }
        FilterSpec::Min { width, height } => {
            if w <= width || h <= height {
                return (w, h);
            }
            // Cover the box: the looser side decides
            if (w as u64) * (height as u64) > (h as u64) * (width as u64) {
                (scale(w, height, h).max(1), height)
            } else {
                (width, scale(h, width, w).max(1))
            }
        }
        FilterSpec::Width(target) => {
            if w <= target {
                (w, h)
            } else {
                (target, scale(h, target, w).max(1))
            }
        }
        FilterSpec::Height(target) => {
            if h <= target {
                (w, h)
            } else {
                (scale(w, target, h).max(1), target)
            }
        }
    }
}

/// `value * num / den`, rounded to nearest.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    let den = den.max(1) as u64;
    ((value as u64 * num as u64 + den / 2) / den) as u32
}

/// `original_images/team.jpg` + `fill-150x150` → `images/team.fill-150x150.jpg`
fn rendition_file(source: &str, spec: &FilterSpec) -> String {
    let path = Path::new(source);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("images/{}.{}.{}", stem, spec, ext),
        None => format!("images/{}.{}", stem, spec),
    }
}

/// Wire descriptor of a stored rendition.
pub fn descriptor(image: &Image, rendition: &Rendition, media: &MediaSettings) -> RenditionDescriptor {
    let url = media.file_url(&rendition.file);
    RenditionDescriptor {
        full_url: media.absolute(&url),
        url,
        width: rendition.width,
        height: rendition.height,
        alt: image.title.clone(),
    }
}
