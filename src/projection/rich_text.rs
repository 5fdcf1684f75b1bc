//! Rich text expansion.
//!
//! Stored rich text references pages, documents and images by id:
//!
//! ```text
//! <a linktype="page" id="3">About</a>
//! <a linktype="document" id="7">Brochure</a>
//! <embed embedtype="image" id="12" format="left" alt="Office"/>
//! <embed embedtype="media" url="https://www.youtube.com/watch?v=abc"/>
//! ```
//!
//! Expansion is split in two: [`references`] finds what needs loading, the
//! caller resolves it, and [`expand`] rewrites the markup synchronously.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::{FilterSpec, RenditionDescriptor};

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a(\s[^>]*)?>").expect("link pattern is valid"));

static EMBED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<embed(\s[^>]*?)?\s*/?>").expect("embed pattern is valid"));

static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("attribute pattern is valid"));

/// Ids referenced by a piece of rich text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub pages: BTreeSet<i64>,
    pub documents: BTreeSet<i64>,
    /// `(image id, embed format)`
    pub images: BTreeSet<(i64, String)>,
}

impl References {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.documents.is_empty() && self.images.is_empty()
    }

    pub fn merge(&mut self, other: References) {
        self.pages.extend(other.pages);
        self.documents.extend(other.documents);
        self.images.extend(other.images);
    }
}

/// Resolved targets for the references of one or more rich text values.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// Page id to site-relative URL
    pub pages: HashMap<i64, String>,
    /// Document id to file URL
    pub documents: HashMap<i64, String>,
    pub images: HashMap<(i64, String), RenditionDescriptor>,
}

/// Rendition used for an embedded image in the given format.
pub fn format_filter(format: &str) -> FilterSpec {
    match format {
        "fullwidth" => FilterSpec::Width(800),
        "left" | "right" => FilterSpec::Width(500),
        _ => FilterSpec::Original,
    }
}

fn attributes(raw: Option<&str>) -> HashMap<&str, &str> {
    let Some(raw) = raw else {
        return HashMap::new();
    };
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect()
}

fn attr_id(attrs: &HashMap<&str, &str>) -> Option<i64> {
    attrs.get("id").and_then(|id| id.parse().ok())
}

/// Collect every page, document and image reference in `html`.
pub fn references(html: &str) -> References {
    let mut refs = References::default();

    for caps in LINK_RE.captures_iter(html) {
        let attrs = attributes(caps.get(1).map(|m| m.as_str()));
        match (attrs.get("linktype").copied(), attr_id(&attrs)) {
            (Some("page"), Some(id)) => {
                refs.pages.insert(id);
            }
            (Some("document"), Some(id)) => {
                refs.documents.insert(id);
            }
            _ => {}
        }
    }

    for caps in EMBED_RE.captures_iter(html) {
        let attrs = attributes(caps.get(1).map(|m| m.as_str()));
        if attrs.get("embedtype").copied() == Some("image") {
            if let Some(id) = attr_id(&attrs) {
                let format = attrs.get("format").copied().unwrap_or_default();
                refs.images.insert((id, format.to_string()));
            }
        }
    }

    refs
}

/// Rewrite references in `html` using resolved targets. Unresolvable links
/// lose their `href`; unresolvable images are dropped.
pub fn expand(html: &str, resolved: &Resolved) -> String {
    let linked = LINK_RE.replace_all(html, |caps: &Captures| {
        let attrs = attributes(caps.get(1).map(|m| m.as_str()));
        let target = match (attrs.get("linktype").copied(), attr_id(&attrs)) {
            (Some("page"), Some(id)) => resolved.pages.get(&id),
            (Some("document"), Some(id)) => resolved.documents.get(&id),
            (Some(_), _) => None,
            (None, _) => return caps[0].to_string(),
        };
        match target {
            Some(url) => format!(r#"<a href="{}">"#, escape(url)),
            None => "<a>".to_string(),
        }
    });

    EMBED_RE
        .replace_all(&linked, |caps: &Captures| {
            let attrs = attributes(caps.get(1).map(|m| m.as_str()));
            match attrs.get("embedtype").copied() {
                Some("image") => {
                    let format = attrs.get("format").copied().unwrap_or_default();
                    let rendition = attr_id(&attrs)
                        .and_then(|id| resolved.images.get(&(id, format.to_string())));
                    match rendition {
                        Some(r) => format!(
                            r#"<img alt="{}" class="richtext-image {}" height="{}" src="{}" width="{}">"#,
                            attrs.get("alt").copied().unwrap_or_default(),
                            format,
                            r.height,
                            escape(&r.url),
                            r.width
                        ),
                        None => String::new(),
                    }
                }
                Some("media") => match attrs.get("url") {
                    Some(url) => format!(
                        r#"<div class="responsive-object"><a href="{0}">{0}</a></div>"#,
                        url
                    ),
                    None => String::new(),
                },
                _ => String::new(),
            }
        })
        .into_owned()
}

/// Escape a value for use inside a double-quoted attribute.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
