//! Static registry of page and snippet types.
//!
//! Built once on first access. Page types declare where they may sit in
//! the tree and which fields feed the search index.

use once_cell::sync::Lazy;

use crate::errors::AppError;
use crate::models::PageType;

/// Registration record of one page type.
#[derive(Debug, Clone, Copy)]
pub struct PageTypeInfo {
    pub page_type: PageType,
    pub verbose_name: &'static str,
    /// `None` means any parent, including the tree root.
    pub parent_types: Option<&'static [PageType]>,
    /// `None` means any child type.
    pub subpage_types: Option<&'static [PageType]>,
    /// Field names indexed for full-text search, besides the title
    pub search_fields: &'static [&'static str],
}

/// Registration record of a snippet (non-page content) type.
#[derive(Debug, Clone)]
pub struct SnippetInfo {
    pub name: &'static str,
    pub search_fields: &'static [&'static str],
}

pub struct Registry {
    snippets: Vec<SnippetInfo>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

/// The process-wide registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    fn build() -> Self {
        let snippets = vec![
            SnippetInfo {
                name: "blog.Author",
                search_fields: &[],
            },
            SnippetInfo {
                name: "team.Department",
                search_fields: &[],
            },
            SnippetInfo {
                name: "team.TeamMember",
                search_fields: &["name", "job_title", "bio", "specialties"],
            },
        ];

        Self { snippets }
    }

    pub fn page(&self, page_type: PageType) -> PageTypeInfo {
        let (verbose_name, parent_types, subpage_types, search_fields): (
            &'static str,
            Option<&'static [PageType]>,
            Option<&'static [PageType]>,
            &'static [&'static str],
        ) = match page_type {
            PageType::Standard => ("Standard Page", None, None, &["intro", "body"]),
            PageType::About => ("About Page", None, None, &["intro", "mission", "vision", "body"]),
            PageType::Services => ("Services Page", None, Some(&[PageType::Service]), &[]),
            PageType::Service => (
                "Service Page",
                Some(&[PageType::Services]),
                None,
                &["description", "features"],
            ),
            PageType::Contact => ("Contact Page", None, None, &[]),
            PageType::Faq => ("FAQ Page", None, None, &["intro"]),
            PageType::Flexible => ("Flexible Page", None, None, &["subtitle"]),
            PageType::BlogIndex => ("Blog Index Page", None, None, &[]),
            PageType::Blog => ("Blog Page", None, None, &["intro", "body"]),
            PageType::BlogTagIndex => ("Blog Tag Index Page", None, None, &[]),
            PageType::Team => ("Team Page", None, None, &[]),
        };

        PageTypeInfo {
            page_type,
            verbose_name,
            parent_types,
            subpage_types,
            search_fields,
        }
    }

    /// Page type registered under `name`, compared case-insensitively.
    pub fn page_type_named(&self, name: &str) -> Result<PageType, AppError> {
        PageType::ALL
            .into_iter()
            .find(|page_type| page_type.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| AppError::BadRequest(format!("type doesn't exist: {}", name)))
    }

    pub fn snippet(&self, name: &str) -> Option<&SnippetInfo> {
        self.snippets.iter().find(|s| s.name == name)
    }

    /// Check that a page of `child` type may be created under `parent`
    /// (`None` is the tree root).
    pub fn check_placement(&self, parent: Option<PageType>, child: PageType) -> Result<(), AppError> {
        let child_info = self.page(child);

        if let Some(allowed) = child_info.parent_types {
            let ok = parent.map(|p| allowed.contains(&p)).unwrap_or(false);
            if !ok {
                return Err(AppError::Validation(format!(
                    "{} can only be created under {}",
                    child_info.verbose_name,
                    allowed
                        .iter()
                        .map(|t| self.page(*t).verbose_name)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        if let Some(parent) = parent {
            let parent_info = self.page(parent);
            if let Some(allowed) = parent_info.subpage_types {
                if !allowed.contains(&child) {
                    return Err(AppError::Validation(format!(
                        "{} cannot be created under {}",
                        child_info.verbose_name, parent_info.verbose_name
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_page_type_is_registered() {
        for page_type in PageType::ALL {
            let info = registry().page(page_type);
            assert_eq!(info.page_type, page_type);
            assert!(!info.verbose_name.is_empty());
            assert_eq!(registry().page_type_named(page_type.as_str()).unwrap(), page_type);
        }
        assert_eq!(registry().page(PageType::Faq).verbose_name, "FAQ Page");
        assert_eq!(
            registry().page(PageType::About).search_fields,
            &["intro", "mission", "vision", "body"]
        );
        assert_eq!(
            registry().page_type_named("BLOG.blogpage").unwrap(),
            PageType::Blog
        );
        assert!(registry().page_type_named("blog.Nope").is_err());
    }

    #[test]
    fn test_service_page_requires_services_parent() {
        let reg = registry();
        assert!(reg
            .check_placement(Some(PageType::Services), PageType::Service)
            .is_ok());
        assert!(reg
            .check_placement(Some(PageType::Standard), PageType::Service)
            .is_err());
        assert!(reg.check_placement(None, PageType::Service).is_err());
    }

    #[test]
    fn test_services_page_only_accepts_service_children() {
        let reg = registry();
        assert!(reg
            .check_placement(Some(PageType::Services), PageType::Standard)
            .is_err());
        assert!(reg
            .check_placement(Some(PageType::Standard), PageType::Faq)
            .is_ok());
        assert!(reg.check_placement(None, PageType::BlogIndex).is_ok());
    }

    #[test]
    fn test_snippets() {
        let member = registry().snippet("team.TeamMember").unwrap();
        assert_eq!(
            member.search_fields,
            &["name", "job_title", "bio", "specialties"]
        );
        assert!(registry().snippet("team.Unknown").is_none());
        assert!(registry().snippet("blog.Author").unwrap().search_fields.is_empty());
    }
}
