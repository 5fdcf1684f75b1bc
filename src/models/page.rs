//! Page tree models.
//!
//! Every page shares a common [`PageMeta`] (title, slug, tree position, publish
//! state); the type-specific fields live in a [`PageContent`] variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blocks::FlexibleBlock;
use super::blog::{BlogIndexPage, BlogPage, BlogTagIndexPage};
use super::team::TeamPage;
use super::validation;
use crate::errors::AppError;

/// Registered page types, named `<app>.<Model>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    #[serde(rename = "pages.StandardPage")]
    Standard,
    #[serde(rename = "pages.AboutPage")]
    About,
    #[serde(rename = "pages.ServicesPage")]
    Services,
    #[serde(rename = "pages.ServicePage")]
    Service,
    #[serde(rename = "pages.ContactPage")]
    Contact,
    #[serde(rename = "pages.FAQPage")]
    Faq,
    #[serde(rename = "pages.FlexiblePage")]
    Flexible,
    #[serde(rename = "blog.BlogIndexPage")]
    BlogIndex,
    #[serde(rename = "blog.BlogPage")]
    Blog,
    #[serde(rename = "blog.BlogTagIndexPage")]
    BlogTagIndex,
    #[serde(rename = "team.TeamPage")]
    Team,
}

impl PageType {
    pub const ALL: [PageType; 11] = [
        PageType::Standard,
        PageType::About,
        PageType::Services,
        PageType::Service,
        PageType::Contact,
        PageType::Faq,
        PageType::Flexible,
        PageType::BlogIndex,
        PageType::Blog,
        PageType::BlogTagIndex,
        PageType::Team,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Standard => "pages.StandardPage",
            PageType::About => "pages.AboutPage",
            PageType::Services => "pages.ServicesPage",
            PageType::Service => "pages.ServicePage",
            PageType::Contact => "pages.ContactPage",
            PageType::Faq => "pages.FAQPage",
            PageType::Flexible => "pages.FlexiblePage",
            PageType::BlogIndex => "blog.BlogIndexPage",
            PageType::Blog => "blog.BlogPage",
            PageType::BlogTagIndex => "blog.BlogTagIndexPage",
            PageType::Team => "team.TeamPage",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::BadRequest(format!("type doesn't exist: {}", s)))
    }
}

/// Fields every page carries regardless of its type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageMeta {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub page_type: PageType,
    pub title: String,
    pub slug: String,
    /// Site-relative URL, always starting and ending with `/`
    pub url_path: String,
    pub live: bool,
    pub first_published_at: Option<DateTime<Utc>>,
    pub last_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StandardPage {
    pub intro: String,
    pub header_image: Option<i64>,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AboutPage {
    pub intro: String,
    pub mission: String,
    pub vision: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicesPage {
    pub intro: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServicePage {
    pub description: String,
    pub features: String,
    pub pricing_info: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactPage {
    pub phone: String,
    pub email: String,
    pub address: String,
    pub body: String,
    pub facebook_url: String,
    pub twitter_url: String,
    pub linkedin_url: String,
    pub instagram_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaqPage {
    pub intro: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlexiblePage {
    pub subtitle: String,
    pub body: Vec<FlexibleBlock>,
}

/// A question/answer pair belonging to one FAQ page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaqItem {
    pub id: i64,
    pub question: String,
    /// Rich text
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFaqItem {
    pub question: String,
    pub answer: String,
}

impl NewFaqItem {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Question", &self.question)?;
        validation::max_len("Question", &self.question, 255)?;
        validation::required("Answer", &self.answer)
    }
}

/// Type-specific page fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "fields")]
pub enum PageContent {
    #[serde(rename = "pages.StandardPage")]
    Standard(StandardPage),
    #[serde(rename = "pages.AboutPage")]
    About(AboutPage),
    #[serde(rename = "pages.ServicesPage")]
    Services(ServicesPage),
    #[serde(rename = "pages.ServicePage")]
    Service(ServicePage),
    #[serde(rename = "pages.ContactPage")]
    Contact(ContactPage),
    #[serde(rename = "pages.FAQPage")]
    Faq(FaqPage),
    #[serde(rename = "pages.FlexiblePage")]
    Flexible(FlexiblePage),
    #[serde(rename = "blog.BlogIndexPage")]
    BlogIndex(BlogIndexPage),
    #[serde(rename = "blog.BlogPage")]
    Blog(BlogPage),
    #[serde(rename = "blog.BlogTagIndexPage")]
    BlogTagIndex(BlogTagIndexPage),
    #[serde(rename = "team.TeamPage")]
    Team(TeamPage),
}

impl PageContent {
    pub fn page_type(&self) -> PageType {
        match self {
            PageContent::Standard(_) => PageType::Standard,
            PageContent::About(_) => PageType::About,
            PageContent::Services(_) => PageType::Services,
            PageContent::Service(_) => PageType::Service,
            PageContent::Contact(_) => PageType::Contact,
            PageContent::Faq(_) => PageType::Faq,
            PageContent::Flexible(_) => PageType::Flexible,
            PageContent::BlogIndex(_) => PageType::BlogIndex,
            PageContent::Blog(_) => PageType::Blog,
            PageContent::BlogTagIndex(_) => PageType::BlogTagIndex,
            PageContent::Team(_) => PageType::Team,
        }
    }

    /// Split into the stored type name and the JSON field document.
    pub fn to_parts(&self) -> Result<(PageType, serde_json::Value), AppError> {
        let mut value = serde_json::to_value(self)?;
        let fields = value
            .get_mut("fields")
            .map(serde_json::Value::take)
            .unwrap_or_else(|| serde_json::json!({}));
        Ok((self.page_type(), fields))
    }

    /// Rebuild from the stored type name and JSON field document.
    pub fn from_parts(page_type: PageType, fields: serde_json::Value) -> Result<Self, AppError> {
        let value = serde_json::json!({ "type": page_type, "fields": fields });
        Ok(serde_json::from_value(value)?)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            PageContent::Service(page) => validation::max_len("Pricing info", &page.pricing_info, 255),
            PageContent::Contact(page) => {
                validation::max_len("Phone", &page.phone, 20)?;
                validation::optional_email("Email", &page.email)?;
                validation::optional_url("Facebook URL", &page.facebook_url)?;
                validation::optional_url("Twitter/X URL", &page.twitter_url)?;
                validation::optional_url("LinkedIn URL", &page.linkedin_url)?;
                validation::optional_url("Instagram URL", &page.instagram_url)
            }
            PageContent::Flexible(page) => {
                validation::max_len("Subtitle", &page.subtitle, 255)?;
                page.body.iter().try_for_each(FlexibleBlock::validate)
            }
            PageContent::Blog(page) => page.validate(),
            _ => Ok(()),
        }
    }
}

/// A page with its typed content.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub meta: PageMeta,
    pub content: PageContent,
}

fn default_live() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_live")]
    pub live: bool,
    pub content: PageContent,
}

impl NewPage {
    pub fn new(title: impl Into<String>, content: PageContent) -> Self {
        Self {
            title: title.into(),
            slug: None,
            live: true,
            content,
        }
    }

    pub fn draft(mut self) -> Self {
        self.live = false;
        self
    }

    /// The explicit slug, or one derived from the title.
    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => validation::slugify(&self.title),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validation::required("Title", &self.title)?;
        validation::max_len("Title", &self.title, 255)?;
        let slug = self.resolved_slug();
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Slug could not be derived from the title".to_string(),
            ));
        }
        validation::max_len("Slug", &slug, 255)?;
        self.content.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_type_names() {
        assert_eq!(PageType::Faq.as_str(), "pages.FAQPage");
        assert_eq!(
            "blog.BlogPage".parse::<PageType>().unwrap(),
            PageType::Blog
        );
        assert_eq!(
            "pages.faqpage".parse::<PageType>().unwrap(),
            PageType::Faq
        );
        assert!("pages.HomePage".parse::<PageType>().is_err());
    }

    #[test]
    fn test_content_parts_round_trip() {
        let content = PageContent::Service(ServicePage {
            description: "<p>Audits</p>".to_string(),
            features: String::new(),
            pricing_info: "From 100/h".to_string(),
        });
        let (page_type, fields) = content.to_parts().unwrap();
        assert_eq!(page_type, PageType::Service);
        assert_eq!(fields["pricing_info"], "From 100/h");

        let rebuilt = PageContent::from_parts(page_type, fields).unwrap();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn test_empty_field_document_uses_defaults() {
        let content = PageContent::from_parts(PageType::Team, json!({})).unwrap();
        match content {
            PageContent::Team(team) => {
                assert!(team.show_departments);
                assert!(team.show_only_active);
                assert!(!team.show_only_featured);
            }
            other => panic!("unexpected content {:?}", other),
        }

        let content = PageContent::from_parts(PageType::BlogTagIndex, json!({})).unwrap();
        assert_eq!(content.page_type(), PageType::BlogTagIndex);
    }

    #[test]
    fn test_new_page_slug() {
        let page = NewPage::new("Our Services", PageContent::Services(ServicesPage::default()));
        assert_eq!(page.resolved_slug(), "our-services");

        let mut page = NewPage::new("!!!", PageContent::Faq(FaqPage::default()));
        assert!(page.validate().is_err());
        page.slug = Some("faq".to_string());
        assert!(page.validate().is_ok());
    }

    #[test]
    fn test_contact_page_validation() {
        let content = PageContent::Contact(ContactPage {
            email: "hello@example.com".to_string(),
            linkedin_url: "not a url".to_string(),
            ..ContactPage::default()
        });
        assert!(content.validate().is_err());
    }
}
