//! Wire representations of stored content.
//!
//! The [`Projector`] turns models into response bodies: rich text is
//! expanded, images become rendition descriptors and relations are inlined.

pub mod renditions;
pub mod rich_text;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::MediaSettings;
use crate::db::Repository;
use crate::directory::{self, DirectoryOptions};
use crate::errors::AppError;
use crate::models::{
    Department, Document, FilterSpec, FlexibleBlock, Image, Page, PageContent, PageMeta,
    RenditionDescriptor, TeamMember,
};
use rich_text::{References, Resolved};

const PHOTO_THUMBNAIL: FilterSpec = FilterSpec::fill(150, 150);
const PHOTO_MEDIUM: FilterSpec = FilterSpec::fill(300, 300);
const PHOTO_LARGE: FilterSpec = FilterSpec::fill(500, 500);
const IMAGE_THUMBNAIL: FilterSpec = FilterSpec::Max {
    width: 165,
    height: 165,
};

/// Human-readable form of a date, e.g. `Monday 05 January 2026`.
pub fn date_display(date: &NaiveDate) -> String {
    date.format("%A %d %B %Y").to_string()
}

#[derive(Debug, Serialize)]
pub struct SocialLinkView {
    pub platform: &'static str,
    pub platform_display: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct TeamMemberView {
    pub id: i64,
    pub name: String,
    pub job_title: String,
    pub department: Option<Department>,
    pub email: String,
    pub phone: String,
    pub photo_thumbnail: Option<RenditionDescriptor>,
    pub photo_medium: Option<RenditionDescriptor>,
    pub photo_large: Option<RenditionDescriptor>,
    pub bio: String,
    pub short_bio: String,
    pub years_experience: Option<u32>,
    pub specialties: String,
    pub specialty_list: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub sort_order: i32,
    pub start_date: Option<NaiveDate>,
    pub social_links: Vec<SocialLinkView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentGroupView {
    pub department: Department,
    pub members: Vec<TeamMemberView>,
}

/// `meta` of a page, image or document in the content API.
#[derive(Debug, Serialize)]
pub struct ObjectMeta {
    #[serde(rename = "type")]
    pub object_type: String,
    pub detail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// Reference to another page, as nested in `meta.parent`.
#[derive(Debug, Serialize)]
pub struct PageRef {
    pub id: i64,
    pub meta: ObjectMeta,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct PageMetaView {
    #[serde(flatten)]
    pub object: ObjectMeta,
    pub slug: String,
    pub first_published_at: Option<DateTime<Utc>>,
    /// Present on detail views only; `null` for a tree root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<PageRef>>,
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub id: i64,
    pub meta: PageMetaView,
    pub title: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub id: i64,
    pub meta: ObjectMeta,
    pub title: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<RenditionDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: i64,
    pub meta: ObjectMeta,
    pub title: String,
}

/// Builds response bodies from stored content.
#[derive(Clone)]
pub struct Projector {
    repo: Arc<Repository>,
    media: MediaSettings,
}

impl Projector {
    pub fn new(repo: Arc<Repository>, media: MediaSettings) -> Self {
        Self { repo, media }
    }

    // ==================== URLS ====================

    fn page_detail_url(&self, id: i64) -> String {
        format!("{}/api/v2/pages/{}/", self.media.base_url, id)
    }

    fn image_detail_url(&self, id: i64) -> String {
        format!("{}/api/v2/images/{}/", self.media.base_url, id)
    }

    fn document_detail_url(&self, id: i64) -> String {
        format!("{}/api/v2/documents/{}/", self.media.base_url, id)
    }

    fn page_object_meta(&self, meta: &PageMeta) -> ObjectMeta {
        ObjectMeta {
            object_type: meta.page_type.to_string(),
            detail_url: self.page_detail_url(meta.id),
            html_url: Some(self.media.absolute(&meta.url_path)),
            download_url: None,
        }
    }

    // ==================== RICH TEXT ====================

    /// Load everything the given rich text values reference.
    pub async fn resolve(&self, htmls: &[&str]) -> Result<Resolved, AppError> {
        let mut refs = References::default();
        for html in htmls {
            refs.merge(rich_text::references(html));
        }
        if refs.is_empty() {
            return Ok(Resolved::default());
        }

        let mut resolved = Resolved::default();

        let page_ids: Vec<i64> = refs.pages.iter().copied().collect();
        for (id, meta) in self.repo.get_page_metas(&page_ids).await? {
            resolved.pages.insert(id, meta.url_path);
        }

        let doc_ids: Vec<i64> = refs.documents.iter().copied().collect();
        for (id, doc) in self.repo.get_documents(&doc_ids).await? {
            resolved.documents.insert(id, self.media.file_url(&doc.file));
        }

        let image_ids: Vec<i64> = refs
            .images
            .iter()
            .map(|(id, _)| *id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let images = self.repo.get_images(&image_ids).await?;
        for (id, format) in refs.images {
            if let Some(image) = images.get(&id) {
                let descriptor = self.rendition(image, &rich_text::format_filter(&format)).await?;
                resolved.images.insert((id, format), descriptor);
            }
        }

        Ok(resolved)
    }

    /// Expand a single rich text value.
    pub async fn rich_text(&self, html: &str) -> Result<String, AppError> {
        let resolved = self.resolve(&[html]).await?;
        Ok(rich_text::expand(html, &resolved))
    }

    // ==================== MEDIA ====================

    pub async fn rendition(&self, image: &Image, spec: &FilterSpec) -> Result<RenditionDescriptor, AppError> {
        let rendition = self.repo.get_or_create_rendition(image, spec).await?;
        Ok(renditions::descriptor(image, &rendition, &self.media))
    }

    pub fn image(&self, image: &Image) -> ImageView {
        ImageView {
            id: image.id,
            meta: ObjectMeta {
                object_type: "wagtailimages.Image".to_string(),
                detail_url: self.image_detail_url(image.id),
                html_url: None,
                download_url: Some(self.media.file_url(&image.file)),
            },
            title: image.title.clone(),
            width: image.width,
            height: image.height,
            thumbnail: None,
        }
    }

    /// Image detail, with a bounded thumbnail.
    pub async fn image_detail(&self, image: &Image) -> Result<ImageView, AppError> {
        let mut view = self.image(image);
        view.thumbnail = Some(self.rendition(image, &IMAGE_THUMBNAIL).await?);
        Ok(view)
    }

    pub fn document(&self, document: &Document) -> DocumentView {
        DocumentView {
            id: document.id,
            meta: ObjectMeta {
                object_type: "wagtaildocs.Document".to_string(),
                detail_url: self.document_detail_url(document.id),
                html_url: None,
                download_url: Some(self.media.file_url(&document.file)),
            },
            title: document.title.clone(),
        }
    }

    async fn image_ref(&self, id: Option<i64>) -> Result<Value, AppError> {
        let Some(id) = id else {
            return Ok(Value::Null);
        };
        match self.repo.get_image(id).await? {
            Some(image) => Ok(serde_json::to_value(self.image(&image))?),
            None => Ok(Value::Null),
        }
    }

    async fn document_ref(&self, id: i64) -> Result<Value, AppError> {
        match self.repo.get_document(id).await? {
            Some(doc) => Ok(serde_json::to_value(self.document(&doc))?),
            None => Ok(Value::Null),
        }
    }

    // ==================== TEAM ====================

    pub async fn team_members(&self, members: &[TeamMember]) -> Result<Vec<TeamMemberView>, AppError> {
        let photo_ids: Vec<i64> = members.iter().filter_map(|m| m.photo_id).collect();
        let photos = self.repo.get_images(&photo_ids).await?;

        let bios: Vec<&str> = members.iter().map(|m| m.bio.as_str()).collect();
        let resolved = self.resolve(&bios).await?;

        let mut views = Vec::with_capacity(members.len());
        for member in members {
            let photo = member.photo_id.and_then(|id| photos.get(&id));
            let (photo_thumbnail, photo_medium, photo_large) = match photo {
                Some(image) => (
                    Some(self.rendition(image, &PHOTO_THUMBNAIL).await?),
                    Some(self.rendition(image, &PHOTO_MEDIUM).await?),
                    Some(self.rendition(image, &PHOTO_LARGE).await?),
                ),
                None => (None, None, None),
            };

            views.push(TeamMemberView {
                id: member.id,
                name: member.name.clone(),
                job_title: member.job_title.clone(),
                department: member.department.clone(),
                email: member.email.clone(),
                phone: member.phone.clone(),
                photo_thumbnail,
                photo_medium,
                photo_large,
                bio: rich_text::expand(&member.bio, &resolved),
                short_bio: member.short_bio.clone(),
                years_experience: member.years_experience,
                specialties: member.specialties.clone(),
                specialty_list: member.specialty_list(),
                is_active: member.is_active,
                is_featured: member.is_featured,
                sort_order: member.sort_order,
                start_date: member.start_date,
                social_links: member
                    .social_links
                    .iter()
                    .map(|link| SocialLinkView {
                        platform: link.platform.as_str(),
                        platform_display: link.platform.display_name(),
                        url: link.url.clone(),
                    })
                    .collect(),
                created_at: member.created_at,
                updated_at: member.updated_at,
            });
        }
        Ok(views)
    }

    pub async fn team_member(&self, member: &TeamMember) -> Result<TeamMemberView, AppError> {
        let mut views = self.team_members(std::slice::from_ref(member)).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Member projection was empty".to_string()))
    }

    pub async fn department_groups(
        &self,
        groups: Vec<directory::DepartmentGroup>,
    ) -> Result<Vec<DepartmentGroupView>, AppError> {
        let mut views = Vec::with_capacity(groups.len());
        for group in groups {
            views.push(DepartmentGroupView {
                members: self.team_members(&group.members).await?,
                department: group.department,
            });
        }
        Ok(views)
    }

    // ==================== PAGES ====================

    /// Listing entry: meta and title only.
    pub fn page_summary(&self, page: &Page) -> PageView {
        PageView {
            id: page.meta.id,
            meta: PageMetaView {
                object: self.page_object_meta(&page.meta),
                slug: page.meta.slug.clone(),
                first_published_at: page.meta.first_published_at,
                parent: None,
            },
            title: page.meta.title.clone(),
            fields: Map::new(),
        }
    }

    /// Full page with its parent reference and type-specific fields.
    pub async fn page_detail(&self, page: &Page) -> Result<PageView, AppError> {
        let parent = match page.meta.parent_id {
            Some(pid) => self
                .repo
                .get_page_metas(&[pid])
                .await?
                .remove(&pid)
                .map(|meta| PageRef {
                    id: meta.id,
                    meta: self.page_object_meta(&meta),
                    title: meta.title.clone(),
                }),
            None => None,
        };

        let mut view = self.page_summary(page);
        view.meta.parent = Some(parent);
        view.fields = self.page_fields(page).await?;
        Ok(view)
    }

    async fn page_fields(&self, page: &Page) -> Result<Map<String, Value>, AppError> {
        let value = match &page.content {
            PageContent::Standard(p) => {
                let r = self.resolve(&[p.intro.as_str(), p.body.as_str()]).await?;
                json!({
                    "intro": rich_text::expand(&p.intro, &r),
                    "body": rich_text::expand(&p.body, &r),
                    "header_image": self.image_ref(p.header_image).await?,
                })
            }
            PageContent::About(p) => {
                let r = self
                    .resolve(&[
                        p.intro.as_str(),
                        p.mission.as_str(),
                        p.vision.as_str(),
                        p.body.as_str(),
                    ])
                    .await?;
                json!({
                    "intro": rich_text::expand(&p.intro, &r),
                    "mission": rich_text::expand(&p.mission, &r),
                    "vision": rich_text::expand(&p.vision, &r),
                    "body": rich_text::expand(&p.body, &r),
                })
            }
            PageContent::Services(p) => json!({ "intro": self.rich_text(&p.intro).await? }),
            PageContent::Service(p) => {
                let r = self.resolve(&[p.description.as_str(), p.features.as_str()]).await?;
                json!({
                    "description": rich_text::expand(&p.description, &r),
                    "features": rich_text::expand(&p.features, &r),
                    "pricing_info": p.pricing_info,
                })
            }
            PageContent::Contact(p) => json!({
                "phone": p.phone,
                "email": p.email,
                "address": p.address,
                "body": self.rich_text(&p.body).await?,
                "facebook_url": p.facebook_url,
                "twitter_url": p.twitter_url,
                "linkedin_url": p.linkedin_url,
                "instagram_url": p.instagram_url,
            }),
            PageContent::Faq(p) => {
                let items = self.repo.faq_items(page.meta.id).await?;
                let mut texts: Vec<&str> = items.iter().map(|i| i.answer.as_str()).collect();
                texts.push(p.intro.as_str());
                let r = self.resolve(&texts).await?;
                let faq_items: Vec<Value> = items
                    .iter()
                    .map(|item| {
                        json!({
                            "id": item.id,
                            "question": item.question,
                            "answer": rich_text::expand(&item.answer, &r),
                        })
                    })
                    .collect();
                json!({
                    "intro": rich_text::expand(&p.intro, &r),
                    "faq_items": faq_items,
                })
            }
            PageContent::Flexible(p) => {
                let mut body = Vec::with_capacity(p.body.len());
                for block in &p.body {
                    body.push(self.block(block).await?);
                }
                json!({ "subtitle": p.subtitle, "body": body })
            }
            PageContent::BlogIndex(p) => json!({ "intro": self.rich_text(&p.intro).await? }),
            PageContent::Blog(p) => {
                let relations = self.repo.blog_relations(page.meta.id).await?;
                let r = self.resolve(&[p.body.as_str()]).await?;

                let mut gallery = Vec::with_capacity(relations.gallery_images.len());
                for item in &relations.gallery_images {
                    gallery.push(json!({
                        "id": item.id,
                        "image": self.image_ref(Some(item.image_id)).await?,
                        "caption": item.caption,
                    }));
                }
                let authors: Vec<Value> = relations
                    .authors
                    .iter()
                    .map(|a| json!({ "id": a.id, "name": a.name }))
                    .collect();
                let tags: Vec<&str> = relations.tags.iter().map(|t| t.name.as_str()).collect();

                json!({
                    "intro": p.intro,
                    "date": p.date,
                    "date_display": date_display(&p.date),
                    "body": rich_text::expand(&p.body, &r),
                    "authors": authors,
                    "tags": tags,
                    "gallery_images": gallery,
                    "main_image": self.image_ref(relations.main_image()).await?,
                })
            }
            PageContent::BlogTagIndex(_) => json!({}),
            PageContent::Team(p) => {
                let opts = DirectoryOptions::from(p);
                let all = self.repo.list_team_members().await?;
                let members = directory::members(opts, &all);
                let mut fields = json!({
                    "intro": self.rich_text(&p.intro).await?,
                    "show_departments": p.show_departments,
                    "team_members": self.team_members(&members).await?,
                });
                if p.show_departments {
                    let departments = self.repo.list_departments().await?;
                    let groups = directory::departments(opts, &departments, &all);
                    fields["departments"] = serde_json::to_value(self.department_groups(groups).await?)?;
                }
                fields
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Internal(format!(
                "page fields projected to a non-object: {}",
                other
            ))),
        }
    }

    /// Project one flexible block as `{type, value, id}`.
    async fn block(&self, block: &FlexibleBlock) -> Result<Value, AppError> {
        let value = match block {
            FlexibleBlock::Heading { value, .. }
            | FlexibleBlock::Embed { value, .. }
            | FlexibleBlock::Anchor { value, .. } => json!(value),
            FlexibleBlock::Paragraph { value, .. } => json!(self.rich_text(value).await?),
            FlexibleBlock::Image { value, .. } => self.image_ref(Some(*value)).await?,
            FlexibleBlock::Document { value, .. } => self.document_ref(*value).await?,
            FlexibleBlock::CallToAction { value, .. } => {
                let button_page = match value.button_page {
                    Some(pid) => self
                        .repo
                        .get_page_metas(&[pid])
                        .await?
                        .remove(&pid)
                        .map(|meta| json!({ "id": meta.id, "url": meta.url_path }))
                        .unwrap_or(Value::Null),
                    None => Value::Null,
                };
                json!({
                    "title": value.title,
                    "text": self.rich_text(&value.text).await?,
                    "button_text": value.button_text,
                    "button_link": value.button_link,
                    "button_page": button_page,
                })
            }
            FlexibleBlock::Quote { value, .. } => serde_json::to_value(value)?,
            FlexibleBlock::Columns { value, .. } => {
                let contents: Vec<&str> = value.columns.iter().map(|c| c.content.as_str()).collect();
                let r = self.resolve(&contents).await?;
                let columns: Vec<Value> = value
                    .columns
                    .iter()
                    .map(|c| {
                        json!({
                            "heading": c.heading,
                            "content": rich_text::expand(&c.content, &r),
                        })
                    })
                    .collect();
                json!({ "columns": columns })
            }
        };

        Ok(json!({
            "type": block.block_type(),
            "value": value,
            "id": block.id(),
        }))
    }

    /// Full projections of several pages, in input order.
    pub async fn page_details(&self, pages: &[Page]) -> Result<Vec<PageView>, AppError> {
        let mut views = Vec::with_capacity(pages.len());
        for page in pages {
            views.push(self.page_detail(page).await?);
        }
        Ok(views)
    }
}
