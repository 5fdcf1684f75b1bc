//! Tantivy-based search index module.
//!
//! Indexes live pages (title plus the search fields their type registers)
//! and team members, with the title boosted over body text.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::db::{PageFilter, Repository};
use crate::errors::AppError;
use crate::models::{Page, TeamMember};
use crate::registry::registry;

/// Field boost values.
const BOOST_TITLE: f32 = 3.0;
const BOOST_BODY: f32 = 1.0;

const TEAM_MEMBER_SNIPPET: &str = "team.TeamMember";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// What an indexed document stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Page,
    TeamMember,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Page => "page",
            SearchKind::TeamMember => "team_member",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "page" => Some(SearchKind::Page),
            "team_member" => Some(SearchKind::TeamMember),
            _ => None,
        }
    }
}

/// Text extracted from a page or member for indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub kind: SearchKind,
    pub object_id: i64,
    pub title: String,
    pub body: String,
    pub url: String,
}

impl SearchDocument {
    /// Title plus the registered search fields of the page's type.
    pub fn from_page(page: &Page) -> Result<Self, AppError> {
        let (page_type, fields) = page.content.to_parts()?;
        let body = registry()
            .page(page_type)
            .search_fields
            .iter()
            .filter_map(|name| fields.get(*name).and_then(|v| v.as_str()))
            .map(strip_tags)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            kind: SearchKind::Page,
            object_id: page.meta.id,
            title: page.meta.title.clone(),
            body,
            url: page.meta.url_path.clone(),
        })
    }

    /// Name as title; the other registered snippet fields as body.
    pub fn from_member(member: &TeamMember) -> Self {
        let fields = registry()
            .snippet(TEAM_MEMBER_SNIPPET)
            .map(|info| info.search_fields)
            .unwrap_or_default();
        let body = fields
            .iter()
            .filter_map(|name| match *name {
                "job_title" => Some(member.job_title.clone()),
                "bio" => Some(strip_tags(&member.bio)),
                "specialties" => Some(member.specialties.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            kind: SearchKind::TeamMember,
            object_id: member.id,
            title: member.name.clone(),
            body,
            url: format!("/api/team/members/{}/", member.id),
        }
    }

    fn key(&self) -> String {
        document_key(self.kind, self.object_id)
    }
}

fn document_key(kind: SearchKind, id: i64) -> String {
    format!("{}:{}", kind.as_str(), id)
}

/// Rich text to plain text for indexing.
fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

/// Search result with relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub object_id: i64,
    pub title: String,
    pub url: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    key: Field,
    kind: Field,
    object_id: Field,
    title: Field,
    body: Field,
    url: Field,
}

/// Tantivy search index over site content.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema
        let mut schema_builder = Schema::builder();
        let key = schema_builder.add_text_field("key", STRING);
        let kind = schema_builder.add_text_field("kind", STRING | STORED);
        let object_id = schema_builder.add_i64_field("object_id", STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let body = schema_builder.add_text_field("body", TEXT);
        let url = schema_builder.add_text_field("url", STORED);
        let schema = schema_builder.build();

        let fields = SearchFields {
            key,
            kind,
            object_id,
            title,
            body,
            url,
        };

        // An index written with a different schema is discarded; it is
        // rebuilt from the database anyway
        let index = match Index::open_in_dir(index_path) {
            Ok(existing) if existing.schema() == schema => existing,
            Ok(_) => {
                tracing::warn!("Search index schema changed, recreating {:?}", index_path);
                std::fs::remove_dir_all(index_path)
                    .and_then(|_| std::fs::create_dir_all(index_path))
                    .map_err(|e| AppError::Search(format!("Failed to reset index directory: {}", e)))?;
                Index::create_in_dir(index_path, schema)?
            }
            Err(_) => Index::create_in_dir(index_path, schema)
                .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?,
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with `documents`.
    pub async fn rebuild(&self, documents: &[SearchDocument]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for document in documents {
            writer.add_document(self.create_document(document))?;
        }
        writer.commit()?;

        // Reload reader to see new documents
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} documents", documents.len());
        Ok(())
    }

    /// Add or replace a single document.
    pub async fn index_document(&self, document: &SearchDocument) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.key, &document.key()));
        writer.add_document(self.create_document(document))?;
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Remove documents of one kind from the index.
    pub async fn remove(&self, kind: SearchKind, object_ids: &[i64]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        for id in object_ids {
            writer.delete_term(Term::from_field_text(
                self.fields.key,
                &document_key(kind, *id),
            ));
        }
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Search the index. Returns one page of hits and the total match count.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<SearchHit>, usize), AppError> {
        if query_str.trim().is_empty() {
            return Ok((Vec::new(), 0));
        }

        let searcher = self.reader.searcher();

        // Boost each field separately and combine with OR semantics
        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in [(self.fields.title, BOOST_TITLE), (self.fields.body, BOOST_BODY)] {
            let parser = QueryParser::for_index(&self.index, vec![field]);
            let (field_query, errors) = parser.parse_query_lenient(query_str);
            if !errors.is_empty() {
                tracing::debug!("Lenient parse of '{}' dropped: {:?}", query_str, errors);
            }
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let combined_query = BooleanQuery::new(subqueries);

        // Never collect more than the index holds
        let fetch = limit
            .saturating_add(offset)
            .min(searcher.num_docs() as usize)
            .max(1);
        let (top_docs, total) = searcher
            .search(&combined_query, &(TopDocs::with_limit(fetch), Count))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                Some(SearchHit {
                    kind: SearchKind::parse(doc.get_first(self.fields.kind)?.as_str()?)?,
                    object_id: doc.get_first(self.fields.object_id)?.as_i64()?,
                    title: doc.get_first(self.fields.title)?.as_str()?.to_string(),
                    url: doc.get_first(self.fields.url)?.as_str()?.to_string(),
                    score,
                })
            })
            .collect();

        Ok((hits, total))
    }

    fn create_document(&self, document: &SearchDocument) -> TantivyDocument {
        doc!(
            self.fields.key => document.key(),
            self.fields.kind => document.kind.as_str().to_string(),
            self.fields.object_id => document.object_id,
            self.fields.title => document.title.clone(),
            self.fields.body => document.body.clone(),
            self.fields.url => document.url.clone()
        )
    }
}

/// Everything that belongs in the index: live pages and all team members.
pub async fn collect_documents(repo: &Repository) -> Result<Vec<SearchDocument>, AppError> {
    let pages = repo
        .list_pages(&PageFilter {
            live_only: true,
            ..PageFilter::default()
        })
        .await?;
    let members = repo.list_team_members().await?;

    let mut documents = Vec::with_capacity(pages.len() + members.len());
    for page in &pages {
        documents.push(SearchDocument::from_page(page)?);
    }
    documents.extend(members.iter().map(SearchDocument::from_member));
    Ok(documents)
}

/// Rebuild the index from the database.
pub async fn rebuild_from(repo: &Repository, index: &SearchIndex) -> Result<usize, AppError> {
    let documents = collect_documents(repo).await?;
    index.rebuild(&documents).await?;
    Ok(documents.len())
}
