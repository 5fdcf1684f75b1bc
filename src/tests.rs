//! Integration tests for the site content backend.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::{Config, LogFormat};
use crate::db::{init_database, Repository};
use crate::models::*;
use crate::search::SearchIndex;
use crate::{create_router, AppState};

const TEST_PSK: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    _temp_dir: TempDir,
}

fn test_config(temp_dir: &TempDir, psk: Option<String>) -> Config {
    Config {
        api_psk: psk,
        db_path: temp_dir.path().join("test.sqlite"),
        index_path: temp_dir.path().join("index"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
        base_url: "http://testserver".to_string(),
        media_url: "/media/".to_string(),
        seed_sample_team: false,
    }
}

async fn test_state(temp_dir: &TempDir, psk: Option<String>) -> AppState {
    let config = test_config(temp_dir, psk);
    let pool = init_database(&config.db_path).await.expect("Failed to init DB");
    let repo = Arc::new(Repository::new(pool));
    let search = Arc::new(SearchIndex::open(&config.index_path).expect("Failed to init search"));
    AppState::new(repo, search, config)
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(TEST_PSK.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = test_state(&temp_dir, psk.clone()).await;
        let repo = state.repo.clone();

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.post(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn seed(&self) {
        let (status, _) = self.post("/api/admin/seed/team").await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn department_id(&self, name: &str) -> i64 {
        self.repo
            .find_department_by_name(name)
            .await
            .unwrap()
            .expect("department exists")
            .id
    }

    async fn home(&self) -> Page {
        self.repo
            .create_page(None, &NewPage::new("Home", PageContent::Standard(StandardPage::default())))
            .await
            .unwrap()
    }
}

fn names(results: &Value) -> Vec<String> {
    results
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect()
}

fn titles(items: &Value) -> Vec<String> {
    items
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["title"].as_str().unwrap().to_string())
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==================== HEALTH AND AUTH ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_router_serves_health_without_network() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir, None).await);

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn test_admin_requires_psk() {
    let fixture = TestFixture::new().await;
    let anonymous = Client::new();

    // Request without API key
    let resp = anonymous
        .post(fixture.url("/api/admin/search/rebuild"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Request with wrong API key
    let resp = anonymous
        .post(fixture.url("/api/admin/search/rebuild"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Bearer token is accepted too
    let resp = anonymous
        .post(fixture.url("/api/admin/search/rebuild"))
        .bearer_auth(TEST_PSK)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Public routes need no key
    let resp = anonymous
        .get(fixture.url("/api/team/members/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_admin_open_without_configured_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let (status, body) = fixture.post("/api/admin/search/rebuild").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["indexed"], 0);
}

// ==================== TEAM ====================

#[tokio::test]
async fn test_seed_endpoint_is_idempotent() {
    let fixture = TestFixture::new().await;

    let (_, first) = fixture.post("/api/admin/seed/team").await;
    assert_eq!(first["departments_created"], 3);
    assert_eq!(first["members_created"], 3);

    let (_, second) = fixture.post("/api/admin/seed/team").await;
    assert_eq!(second["departments_created"], 0);
    assert_eq!(second["members_created"], 0);
}

#[tokio::test]
async fn test_list_members_default_order_and_shape() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, body) = fixture.get("/api/team/members/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert!(body["next"].is_null());
    assert!(body["previous"].is_null());
    assert_eq!(
        names(&body["results"]),
        vec!["John Smith", "Mike Chen", "Sarah Johnson"]
    );

    let john = &body["results"][0];
    assert_eq!(john["department"]["name"], "Engineering");
    assert_eq!(john["specialty_list"][1], "Django");
    assert_eq!(john["years_experience"], 8);
    assert!(john["photo_thumbnail"].is_null());
    assert!(john["social_links"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_members_filters_and_search() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (_, body) = fixture.get("/api/team/members/?is_featured=true").await;
    assert_eq!(names(&body["results"]), vec!["John Smith", "Sarah Johnson"]);

    let (_, body) = fixture.get("/api/team/members/?is_featured=0").await;
    assert_eq!(names(&body["results"]), vec!["Mike Chen"]);

    let (_, body) = fixture.get("/api/team/members/?is_active=").await;
    assert_eq!(body["count"], 3);

    let engineering = fixture.department_id("Engineering").await;
    let (_, body) = fixture
        .get(&format!("/api/team/members/?department={}", engineering))
        .await;
    assert_eq!(names(&body["results"]), vec!["John Smith"]);

    let (_, body) = fixture.get("/api/team/members/?search=figma").await;
    assert_eq!(names(&body["results"]), vec!["Mike Chen"]);

    // Every term must match
    let (_, body) = fixture.get("/api/team/members/?search=python,%20django").await;
    assert_eq!(names(&body["results"]), vec!["John Smith"]);
    let (_, body) = fixture.get("/api/team/members/?search=python%20figma").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_list_members_ordering() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (_, body) = fixture.get("/api/team/members/?ordering=-name").await;
    assert_eq!(
        names(&body["results"]),
        vec!["Sarah Johnson", "Mike Chen", "John Smith"]
    );

    let (_, body) = fixture.get("/api/team/members/?ordering=job_title").await;
    assert_eq!(
        names(&body["results"]),
        vec!["Sarah Johnson", "John Smith", "Mike Chen"]
    );

    let (status, body) = fixture.get("/api/team/members/?ordering=email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_members_rejects_bad_parameters() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, _) = fixture.get("/api/team/members/?colour=blue").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fixture.get("/api/team/members/?department=9999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fixture.get("/api/team/members/?is_active=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_members_pagination() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (_, body) = fixture.get("/api/team/members/?page_size=1").await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["next"],
        "http://testserver/api/team/members/?page_size=1&page=2"
    );

    let (_, body) = fixture.get("/api/team/members/?page_size=1&page=2").await;
    assert_eq!(names(&body["results"]), vec!["Mike Chen"]);
    assert_eq!(body["previous"], "http://testserver/api/team/members/?page_size=1");

    // Oversized and invalid page sizes
    let (_, body) = fixture.get("/api/team/members/?page_size=1000").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    let (_, body) = fixture.get("/api/team/members/?page_size=abc").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 3);

    let (status, body) = fixture.get("/api/team/members/?page=2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Invalid page.");

    let (status, _) = fixture.get("/api/team/members/?page=zero").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_member_list_has_first_page() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/team/members/?page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_member_detail_and_departments() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let mike = fixture
        .repo
        .find_team_member_by_name("Mike Chen")
        .await
        .unwrap()
        .unwrap();
    let (status, body) = fixture.get(&format!("/api/team/members/{}/", mike.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_title"], "UX Designer");

    let (status, body) = fixture.get("/api/team/members/9999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (_, body) = fixture.get("/api/team/departments/").await;
    assert_eq!(names(&body), vec!["Design", "Engineering", "Marketing"]);

    let marketing = fixture.department_id("Marketing").await;
    let (_, body) = fixture
        .get(&format!("/api/team/departments/{}/", marketing))
        .await;
    assert_eq!(body["description"], "Spreading the word about our awesome work");

    let (status, _) = fixture.get("/api/team/departments/9999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_team_stats() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let mut retired = NewTeamMember::new("Old Timer", "Retired");
    retired.is_active = false;
    fixture.repo.create_team_member(&retired).await.unwrap();
    fixture
        .repo
        .create_department(&NewDepartment {
            name: "Legal".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();

    let (_, stats) = fixture.get("/api/team/stats/").await;
    assert_eq!(stats["total_members"], 4);
    assert_eq!(stats["active_members"], 3);
    assert_eq!(stats["featured_members"], 2);
    assert_eq!(stats["departments"], 4);
    assert_eq!(stats["departments_with_members"], 3);
}

#[tokio::test]
async fn test_directory_views() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let engineering = fixture.department_id("Engineering").await;
    let mut intern = NewTeamMember::new("Ada Intern", "Intern");
    intern.department_id = Some(engineering);
    intern.is_active = false;
    fixture.repo.create_team_member(&intern).await.unwrap();

    // Flat, active only by default
    let (_, body) = fixture.get("/api/team/directory/").await;
    assert_eq!(
        names(&body),
        vec!["John Smith", "Mike Chen", "Sarah Johnson"]
    );

    let (_, body) = fixture.get("/api/team/directory/?only_active=false").await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    // Grouped and featured only: Design loses its only member and is omitted
    let (_, body) = fixture
        .get("/api/team/directory/?grouped=true&only_featured=true")
        .await;
    let groups = body.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["department"]["name"], "Engineering");
    assert_eq!(names(&groups[0]["members"]), vec!["John Smith"]);
    assert_eq!(groups[1]["department"]["name"], "Marketing");

    let (status, _) = fixture.get("/api/team/directory/?sort=name").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_team_page_shows_directory() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;
    let home = fixture.home().await;

    let team = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new(
                "Our Team",
                PageContent::Team(TeamPage {
                    intro: "<p>Meet us</p>".to_string(),
                    show_departments: true,
                    show_only_active: true,
                    show_only_featured: true,
                }),
            ),
        )
        .await
        .unwrap();

    let (_, body) = fixture.get(&format!("/api/v2/pages/{}/", team.meta.id)).await;
    assert_eq!(body["meta"]["type"], "team.TeamPage");
    assert_eq!(
        names(&body["team_members"]),
        vec!["John Smith", "Sarah Johnson"]
    );
    assert_eq!(body["departments"].as_array().unwrap().len(), 2);
}

// ==================== BLOG ====================

struct BlogFixture {
    fixture: TestFixture,
    index_id: i64,
    older_id: i64,
    newer_id: i64,
}

async fn blog_fixture() -> BlogFixture {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let index = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new("Blog", PageContent::BlogIndex(BlogIndexPage::default())),
        )
        .await
        .unwrap();

    let author = fixture
        .repo
        .create_author(&NewAuthor {
            name: "Jane Writer".to_string(),
            image_id: None,
        })
        .await
        .unwrap();

    let mut older = NewBlogPost::new("Learning Rust", date(2024, 1, 15), "First steps");
    older.tags = vec!["Rust".to_string(), "Tutorial".to_string()];
    older.author_ids = vec![author.id];
    let older = fixture.repo.create_blog_post(index.meta.id, &older).await.unwrap();

    let mut newer = NewBlogPost::new("Oxidation", date(2024, 2, 1), "Corrosion notes");
    newer.tags = vec!["rust".to_string()];
    let newer = fixture.repo.create_blog_post(index.meta.id, &newer).await.unwrap();

    let mut draft = NewBlogPost::new("Unfinished", date(2024, 3, 1), "Not yet");
    draft.tags = vec!["Rust".to_string()];
    draft.live = false;
    fixture.repo.create_blog_post(index.meta.id, &draft).await.unwrap();

    BlogFixture {
        fixture,
        index_id: index.meta.id,
        older_id: older.meta.id,
        newer_id: newer.meta.id,
    }
}

#[tokio::test]
async fn test_tag_filter_is_exact_and_case_sensitive() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    let (_, body) = fixture.get("/api/blog/tags/?tag=Rust").await;
    assert_eq!(body["meta"]["total_count"], 1);
    assert_eq!(titles(&body["items"]), vec!["Learning Rust"]);

    let (_, body) = fixture.get("/api/blog/tags/?tag=rust").await;
    assert_eq!(titles(&body["items"]), vec!["Oxidation"]);

    let (_, body) = fixture.get("/api/blog/tags/?tag=Rus").await;
    assert_eq!(body["meta"]["total_count"], 0);
}

#[tokio::test]
async fn test_absent_or_blank_tag_lists_all_live_posts() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    for path in ["/api/blog/tags/", "/api/blog/tags/?tag=", "/api/blog/tags/?tag=%20%20"] {
        let (status, body) = fixture.get(path).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(titles(&body["items"]), vec!["Oxidation", "Learning Rust"], "{}", path);
    }

    let (status, _) = fixture.get("/api/blog/tags/?tags=Rust").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blog_index_posts_newest_first() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    let (status, body) = fixture
        .get(&format!("/api/blog/indexes/{}/posts/", blog.index_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body["items"]), vec!["Oxidation", "Learning Rust"]);

    let (_, body) = fixture
        .get(&format!("/api/blog/indexes/{}/posts/?limit=1&offset=1", blog.index_id))
        .await;
    assert_eq!(body["meta"]["total_count"], 2);
    assert_eq!(titles(&body["items"]), vec!["Learning Rust"]);

    // A blog post is not an index
    let (status, _) = fixture
        .get(&format!("/api/blog/indexes/{}/posts/", blog.older_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_post_detail() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    let (status, body) = fixture
        .get(&format!("/api/blog/posts/{}/", blog.older_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["type"], "blog.BlogPage");
    assert_eq!(body["meta"]["slug"], "learning-rust");
    assert_eq!(body["meta"]["parent"]["id"], blog.index_id);
    assert_eq!(body["date"], "2024-01-15");
    assert_eq!(body["date_display"], "Monday 15 January 2024");
    assert_eq!(body["tags"][0], "Rust");
    assert_eq!(body["tags"][1], "Tutorial");
    assert_eq!(body["authors"][0]["name"], "Jane Writer");
    assert!(body["main_image"].is_null());

    let (status, _) = fixture
        .get(&format!("/api/blog/posts/{}/", blog.index_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== CONTENT API ====================

#[tokio::test]
async fn test_pages_listing_filters() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    let (status, body) = fixture.get("/api/v2/pages/").await;
    assert_eq!(status, StatusCode::OK);
    // Home, Blog and the two live posts
    assert_eq!(body["meta"]["total_count"], 4);
    let first = &body["items"][0];
    assert_eq!(first["meta"]["html_url"], "http://testserver/");
    assert!(first["meta"].get("parent").is_none());

    let (_, body) = fixture.get("/api/v2/pages/?type=blog.BlogPage").await;
    assert_eq!(titles(&body["items"]), vec!["Learning Rust", "Oxidation"]);

    let (_, body) = fixture
        .get(&format!("/api/v2/pages/?child_of={}", blog.index_id))
        .await;
    assert_eq!(body["meta"]["total_count"], 2);

    let (_, body) = fixture.get("/api/v2/pages/?limit=1&offset=1").await;
    assert_eq!(titles(&body["items"]), vec!["Blog"]);

    for bad in [
        "/api/v2/pages/?type=blog.Nope",
        "/api/v2/pages/?limit=21",
        "/api/v2/pages/?offset=-1",
        "/api/v2/pages/?child_of=9999",
        "/api/v2/pages/?order=title",
    ] {
        let (status, _) = fixture.get(bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
    }
}

#[tokio::test]
async fn test_page_detail_excludes_drafts() {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let draft = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new("Secret", PageContent::About(AboutPage::default())).draft(),
        )
        .await
        .unwrap();

    let (status, _) = fixture.get(&format!("/api/v2/pages/{}/", draft.meta.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = fixture.get(&format!("/api/v2/pages/{}/", home.meta.id)).await;
    assert!(body["meta"]["parent"].is_null());
}

#[tokio::test]
async fn test_service_page_placement() {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let service = NewPage::new("Consulting", PageContent::Service(ServicePage::default()));
    let err = fixture
        .repo
        .create_page(Some(home.meta.id), &service)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::errors::AppError::Validation(_)));

    let services = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new("Services", PageContent::Services(ServicesPage::default())),
        )
        .await
        .unwrap();
    fixture
        .repo
        .create_page(Some(services.meta.id), &service)
        .await
        .unwrap();

    let about = NewPage::new("About", PageContent::About(AboutPage::default()));
    assert!(fixture
        .repo
        .create_page(Some(services.meta.id), &about)
        .await
        .is_err());
}

#[tokio::test]
async fn test_rich_text_is_expanded() {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let image = fixture
        .repo
        .create_image(&NewImage {
            title: "Office".to_string(),
            file: "original_images/office.jpg".to_string(),
            width: 1600,
            height: 1200,
        })
        .await
        .unwrap();
    let document = fixture
        .repo
        .create_document(&NewDocument {
            title: "Brochure".to_string(),
            file: "documents/brochure.pdf".to_string(),
        })
        .await
        .unwrap();
    let about = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new("About Us", PageContent::About(AboutPage::default())),
        )
        .await
        .unwrap();

    let body = format!(
        r#"<p><a linktype="page" id="{}">About</a> <a linktype="document" id="{}">PDF</a> <a linktype="page" id="9999">Gone</a></p><embed embedtype="image" id="{}" format="fullwidth" alt="Our office"/><embed embedtype="media" url="https://example.com/v"/>"#,
        about.meta.id, document.id, image.id
    );
    let page = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new(
                "Welcome",
                PageContent::Standard(StandardPage {
                    intro: String::new(),
                    header_image: Some(image.id),
                    body,
                }),
            ),
        )
        .await
        .unwrap();

    let (_, view) = fixture.get(&format!("/api/v2/pages/{}/", page.meta.id)).await;
    let html = view["body"].as_str().unwrap();
    assert!(html.contains(r#"<a href="/about-us/">About</a>"#), "{}", html);
    assert!(html.contains(r#"<a href="/media/documents/brochure.pdf">PDF</a>"#));
    assert!(html.contains("<a>Gone</a>"));
    assert!(html.contains(
        r#"<img alt="Our office" class="richtext-image fullwidth" height="600" src="/media/images/office.width-800.jpg" width="800">"#
    ));
    assert!(html.contains(r#"<div class="responsive-object"><a href="https://example.com/v">"#));
    assert_eq!(view["header_image"]["title"], "Office");
}

#[tokio::test]
async fn test_flexible_and_faq_pages() {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let flexible = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new(
                "Landing",
                PageContent::Flexible(FlexiblePage {
                    subtitle: "Hello".to_string(),
                    body: vec![
                        FlexibleBlock::Heading {
                            id: "b1".to_string(),
                            value: "Welcome".to_string(),
                        },
                        FlexibleBlock::Anchor {
                            id: "b2".to_string(),
                            value: "contact".to_string(),
                        },
                    ],
                }),
            ),
        )
        .await
        .unwrap();

    let (_, body) = fixture.get(&format!("/api/v2/pages/{}/", flexible.meta.id)).await;
    assert_eq!(body["subtitle"], "Hello");
    assert_eq!(body["body"][0]["type"], "heading");
    assert_eq!(body["body"][0]["value"], "Welcome");
    assert_eq!(body["body"][0]["id"], "b1");
    assert_eq!(body["body"][1]["type"], "anchor");

    let faq = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new("FAQ", PageContent::Faq(FaqPage::default())),
        )
        .await
        .unwrap();
    for (question, answer) in [("Where?", "<p>Here</p>"), ("When?", "<p>Now</p>")] {
        fixture
            .repo
            .add_faq_item(
                faq.meta.id,
                &NewFaqItem {
                    question: question.to_string(),
                    answer: answer.to_string(),
                },
            )
            .await
            .unwrap();
    }

    let (_, body) = fixture.get(&format!("/api/v2/pages/{}/", faq.meta.id)).await;
    assert_eq!(body["faq_items"][0]["question"], "Where?");
    assert_eq!(body["faq_items"][1]["answer"], "<p>Now</p>");
}

#[tokio::test]
async fn test_images_and_documents() {
    let fixture = TestFixture::new().await;

    let image = fixture
        .repo
        .create_image(&NewImage {
            title: "Team photo".to_string(),
            file: "original_images/team.png".to_string(),
            width: 1000,
            height: 800,
        })
        .await
        .unwrap();
    fixture
        .repo
        .create_document(&NewDocument {
            title: "Handbook".to_string(),
            file: "documents/handbook.pdf".to_string(),
        })
        .await
        .unwrap();

    let (_, body) = fixture.get("/api/v2/images/").await;
    assert_eq!(body["meta"]["total_count"], 1);
    assert!(body["items"][0].get("thumbnail").is_none());

    let (_, body) = fixture.get(&format!("/api/v2/images/{}/", image.id)).await;
    assert_eq!(body["width"], 1000);
    assert_eq!(body["thumbnail"]["width"], 165);
    assert_eq!(body["thumbnail"]["height"], 132);
    assert_eq!(body["thumbnail"]["url"], "/media/images/team.max-165x165.png");
    assert_eq!(
        body["thumbnail"]["full_url"],
        "http://testserver/media/images/team.max-165x165.png"
    );

    let (_, body) = fixture.get("/api/v2/documents/").await;
    assert_eq!(body["items"][0]["title"], "Handbook");
    assert_eq!(body["items"][0]["meta"]["download_url"], "/media/documents/handbook.pdf");

    let (status, _) = fixture.get("/api/v2/documents/9999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_photo_renditions_are_reused() {
    let fixture = TestFixture::new().await;

    let photo = fixture
        .repo
        .create_image(&NewImage {
            title: "Portrait".to_string(),
            file: "original_images/portrait.jpg".to_string(),
            width: 400,
            height: 600,
        })
        .await
        .unwrap();
    let mut member = NewTeamMember::new("Pat Photo", "Photographer");
    member.photo_id = Some(photo.id);
    member.social_links = vec![NewSocialLink {
        platform: SocialPlatform::GitHub,
        url: "https://github.com/pat".to_string(),
    }];
    let member = fixture.repo.create_team_member(&member).await.unwrap();

    let path = format!("/api/team/members/{}/", member.id);
    let (_, first) = fixture.get(&path).await;
    let (_, second) = fixture.get(&path).await;
    assert_eq!(first["photo_medium"], second["photo_medium"]);
    assert_eq!(fixture.repo.count_renditions(photo.id).await.unwrap(), 3);

    assert_eq!(first["photo_thumbnail"]["width"], 150);
    assert_eq!(first["photo_thumbnail"]["height"], 150);
    // Source is smaller than the large box; no upscaling
    assert_eq!(first["photo_large"]["width"], 400);
    assert_eq!(first["photo_large"]["height"], 400);
    assert_eq!(first["photo_thumbnail"]["alt"], "Portrait");
    assert_eq!(first["social_links"][0]["platform"], "github");
    assert_eq!(first["social_links"][0]["platform_display"], "GitHub");
}

// ==================== ADMIN DELETIONS ====================

#[tokio::test]
async fn test_delete_department_keeps_members() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;
    let design = fixture.department_id("Design").await;

    let status = fixture
        .delete(&format!("/api/admin/departments/{}", design))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let mike = fixture
        .repo
        .find_team_member_by_name("Mike Chen")
        .await
        .unwrap()
        .unwrap();
    assert!(mike.department.is_none());

    let (_, body) = fixture.get("/api/team/directory/?grouped=1").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let status = fixture
        .delete(&format!("/api/admin/departments/{}", design))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_page_removes_subtree() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;

    let status = fixture
        .delete(&format!("/api/admin/pages/{}", blog.index_id))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = fixture
        .get(&format!("/api/blog/posts/{}/", blog.newer_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(fixture.repo.blog_relations(blog.older_id).await.unwrap().tags.is_empty());

    let (_, body) = fixture.get("/api/blog/tags/").await;
    assert_eq!(body["meta"]["total_count"], 0);
}

#[tokio::test]
async fn test_delete_image_clears_references() {
    let fixture = TestFixture::new().await;
    let home = fixture.home().await;

    let image = fixture
        .repo
        .create_image(&NewImage {
            title: "Banner".to_string(),
            file: "original_images/banner.jpg".to_string(),
            width: 1200,
            height: 400,
        })
        .await
        .unwrap();
    let mut member = NewTeamMember::new("Sam Banner", "Designer");
    member.photo_id = Some(image.id);
    let member = fixture.repo.create_team_member(&member).await.unwrap();
    let page = fixture
        .repo
        .create_page(
            Some(home.meta.id),
            &NewPage::new(
                "Landing",
                PageContent::Standard(StandardPage {
                    header_image: Some(image.id),
                    ..StandardPage::default()
                }),
            ),
        )
        .await
        .unwrap();

    // Materialise renditions first
    fixture.get(&format!("/api/team/members/{}/", member.id)).await;
    assert_eq!(fixture.repo.count_renditions(image.id).await.unwrap(), 3);

    let status = fixture.delete(&format!("/api/admin/images/{}", image.id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = fixture.get(&format!("/api/team/members/{}/", member.id)).await;
    assert!(body["photo_thumbnail"].is_null());
    let (_, body) = fixture.get(&format!("/api/v2/pages/{}/", page.meta.id)).await;
    assert!(body["header_image"].is_null());
    assert_eq!(fixture.repo.count_renditions(image.id).await.unwrap(), 0);
}

// ==================== SEARCH ====================

#[tokio::test]
async fn test_search_after_rebuild() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;
    fixture.seed().await;

    let (_, body) = fixture.post("/api/admin/search/rebuild").await;
    // Home, Blog, two live posts, three members
    assert_eq!(body["indexed"], 7);

    let (status, body) = fixture.get("/api/search/?q=figma").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["kind"], "team_member");
    assert_eq!(body["results"][0]["title"], "Mike Chen");

    let (_, body) = fixture.get("/api/search/?q=corrosion").await;
    assert_eq!(body["results"][0]["kind"], "page");
    assert_eq!(body["results"][0]["id"], blog.newer_id);

    // Drafts are not indexed
    let (_, body) = fixture.get("/api/search/?q=unfinished").await;
    assert_eq!(body["total"], 0);

    let (_, body) = fixture.get("/api/search/?q=rust&limit=500").await;
    assert_eq!(body["limit"], 100);

    let (status, _) = fixture.get("/api/search/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_offset_is_bounded() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, body) = fixture.get("/api/search/?q=John&offset=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["offset"], 5);
    assert!(body["results"].as_array().unwrap().is_empty());

    let (status, body) = fixture.get("/api/search/?q=x&offset=100000000000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = fixture
        .get("/api/search/?q=x&offset=18446744073709551615")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Server is still up
    let (status, _) = fixture.get("/api/search/?q=John").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_seeded_members_are_searchable_immediately() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (_, body) = fixture.get("/api/search/?q=seo").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["title"], "Sarah Johnson");
}

#[tokio::test]
async fn test_deleted_pages_leave_search_index() {
    let blog = blog_fixture().await;
    let fixture = &blog.fixture;
    fixture.post("/api/admin/search/rebuild").await;

    fixture
        .delete(&format!("/api/admin/pages/{}", blog.index_id))
        .await;

    let (_, body) = fixture.get("/api/search/?q=corrosion").await;
    assert_eq!(body["total"], 0);
}
