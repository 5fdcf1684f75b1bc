//! Site Content Backend
//!
//! REST read API for a CMS-backed company website: pages, blog, and team
//! directory, with SQLite persistence and Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod errors;
mod logging;
mod models;
mod projection;
mod registry;
mod search;
mod seed;
mod tagging;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use errors::AppError;
use projection::Projector;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    pub projector: Arc<Projector>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, search: Arc<SearchIndex>, config: Config) -> Self {
        let projector = Arc::new(Projector::new(repo.clone(), config.media()));
        Self {
            repo,
            search,
            config: Arc::new(config),
            projector,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    logging::init_logging(&config);

    tracing::info!("Starting Site Content Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SITE_API_PSK). Admin routes are unauthenticated!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if config.seed_sample_team {
        seed::seed_sample_team(&repo).await?;
    }

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let indexed = search::rebuild_from(&repo, &search).await?;
    tracing::info!("Search index built with {} documents", indexed);

    let bind_addr = config.bind_addr;
    let state = AppState::new(repo, search, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let team_routes = Router::new()
        .route("/members/", get(api::list_team_members))
        .route("/members/{id}/", get(api::get_team_member))
        .route("/departments/", get(api::list_departments))
        .route("/departments/{id}/", get(api::get_department))
        .route("/stats/", get(api::team_stats))
        .route("/directory/", get(api::team_directory));

    let blog_routes = Router::new()
        .route("/indexes/{id}/posts/", get(api::list_index_posts))
        .route("/tags/", get(api::list_tagged_posts))
        .route("/posts/{id}/", get(api::get_blog_post));

    let content_routes = Router::new()
        .route("/pages/", get(api::list_pages))
        .route("/pages/{id}/", get(api::get_page))
        .route("/images/", get(api::list_images))
        .route("/images/{id}/", get(api::get_image))
        .route("/documents/", get(api::list_documents))
        .route("/documents/{id}/", get(api::get_document));

    let admin_routes = Router::new()
        .route("/seed/team", post(api::seed_team))
        .route("/search/rebuild", post(api::rebuild_search))
        .route("/departments/{id}", delete(api::delete_department))
        .route("/pages/{id}", delete(api::delete_page))
        .route("/images/{id}", delete(api::delete_image))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    let api_routes = Router::new()
        .nest("/team", team_routes)
        .nest("/blog", blog_routes)
        .nest("/v2", content_routes)
        .route("/search/", get(api::search_content))
        .nest("/admin", admin_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.repo.ping().await?;
    Ok("OK")
}

#[cfg(test)]
mod tests;
