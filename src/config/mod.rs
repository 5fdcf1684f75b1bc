//! Configuration module for the site backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Invalid SITE_LOG_FORMAT '{}', expected 'pretty' or 'json'",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Scheme and host used for absolute URLs (`full_url`, pagination links)
    pub base_url: String,
    /// URL prefix under which image and document files are served
    pub media_url: String,
    /// Create the sample departments and members at start-up
    pub seed_sample_team: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SITE_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("SITE_DB_PATH")
            .unwrap_or_else(|_| "./data/site.sqlite".to_string())
            .into();

        let index_path = env::var("SITE_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("SITE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SITE_BIND_ADDR: {}", e)))?;

        let log_level = env::var("SITE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = env::var("SITE_LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .parse()?;

        let base_url = env::var("SITE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let mut media_url = env::var("SITE_MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        let seed_sample_team = env::var("SITE_SEED_SAMPLE_TEAM")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_format,
            base_url,
            media_url,
            seed_sample_team,
        })
    }

    /// Settings the projection layer needs to build file URLs.
    pub fn media(&self) -> MediaSettings {
        MediaSettings {
            base_url: self.base_url.clone(),
            media_url: self.media_url.clone(),
        }
    }
}

/// URL prefixes for rendered media.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub base_url: String,
    pub media_url: String,
}

impl MediaSettings {
    /// Site-relative URL of a stored media file.
    pub fn file_url(&self, file: &str) -> String {
        format!("{}{}", self.media_url, file)
    }

    /// Absolute form of a site-relative URL.
    pub fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }
}
