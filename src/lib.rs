//! Tululu-Downloader: a book downloader for tululu.org
//!
//! This crate fetches book detail pages, extracts their metadata and saves the book text,
//! cover image and reader comments to local folders. Unknown books are detected through the
//! redirects the site answers them with, and text downloads are retried on connection failures.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Tululu-Downloader operations
#[derive(Debug, Error)]
pub enum TululuError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request to {url} failed: {source}")]
    Fetch {
        url: String,
        source: crawler::FetchError,
    },

    #[error("Book page {url} redirected to {final_url}")]
    Redirected { url: String, final_url: String },

    #[error("HTML parse error for {url}: {source}")]
    HtmlParse {
        url: String,
        source: crawler::ParseError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tululu-Downloader operations
pub type Result<T> = std::result::Result<T, TululuError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Downloader, FetchResult, RedirectGuard, RetryOutcome, RetryPolicy};
pub use state::BookOutcome;
pub use crate::url::SiteUrls;
