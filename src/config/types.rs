use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Tululu-Downloader
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Target site layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the site, book pages live at `<base-url>b<id>/`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Catalog path relative to the base URL, pages live at `<category-path><page>/`
    #[serde(rename = "category-path")]
    pub category_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tululu.org/".to_string(),
            category_path: "l55/".to_string(),
        }
    }
}

/// Retry behavior for text downloads
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per download
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts after a connection failure (seconds)
    #[serde(rename = "delay-seconds")]
    pub delay_seconds: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_seconds: 5,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout; reqwest's default (none) when absent
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tululu-downloader/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder all other output paths are relative to
    #[serde(rename = "dest-folder")]
    pub dest_folder: PathBuf,

    /// Folder for book texts
    #[serde(rename = "books-folder")]
    pub books_folder: String,

    /// Folder for cover images
    #[serde(rename = "images-folder")]
    pub images_folder: String,

    /// Folder for reader comments
    #[serde(rename = "comments-folder")]
    pub comments_folder: String,

    /// JSON file the book descriptions are streamed to; an empty path turns the output off
    #[serde(rename = "json-path")]
    pub json_path: Option<PathBuf>,

    /// Skip cover image downloads
    #[serde(rename = "skip-imgs")]
    pub skip_imgs: bool,

    /// Skip text downloads
    #[serde(rename = "skip-txt")]
    pub skip_txt: bool,
}

impl OutputConfig {
    pub fn books_dir(&self) -> PathBuf {
        self.dest_folder.join(&self.books_folder)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dest_folder.join(&self.images_folder)
    }

    pub fn comments_dir(&self) -> PathBuf {
        self.dest_folder.join(&self.comments_folder)
    }

    pub fn json_file(&self) -> Option<PathBuf> {
        self.json_path
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
            .map(|path| self.dest_folder.join(path))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_folder: PathBuf::from("."),
            books_folder: "books".to_string(),
            images_folder: "images".to_string(),
            comments_folder: "comments".to_string(),
            json_path: Some(PathBuf::from("book_descriptions.json")),
            skip_imgs: false,
            skip_txt: false,
        }
    }
}
