//! Crawler module for book fetching and processing
//!
//! This module contains the core download logic, including:
//! - HTTP fetching with redirect-following disabled
//! - Redirect detection for books the site does not have
//! - Bounded retry for text downloads
//! - HTML parsing of book and catalog pages
//! - The per-book driver loop

mod coordinator;
mod fetcher;
mod parser;
mod redirect;
mod retry;

pub use coordinator::{Downloader, Selection};
pub use fetcher::{build_http_client, FetchError, FetchResult, Fetcher, HttpFetcher};
pub use parser::{parse_book_page, parse_category_page, BookDescription, ParseError};
pub use redirect::RedirectGuard;
pub use retry::{RetryFailure, RetryOutcome, RetryPolicy, Sleeper, TokioSleeper};

use crate::config::Config;
use crate::output::RunStatistics;
use crate::TululuError;

/// Runs a complete download
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client
/// 2. Walk the selected books one at a time
/// 3. Save each book's comments, text and cover
/// 4. Stream the descriptions to the configured JSON file
///
/// # Arguments
///
/// * `config` - The downloader configuration
/// * `selection` - The books to download
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Per-book outcomes of the run
/// * `Err(TululuError)` - The run could not start or its JSON output could not be written
pub async fn download(config: Config, selection: &Selection) -> Result<RunStatistics, TululuError> {
    Downloader::new(config)?.run(selection).await
}
