//! Download coordinator - main driver loop
//!
//! This module contains the loop that walks the selected books one at a time:
//! - Fetching the book page and skipping books the site redirects away from
//! - Parsing the page into a `BookDescription`
//! - Saving comments, the text (through the retry policy) and the cover
//! - Streaming each finished description to the JSON sink
//!
//! Every failure is scoped to one book; the loop always moves on to the next one.

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::crawler::parser::{parse_book_page, parse_category_page, BookDescription};
use crate::crawler::redirect::RedirectGuard;
use crate::crawler::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::output::{JsonArrayWriter, RunStatistics};
use crate::state::BookOutcome;
use crate::storage::{image_extension, BookStorage, FsStorage};
use crate::url::{book_id_from_url, SiteUrls};
use crate::TululuError;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

type DescriptionSink = JsonArrayWriter<BufWriter<File>>;

/// Which books a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Book identifiers `start_id..=end_id`
    Range { start_id: u32, end_id: u32 },

    /// Every book listed on the given catalog pages
    Pages(Vec<u32>),
}

/// Main download coordinator structure
pub struct Downloader {
    config: Config,
    urls: SiteUrls,
    fetcher: Arc<dyn Fetcher>,
    sleeper: Arc<dyn Sleeper>,
    storage: Arc<dyn BookStorage>,
    guard: RedirectGuard,
    retry: RetryPolicy,
}

impl Downloader {
    /// Creates a downloader talking to the real site
    ///
    /// # Returns
    ///
    /// * `Ok(Downloader)` - Ready to run
    /// * `Err(TululuError)` - The HTTP client or the site URL could not be built
    pub fn new(config: Config) -> Result<Self, TululuError> {
        let fetcher = HttpFetcher::from_config(&config.http)?;
        Self::with_parts(config, Arc::new(fetcher), Arc::new(TokioSleeper))
    }

    /// Creates a downloader with explicit fetcher and sleeper implementations
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, TululuError> {
        let urls = SiteUrls::new(&config.site)?;
        let storage = Arc::new(FsStorage::from_config(&config.output));
        let retry = RetryPolicy::from_config(&config.retry);

        Ok(Self {
            config,
            urls,
            fetcher,
            sleeper,
            storage,
            guard: RedirectGuard::new(),
            retry,
        })
    }

    /// Replaces the storage backend
    pub fn with_storage(mut self, storage: Arc<dyn BookStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the given selection
    pub async fn run(&self, selection: &Selection) -> Result<RunStatistics, TululuError> {
        match selection {
            Selection::Range { start_id, end_id } => self.run_range(*start_id, *end_id).await,
            Selection::Pages(pages) => self.run_pages(pages).await,
        }
    }

    /// Downloads books `start_id..=end_id` in order
    ///
    /// Only failing to open or close the JSON sink ends the run early; per-book failures
    /// are recorded in the returned statistics.
    pub async fn run_range(&self, start_id: u32, end_id: u32) -> Result<RunStatistics, TululuError> {
        tracing::info!("Downloading books {} to {}", start_id, end_id);
        if start_id > end_id {
            tracing::warn!("Start id {} is after end id {}, nothing to do", start_id, end_id);
        }

        let mut stats = RunStatistics::start();
        let mut sink = self.open_sink()?;

        for book_id in start_id..=end_id {
            let book_url = self.urls.book_page(book_id)?;
            let outcome = self.process_book(book_id, &book_url, sink.as_mut()).await;
            stats.record(book_id, outcome);
        }

        self.close_sink(sink)?;
        stats.finish();

        tracing::info!(
            "Run finished: {} of {} books saved",
            stats.saved(),
            stats.total_books()
        );
        Ok(stats)
    }

    /// Downloads every book listed on the given catalog pages
    ///
    /// Each page's books are processed as soon as the page is parsed. A catalog page that
    /// fails to load is logged and skipped.
    pub async fn run_pages(&self, pages: &[u32]) -> Result<RunStatistics, TululuError> {
        tracing::info!("Downloading books from {} catalog page(s)", pages.len());

        let mut stats = RunStatistics::start();
        let mut sink = self.open_sink()?;

        for &page in pages {
            let page_url = self.urls.category_page(page)?;

            let links = match self.fetch_category_links(&page_url).await {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!("Skipping catalog page {}: {}", page, e);
                    continue;
                }
            };
            tracing::info!("Catalog page {}: {} book(s)", page, links.len());

            for book_url in links {
                let Some(book_id) = book_id_from_url(&book_url) else {
                    tracing::warn!("No book id in catalog link {}", book_url);
                    continue;
                };
                let outcome = self.process_book(book_id, &book_url, sink.as_mut()).await;
                stats.record(book_id, outcome);
            }
        }

        self.close_sink(sink)?;
        stats.finish();

        tracing::info!(
            "Run finished: {} of {} books saved",
            stats.saved(),
            stats.total_books()
        );
        Ok(stats)
    }

    /// Fetches a catalog page and extracts its book links
    async fn fetch_category_links(&self, page_url: &Url) -> Result<Vec<Url>, TululuError> {
        let page = self
            .fetcher
            .fetch(page_url)
            .await
            .map_err(|source| TululuError::Fetch {
                url: page_url.to_string(),
                source,
            })?;

        if !self.guard.is_valid(page_url, &page) {
            return Err(TululuError::Redirected {
                url: page_url.to_string(),
                final_url: page.final_url,
            });
        }

        parse_category_page(&page.text(), page_url).map_err(|source| TululuError::HtmlParse {
            url: page_url.to_string(),
            source,
        })
    }

    /// Processes a single book
    ///
    /// This method:
    /// 1. Fetches the book page (a redirect means the book does not exist)
    /// 2. Parses the description
    /// 3. Saves the comments, if any
    /// 4. Downloads the text unless text downloads are skipped
    /// 5. Downloads the cover unless image downloads are skipped
    /// 6. Appends the description to the JSON sink
    async fn process_book(
        &self,
        book_id: u32,
        book_url: &Url,
        sink: Option<&mut DescriptionSink>,
    ) -> BookOutcome {
        tracing::debug!("Processing book {} at {}", book_id, book_url);

        let page = match self.fetcher.fetch(book_url).await {
            Ok(page) => page,
            Err(error @ FetchError::Status { .. }) => {
                tracing::warn!("Book {}: page request failed: {}", book_id, error);
                return BookOutcome::HttpError;
            }
            Err(error @ FetchError::Connection { .. }) => {
                tracing::warn!("Book {}: page unreachable: {}", book_id, error);
                return BookOutcome::ConnectionFailed;
            }
            Err(error @ FetchError::Transport { .. }) => {
                tracing::warn!("Book {}: page request failed: {}", book_id, error);
                return BookOutcome::RequestFailed;
            }
        };

        if !self.guard.is_valid(book_url, &page) {
            tracing::info!(
                "Book {} not found: {} redirected to {}",
                book_id,
                book_url,
                page.final_url
            );
            return BookOutcome::NotFound;
        }

        let description = match parse_book_page(&page.text(), book_url) {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!("Book {}: failed to parse {}: {}", book_id, book_url, e);
                return BookOutcome::ParseFailed;
            }
        };
        tracing::info!(
            "Book {}: \"{}\" by {} ({})",
            book_id,
            description.title,
            description.author,
            description.genre
        );

        match self.save_book(book_id, &description, sink).await {
            Ok(()) => BookOutcome::Saved,
            Err(outcome) => outcome,
        }
    }

    /// Writes every artifact of a parsed book, stopping at the first failure
    async fn save_book(
        &self,
        book_id: u32,
        description: &BookDescription,
        sink: Option<&mut DescriptionSink>,
    ) -> Result<(), BookOutcome> {
        if description.comments.is_empty() {
            tracing::debug!("Book {} has no comments", book_id);
        } else {
            let path = self
                .storage
                .save_comments(book_id, &description.title, &description.comments)
                .map_err(|e| {
                    tracing::error!("Book {}: {}", book_id, e);
                    BookOutcome::StorageFailed
                })?;
            tracing::debug!(
                "Book {}: {} comment(s) saved to {}",
                book_id,
                description.comments.len(),
                path.display()
            );
        }

        if !self.config.output.skip_txt {
            let path = self.download_text(book_id, description).await?;
            tracing::debug!("Book {}: text saved to {}", book_id, path.display());
        }

        if !self.config.output.skip_imgs {
            let path = self.download_cover(book_id, description).await?;
            tracing::debug!("Book {}: cover saved to {}", book_id, path.display());
        }

        if let Some(sink) = sink {
            sink.append(description).map_err(|e| {
                tracing::error!("Book {}: failed to record description: {}", book_id, e);
                BookOutcome::StorageFailed
            })?;
        }

        Ok(())
    }

    /// Downloads the book text through the retry policy
    async fn download_text(
        &self,
        book_id: u32,
        description: &BookDescription,
    ) -> Result<PathBuf, BookOutcome> {
        let text_url = self.urls.text_download(book_id).map_err(|e| {
            tracing::warn!("Book {}: invalid text URL: {}", book_id, e);
            BookOutcome::TextUnavailable
        })?;

        let outcome = self
            .retry
            .fetch_with_retry(self.fetcher.as_ref(), self.sleeper.as_ref(), &text_url)
            .await;
        let attempts = outcome.attempts_used;

        let response = outcome.into_result().map_err(|failure| {
            tracing::warn!(
                "Book {}: text unavailable after {} attempt(s): {}",
                book_id,
                attempts,
                failure
            );
            BookOutcome::TextUnavailable
        })?;

        self.storage
            .save_text(book_id, &description.title, &response.text())
            .map_err(|e| {
                tracing::error!("Book {}: {}", book_id, e);
                BookOutcome::StorageFailed
            })
    }

    /// Downloads the cover image (single attempt)
    async fn download_cover(
        &self,
        book_id: u32,
        description: &BookDescription,
    ) -> Result<PathBuf, BookOutcome> {
        let cover_url = Url::parse(&description.cover_url).map_err(|e| {
            tracing::warn!("Book {}: invalid cover URL {}: {}", book_id, description.cover_url, e);
            BookOutcome::ImageUnavailable
        })?;

        let response = self.fetcher.fetch(&cover_url).await.map_err(|e| {
            tracing::warn!("Book {}: cover request failed: {}", book_id, e);
            BookOutcome::ImageUnavailable
        })?;

        if !self.guard.is_valid(&cover_url, &response) {
            tracing::warn!(
                "Book {}: cover {} redirected to {}",
                book_id,
                cover_url,
                response.final_url
            );
            return Err(BookOutcome::ImageUnavailable);
        }

        let extension = image_extension(&description.cover_url);
        self.storage
            .save_image(book_id, &description.title, &extension, &response.body)
            .map_err(|e| {
                tracing::error!("Book {}: {}", book_id, e);
                BookOutcome::StorageFailed
            })
    }

    /// Opens the JSON description sink, if one is configured
    fn open_sink(&self) -> Result<Option<DescriptionSink>, TululuError> {
        let Some(path) = self.config.output.json_file() else {
            return Ok(None);
        };
        tracing::debug!("Writing book descriptions to {}", path.display());
        Ok(Some(JsonArrayWriter::create(&path)?))
    }

    fn close_sink(&self, sink: Option<DescriptionSink>) -> Result<(), TululuError> {
        if let Some(sink) = sink {
            let written = sink.len();
            sink.finish()?;
            tracing::debug!("Recorded {} book description(s)", written);
        }
        Ok(())
    }
}
