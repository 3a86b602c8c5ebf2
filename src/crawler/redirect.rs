//! Redirect guard
//!
//! tululu.org answers unknown or removed book identifiers with a 302 to its homepage
//! instead of a 404. The guard turns that redirect back into a "does not exist" signal.
//!
//! The guard is history based: a response is invalid when a redirect occurred. Since the
//! HTTP client never follows redirects, "a redirect occurred" is the same as the response
//! carrying a 3xx status, which `FetchResult::redirected` records. Comparing the final URL
//! with the requested one is never used, so every request is judged the same way.

use crate::crawler::fetcher::FetchResult;
use url::Url;

/// Decides whether a response is a genuine answer for the requested resource
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectGuard;

impl RedirectGuard {
    pub fn new() -> Self {
        Self
    }

    /// Returns false when the response signals a missing resource through a redirect
    ///
    /// # Examples
    ///
    /// ```
    /// use tululu_downloader::crawler::{FetchResult, RedirectGuard};
    /// use url::Url;
    ///
    /// let requested = Url::parse("https://tululu.org/b1/").unwrap();
    /// let redirected = FetchResult {
    ///     final_url: "https://tululu.org/".to_string(),
    ///     status_code: 302,
    ///     body: Vec::new(),
    ///     redirected: true,
    /// };
    /// assert!(!RedirectGuard::new().is_valid(&requested, &redirected));
    /// ```
    pub fn is_valid(&self, requested_url: &Url, result: &FetchResult) -> bool {
        if result.redirected {
            tracing::debug!(
                "{} redirected to {} (status {})",
                requested_url,
                result.final_url,
                result.status_code
            );
            return false;
        }
        true
    }
}
