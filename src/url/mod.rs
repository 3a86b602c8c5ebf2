//! URL handling module for Tululu-Downloader
//!
//! This module builds the site's book, text-download and catalog URLs and reads
//! book identifiers back out of book page links.

use crate::config::SiteConfig;
use url::{ParseError, Url};

/// URL layout of the target site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    category_path: String,
}

impl SiteUrls {
    /// Builds the site layout from configuration
    pub fn new(site: &SiteConfig) -> Result<Self, ParseError> {
        Ok(Self {
            base: Url::parse(&site.base_url)?,
            category_path: site.category_path.clone(),
        })
    }

    /// The site root
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Book detail page: `<base>b<id>/`
    ///
    /// # Examples
    ///
    /// ```
    /// use tululu_downloader::config::SiteConfig;
    /// use tululu_downloader::url::SiteUrls;
    ///
    /// let urls = SiteUrls::new(&SiteConfig::default()).unwrap();
    /// assert_eq!(urls.book_page(9).unwrap().as_str(), "https://tululu.org/b9/");
    /// ```
    pub fn book_page(&self, book_id: u32) -> Result<Url, ParseError> {
        self.base.join(&format!("b{}/", book_id))
    }

    /// Text download endpoint: `<base>txt.php?id=<id>`
    pub fn text_download(&self, book_id: u32) -> Result<Url, ParseError> {
        let mut url = self.base.join("txt.php")?;
        url.query_pairs_mut()
            .append_pair("id", &book_id.to_string());
        Ok(url)
    }

    /// Catalog listing page: `<base><category-path><page>/`
    pub fn category_page(&self, page: u32) -> Result<Url, ParseError> {
        let category = if self.category_path.is_empty() || self.category_path.ends_with('/') {
            self.base.join(&self.category_path)?
        } else {
            self.base.join(&format!("{}/", self.category_path))?
        };
        category.join(&format!("{}/", page))
    }
}

/// Extracts the book identifier from a book page URL such as `https://tululu.org/b239/`
///
/// Returns None when no path segment has the `b<digits>` shape.
pub fn book_id_from_url(url: &Url) -> Option<u32> {
    url.path_segments()?.find_map(|segment| {
        let digits = segment.strip_prefix('b')?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    })
}
