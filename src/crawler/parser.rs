//! HTML parser for book and catalog pages
//!
//! This module extracts:
//! - Book metadata (title, author, genre, cover URL, reader comments) from a book page
//! - Book page links from a catalog listing page

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Errors raised when a book page lacks the expected markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid selector '{0}'")]
    Selector(&'static str),

    #[error("missing {0}")]
    MissingElement(&'static str),

    #[error("heading '{0}' has no author part")]
    MissingAuthor(String),

    #[error("invalid cover URL '{href}': {message}")]
    InvalidCoverUrl { href: String, message: String },
}

/// Metadata extracted from a book detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDescription {
    #[serde(rename = "Name")]
    pub title: String,

    #[serde(rename = "Author")]
    pub author: String,

    #[serde(rename = "Genre")]
    pub genre: String,

    #[serde(rename = "Cover")]
    pub cover_url: String,

    #[serde(rename = "Comments")]
    pub comments: Vec<String>,
}

fn selector(css: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css))
}

/// Collapses an element's text nodes the way the site's markup expects:
/// every node trimmed, empty nodes dropped, the rest concatenated
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses a book detail page
///
/// # Extraction Rules
///
/// | Field | Source |
/// |-------|--------|
/// | title, author | `h1` text split on `::` |
/// | genre | first `span.d_book a` |
/// | cover | `div.bookimage img[src]`, resolved against `book_url` |
/// | comments | every `div.texts`, empty ones dropped |
///
/// # Example
///
/// ```
/// use tululu_downloader::crawler::parse_book_page;
/// use url::Url;
///
/// let html = r#"<h1>Title :: Author</h1>
///     <span class="d_book">Жанр: <a href="/l55/">Научная фантастика</a></span>
///     <div class="bookimage"><a href="/b1/"><img src="/shots/1.jpg"></a></div>"#;
/// let url = Url::parse("https://tululu.org/b1/").unwrap();
/// let book = parse_book_page(html, &url).unwrap();
/// assert_eq!(book.title, "Title");
/// assert_eq!(book.cover_url, "https://tululu.org/shots/1.jpg");
/// ```
pub fn parse_book_page(html: &str, book_url: &Url) -> Result<BookDescription, ParseError> {
    let document = Html::parse_document(html);

    let heading = document
        .select(&selector("h1")?)
        .next()
        .map(|element| element.text().collect::<String>())
        .ok_or(ParseError::MissingElement("title heading"))?;

    let (title, author) = heading
        .split_once("::")
        .ok_or_else(|| ParseError::MissingAuthor(heading.trim().to_string()))?;
    let title = title.trim().to_string();
    let author = author.trim().to_string();

    if title.is_empty() {
        return Err(ParseError::MissingElement("title"));
    }

    let genre = document
        .select(&selector("span.d_book a")?)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or(ParseError::MissingElement("genre"))?;

    let cover_src = document
        .select(&selector("div.bookimage img")?)
        .next()
        .and_then(|element| element.value().attr("src"))
        .ok_or(ParseError::MissingElement("cover image"))?;

    let cover_url = book_url
        .join(cover_src.trim())
        .map_err(|e| ParseError::InvalidCoverUrl {
            href: cover_src.to_string(),
            message: e.to_string(),
        })?
        .to_string();

    let comments = document
        .select(&selector("div.texts")?)
        .map(stripped_text)
        .filter(|comment| !comment.is_empty())
        .collect();

    Ok(BookDescription {
        title,
        author,
        genre,
        cover_url,
        comments,
    })
}

/// Extracts the book page links from a catalog listing page
///
/// Each `table.d_book` card contributes its first link, resolved against `page_url`.
/// Cards without a usable link are skipped.
pub fn parse_category_page(html: &str, page_url: &Url) -> Result<Vec<Url>, ParseError> {
    let document = Html::parse_document(html);
    let card_selector = selector("table.d_book")?;
    let link_selector = selector("a[href]")?;

    let links = document
        .select(&card_selector)
        .filter_map(|card| card.select(&link_selector).next())
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .collect();

    Ok(links)
}
