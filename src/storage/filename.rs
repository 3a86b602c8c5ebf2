/// File name derivation for saved books
///
/// Titles come straight from the site and may contain path separators, quotes and
/// other characters that are not valid in file names on every platform.
use url::Url;

/// Characters rejected by at least one common filesystem
const INVALID_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Fallback name for titles that sanitize to nothing
const UNTITLED: &str = "untitled";

/// Extension used when the cover URL has none
const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// Removes characters that cannot appear in a file name
///
/// Invalid and control characters are dropped, surrounding whitespace and trailing dots
/// are trimmed, and an empty result becomes `untitled`.
///
/// # Examples
///
/// ```
/// use tululu_downloader::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Что? Где? Когда?"), "Что Где Когда");
/// assert_eq!(sanitize_filename("a/b\\c"), "abc");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !INVALID_CHARS.contains(c) && !c.is_control())
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.').trim_end();

    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds `<book_id>_<sanitized title>.<extension>`
pub fn book_file_name(book_id: u32, title: &str, extension: &str) -> String {
    format!("{}_{}.{}", book_id, sanitize_filename(title), extension)
}

/// Picks the image extension from the last path segment of the cover URL
pub fn image_extension(cover_url: &str) -> String {
    Url::parse(cover_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|file| {
            file.rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
        })
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}
