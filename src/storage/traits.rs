//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every method writes one artifact of one book and returns where it ended up.
/// Writing the same artifact twice overwrites it.
pub trait BookStorage: Send + Sync {
    /// Saves the book text
    ///
    /// # Arguments
    ///
    /// * `book_id` - The site's book identifier
    /// * `title` - The book title, sanitized into the file name
    /// * `text` - The book text
    fn save_text(&self, book_id: u32, title: &str, text: &str) -> StorageResult<PathBuf>;

    /// Saves the cover image
    ///
    /// # Arguments
    ///
    /// * `book_id` - The site's book identifier
    /// * `title` - The book title, sanitized into the file name
    /// * `extension` - Image file extension without the dot
    /// * `bytes` - The raw image
    fn save_image(
        &self,
        book_id: u32,
        title: &str,
        extension: &str,
        bytes: &[u8],
    ) -> StorageResult<PathBuf>;

    /// Saves the reader comments, each followed by a blank line
    fn save_comments(&self, book_id: u32, title: &str, comments: &[String])
        -> StorageResult<PathBuf>;
}
