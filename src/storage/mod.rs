//! Storage module for downloaded book files
//!
//! This module handles all filesystem writes for the downloader, including:
//! - Deriving safe file names from book titles
//! - Writing book texts, cover images and reader comments
//! - Creating destination folders on demand

mod filename;
mod filesystem;
mod traits;

pub use filename::{book_file_name, image_extension, sanitize_filename};
pub use filesystem::FsStorage;
pub use traits::{BookStorage, StorageError, StorageResult};
