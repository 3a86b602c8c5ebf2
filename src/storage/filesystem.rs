use crate::config::OutputConfig;
use crate::storage::filename::book_file_name;
use crate::storage::traits::{BookStorage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at the configured destination folders
#[derive(Debug, Clone)]
pub struct FsStorage {
    books_dir: PathBuf,
    images_dir: PathBuf,
    comments_dir: PathBuf,
}

impl FsStorage {
    pub fn new(books_dir: PathBuf, images_dir: PathBuf, comments_dir: PathBuf) -> Self {
        Self {
            books_dir,
            images_dir,
            comments_dir,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            config.books_dir(),
            config.images_dir(),
            config.comments_dir(),
        )
    }

    pub fn books_dir(&self) -> &Path {
        &self.books_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn comments_dir(&self) -> &Path {
        &self.comments_dir
    }

    /// Writes `contents` to `folder/file_name`, creating `folder` if needed
    fn write(&self, folder: &Path, file_name: &str, contents: &[u8]) -> StorageResult<PathBuf> {
        fs::create_dir_all(folder).map_err(|source| StorageError::CreateDir {
            path: folder.to_path_buf(),
            source,
        })?;

        let path = folder.join(file_name);
        fs::write(&path, contents).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}

impl BookStorage for FsStorage {
    fn save_text(&self, book_id: u32, title: &str, text: &str) -> StorageResult<PathBuf> {
        let file_name = book_file_name(book_id, title, "txt");
        self.write(&self.books_dir, &file_name, text.as_bytes())
    }

    fn save_image(
        &self,
        book_id: u32,
        title: &str,
        extension: &str,
        bytes: &[u8],
    ) -> StorageResult<PathBuf> {
        let file_name = book_file_name(book_id, title, extension);
        self.write(&self.images_dir, &file_name, bytes)
    }

    fn save_comments(
        &self,
        book_id: u32,
        title: &str,
        comments: &[String],
    ) -> StorageResult<PathBuf> {
        let contents: String = comments
            .iter()
            .map(|comment| format!("{}\n\n", comment))
            .collect();
        let file_name = book_file_name(book_id, title, "txt");
        self.write(&self.comments_dir, &file_name, contents.as_bytes())
    }
}
