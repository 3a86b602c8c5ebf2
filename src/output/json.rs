//! Streaming JSON array writer for book descriptions
//!
//! Descriptions are written as soon as each book is done instead of being collected
//! for the whole run. The output is a valid JSON array once `finish` has run.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends serialized items to a JSON array
#[derive(Debug)]
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    items: usize,
}

impl JsonArrayWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`, creating parent folders as needed
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> JsonArrayWriter<W> {
    /// Opens the array on `writer`
    pub fn new(mut writer: W) -> std::io::Result<Self> {
        writer.write_all(b"[")?;
        Ok(Self { writer, items: 0 })
    }

    /// Appends one item and flushes it through
    ///
    /// The separator and the item reach the writer in a single write, so an item that
    /// fails to serialize leaves the array untouched.
    pub fn append<T: Serialize>(&mut self, item: &T) -> Result<(), serde_json::Error> {
        let mut chunk = if self.items == 0 {
            b"\n".to_vec()
        } else {
            b",\n".to_vec()
        };
        serde_json::to_writer_pretty(&mut chunk, item)?;

        self.writer
            .write_all(&chunk)
            .map_err(serde_json::Error::io)?;
        self.writer.flush().map_err(serde_json::Error::io)?;
        self.items += 1;
        Ok(())
    }

    /// Number of items written so far
    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Closes the array and returns the underlying writer
    pub fn finish(mut self) -> std::io::Result<W> {
        if self.items == 0 {
            self.writer.write_all(b"]")?;
        } else {
            self.writer.write_all(b"\n]\n")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
