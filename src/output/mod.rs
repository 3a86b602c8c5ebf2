//! Output module for download results
//!
//! This module provides:
//! - A streaming JSON writer for book descriptions
//! - Run statistics and their console report

mod json;
mod stats;

pub use json::JsonArrayWriter;
pub use stats::{print_statistics, RunStatistics};
