//! State module for tracking download progress
//!
//! # Components
//!
//! - `BookOutcome`: The terminal state a single book ends in after the driver loop has
//!   processed it (saved, not found, or one of the per-book failure classes)

mod book_state;

// Re-export main types
pub use book_state::BookOutcome;
