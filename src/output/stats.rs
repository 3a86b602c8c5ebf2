//! Statistics for a download run
//!
//! This module tallies per-book outcomes as the driver loop produces them and
//! prints the end-of-run report.

use crate::state::BookOutcome;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,

    /// Count of books by outcome
    pub books_by_outcome: HashMap<BookOutcome, u64>,

    /// Books that failed, in processing order
    pub failed_books: Vec<(u32, BookOutcome)>,
}

impl RunStatistics {
    /// Starts a new tally
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            books_by_outcome: HashMap::new(),
            failed_books: Vec::new(),
        }
    }

    /// Records the outcome of one book
    pub fn record(&mut self, book_id: u32, outcome: BookOutcome) {
        *self.books_by_outcome.entry(outcome).or_insert(0) += 1;
        if outcome.is_error() {
            self.failed_books.push((book_id, outcome));
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of books with the given outcome
    pub fn count(&self, outcome: BookOutcome) -> u64 {
        self.books_by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Number of books the run touched
    pub fn total_books(&self) -> u64 {
        self.books_by_outcome.values().sum()
    }

    /// Number of fully saved books
    pub fn saved(&self) -> u64 {
        self.count(BookOutcome::Saved)
    }

    /// Wall-clock duration, if finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Download Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  Books processed: {}", stats.total_books());
    println!();

    println!("Books by Outcome:");
    let total = stats.total_books();
    for outcome in BookOutcome::ALL {
        let count = stats.count(outcome);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    if !stats.failed_books.is_empty() {
        println!("Failed Books ({}):", stats.failed_books.len());
        for (book_id, outcome) in &stats.failed_books {
            println!("  - {}: {}", book_id, outcome);
        }
        println!();
    }

    let success_rate = if total > 0 {
        (stats.saved() as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} books saved)",
        success_rate,
        stats.saved(),
        total
    );
}
