//! Configuration module for Tululu-Downloader
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a configuration file is valid.
//!
//! # Example
//!
//! ```no_run
//! use tululu_downloader::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tululu.toml")).unwrap();
//! println!("Text downloads retry up to {} times", config.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, OutputConfig, RetryConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
