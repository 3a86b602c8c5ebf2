use crate::config::types::{Config, HttpConfig, OutputConfig, RetryConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_retry_config(&config.retry)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    // Relative joins drop the last segment otherwise
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must end with '/'",
            config.base_url
        )));
    }

    if config.category_path.starts_with('/') || config.category_path.starts_with("http") {
        return Err(ConfigError::Validation(format!(
            "category-path '{}' must be relative to base-url",
            config.category_path
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_seconds == Some(0) {
        return Err(ConfigError::Validation(
            "timeout-seconds must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (key, folder) in [
        ("books-folder", &config.books_folder),
        ("images-folder", &config.images_folder),
        ("comments-folder", &config.comments_folder),
    ] {
        validate_folder_name(key, folder)?;
    }

    if config.dest_folder.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "dest-folder cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a folder name relative to the destination folder
fn validate_folder_name(key: &str, folder: &str) -> Result<(), ConfigError> {
    if folder.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
    }

    if folder.split(['/', '\\']).any(|part| part == "..") {
        return Err(ConfigError::Validation(format!(
            "{} '{}' cannot leave the destination folder",
            key, folder
        )));
    }

    Ok(())
}
