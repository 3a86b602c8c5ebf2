//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the downloader, including:
//! - Building the HTTP client with the configured user agent
//! - Single GET requests with automatic redirect-following disabled
//! - Error classification (connection-level vs HTTP status vs other)

use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Result of a single successful GET
///
/// With redirect-following disabled, `redirected` is true exactly when the server
/// answered with a 3xx status. `final_url` is then the resolved `Location` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// URL the response points at (the redirect target for 3xx responses)
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response body, empty for redirects
    pub body: Vec<u8>,
    /// Whether the server answered with a redirect
    pub redirected: bool,
}

impl FetchResult {
    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure of a single GET
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connect failure, DNS failure, timeout, dropped connection or an interrupted body
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// The server answered with a 4xx/5xx status
    #[error("HTTP status {status_code}")]
    Status { status_code: u16 },

    /// Any other request failure (invalid request, decoding, ...)
    #[error("request failed: {message}")]
    Transport { message: String },
}

impl FetchError {
    /// Only connection-level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Issues one GET per call
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` without following redirects
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResult)` - 2xx response, or a 3xx response with `redirected` set
    /// * `Err(FetchError)` - 4xx/5xx status or transport failure
    async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed so that the site's "redirect to homepage" answer for
/// unknown books stays visible to the caller.
///
/// # Example
///
/// ```no_run
/// use tululu_downloader::config::HttpConfig;
/// use tululu_downloader::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none()) // Redirects mean "not found" for this site
        .gzip(true)
        .brotli(true);

    if let Some(seconds) = config.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    builder.build()
}

/// `Fetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();

        if status.is_redirection() {
            let final_url = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| url.join(location).ok())
                .map(|target| target.to_string())
                .unwrap_or_else(|| response.url().to_string());

            tracing::debug!("{} answered {} -> {}", url, status.as_u16(), final_url);

            return Ok(FetchResult {
                final_url,
                status_code: status.as_u16(),
                body: Vec::new(),
                redirected: true,
            });
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                status_code: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.bytes().await.map_err(classify_error)?;

        Ok(FetchResult {
            final_url,
            status_code: status.as_u16(),
            body: body.to_vec(),
            redirected: false,
        })
    }
}

/// Classifies a reqwest error into the retryable/terminal taxonomy
///
/// Invalid requests, undecodable bodies and redirect errors are terminal. Everything else
/// that failed on the way to or from the server counts as a connection failure, including
/// a peer that accepted the connection and then hung up.
fn classify_error(error: reqwest::Error) -> FetchError {
    if error.is_builder() || error.is_decode() || error.is_redirect() {
        FetchError::Transport {
            message: error.to_string(),
        }
    } else if error.is_connect()
        || error.is_timeout()
        || error.is_body()
        || error.is_request()
        || is_dropped_connection(&error)
    {
        FetchError::Connection {
            message: error.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            status_code: status.as_u16(),
        }
    } else {
        FetchError::Transport {
            message: error.to_string(),
        }
    }
}

/// Looks for a reset, aborted or truncated connection anywhere in the source chain
fn is_dropped_connection(error: &(dyn StdError + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_error.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
