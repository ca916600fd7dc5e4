//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent, timeouts and proxy
//! - Rotating requests across one client per configured proxy
//! - GET requests with a bounded redirect chain
//! - Classifying failures as retryable or final

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::ScraperError;
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (may be empty)
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        status_code: u16,
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError { status_code: u16, retryable: bool },

    /// Network error (connection refused, timeout, proxy failure, etc.)
    NetworkError { error: String, retryable: bool },
}

impl FetchResult {
    /// Returns true if the request should be attempted again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Success { .. } | Self::ContentMismatch { .. } => false,
            Self::HttpError { retryable, .. } | Self::NetworkError { retryable, .. } => *retryable,
        }
    }
}

/// Returns true for statuses that mark a link as permanently gone
pub fn is_dead_link(status_code: u16) -> bool {
    status_code == StatusCode::NOT_FOUND.as_u16() || status_code == StatusCode::GONE.as_u16()
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts are taken from here
/// * `proxy` - Optional proxy URL all requests of this client go through
///
/// # Example
///
/// ```no_run
/// use rex_scraper::config::{CrawlerConfig, UserAgentConfig};
/// use rex_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default(), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
    proxy: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.request_timeout_secs);

    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// HTTP clients shared by all workers
///
/// Holds one client per configured proxy and hands them out round-robin, or
/// a single direct client when no proxies are configured.
#[derive(Debug)]
pub struct ClientPool {
    clients: Vec<Client>,
    next: AtomicUsize,
}

impl ClientPool {
    pub fn from_config(config: &Config) -> Result<Self, ScraperError> {
        let clients = if config.proxy.urls.is_empty() {
            vec![build_http_client(&config.user_agent, &config.crawler, None)?]
        } else {
            config
                .proxy
                .urls
                .iter()
                .map(|proxy| build_http_client(&config.user_agent, &config.crawler, Some(proxy)))
                .collect::<Result<Vec<_>, _>>()?
        };

        tracing::debug!("Built {} HTTP client(s)", clients.len());
        Ok(Self::new(clients))
    }

    /// # Panics
    ///
    /// Panics if `clients` is empty.
    pub fn new(clients: Vec<Client>) -> Self {
        assert!(!clients.is_empty(), "client pool needs at least one client");
        Self {
            clients,
            next: AtomicUsize::new(0),
        }
    }

    /// Picks the client for the next request
    pub fn next_client(&self) -> &Client {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[index]
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Fetches a URL and classifies the outcome
///
/// # Classification
///
/// | Condition | Result | Retry |
/// |-----------|--------|-------|
/// | 2xx with HTML (or missing) Content-Type | Success | - |
/// | 2xx with another Content-Type | ContentMismatch | no |
/// | HTTP 404 / 410 | HttpError | no |
/// | HTTP 408 / 429 / 5xx | HttpError | yes |
/// | Other HTTP status | HttpError | no |
/// | Timeout, connection or body error | NetworkError | yes |
/// | Redirect chain too long | NetworkError | no |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            retryable: is_retryable_status(status),
        };
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty() && !content_type.to_ascii_lowercase().contains("html") {
        return FetchResult::ContentMismatch {
            status_code: status.as_u16(),
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: format!("Failed to read body: {}", e),
            retryable: true,
        },
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            retryable: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            retryable: true,
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", e),
            retryable: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            retryable: true,
        }
    }
}
