use serde::Deserialize;

/// Main configuration structure for Rex-Scraper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    pub output: OutputConfig,
}

/// The storefront being scraped
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Home page of the shop; the single seed of every run
    #[serde(rename = "start-url")]
    pub start_url: String,
}

/// Category and keyword filters
///
/// Values are compared case-insensitively. An empty list means "everything"
/// for categories and includes, and "nothing" for excludes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(rename = "desired-categories", default)]
    pub desired_categories: Vec<String>,

    #[serde(rename = "include-keywords", default)]
    pub include_keywords: Vec<String>,

    #[serde(rename = "exclude-keywords", default)]
    pub exclude_keywords: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of requests handled concurrently
    #[serde(rename = "desired-concurrency", default = "default_concurrency")]
    pub desired_concurrency: u32,

    /// How many times a failed request is retried before it is given up
    #[serde(rename = "max-request-retries", default = "default_max_retries")]
    pub max_request_retries: u32,

    /// Base delay between retries (milliseconds), multiplied by the attempt number
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on listing pages followed per category
    #[serde(rename = "max-category-pages", default = "default_max_category_pages")]
    pub max_category_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            desired_concurrency: default_concurrency(),
            max_request_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_timeout_secs(),
            max_category_pages: default_max_category_pages(),
        }
    }
}

fn default_concurrency() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_category_pages() -> u32 {
    1000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RexScraper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Outbound proxies, rotated per request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}
