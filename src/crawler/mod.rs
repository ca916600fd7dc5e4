//! Crawler module for page fetching and request processing
//!
//! This module contains the core crawling machinery:
//! - HTTP fetching with proxy rotation and failure classification
//! - The deduplicating request frontier shared by all workers
//! - The per-page context handed to request handlers
//! - Overall crawl coordination

mod context;
mod coordinator;
mod fetcher;
mod scheduler;

pub use context::{CrawlContext, HandlerOutput, RequestHandler};
pub use coordinator::{run_crawl, Coordinator, RunReport};
pub use fetcher::{build_http_client, fetch_url, is_dead_link, ClientPool, FetchResult};
pub use scheduler::{Request, Scheduler};
