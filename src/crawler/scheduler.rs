//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The shared FIFO queue of requests waiting for a worker
//! - Deduplication by unique key, so a URL is requested at most once per run
//! - Tracking in-flight requests to detect when the crawl is finished
//! - Waking idle workers when new requests arrive

use crate::scrape::Label;
use crate::url::unique_key;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// A URL waiting to be fetched, with the label that routes its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The URL to fetch
    pub url: Url,

    /// Routing label for the fetched page
    pub label: Label,

    /// Listing page number within a category (1 for everything else)
    pub page_number: u32,
}

impl Request {
    pub fn new(url: Url, label: Label) -> Self {
        Self::with_page(url, label, 1)
    }

    pub fn with_page(url: Url, label: Label, page_number: u32) -> Self {
        Self {
            url,
            label,
            page_number,
        }
    }

    /// Key the frontier deduplicates on
    pub fn unique_key(&self) -> String {
        unique_key(&self.url)
    }
}

#[derive(Debug, Default)]
struct Frontier {
    queue: VecDeque<Request>,
    seen: HashSet<String>,
    in_flight: usize,
}

/// Scheduler shared by all workers
///
/// The queue is unbounded: a request is only ever refused because its unique
/// key was seen before.
#[derive(Debug, Default)]
pub struct Scheduler {
    frontier: Mutex<Frontier>,
    notify: Notify,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler for a resumed run
    ///
    /// # Arguments
    ///
    /// * `pending` - Requests that still need to be fetched
    /// * `known_keys` - Unique keys of every request already recorded in this run
    pub fn resume<K>(pending: Vec<Request>, known_keys: K) -> Self
    where
        K: IntoIterator<Item = String>,
    {
        let mut seen: HashSet<String> = known_keys.into_iter().collect();
        seen.extend(pending.iter().map(Request::unique_key));

        Self {
            frontier: Mutex::new(Frontier {
                queue: pending.into(),
                seen,
                in_flight: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Adds a request to the frontier
    ///
    /// Returns false if a request with the same unique key was already added.
    pub fn add_request(&self, request: Request) -> bool {
        {
            let mut frontier = self.lock();
            if !frontier.seen.insert(request.unique_key()) {
                return false;
            }
            frontier.queue.push_back(request);
        }
        self.notify.notify_waiters();
        true
    }

    /// Waits for the next request to process
    ///
    /// # Returns
    ///
    /// * `Some(Request)` - A request; the caller must call `complete` when done
    /// * `None` - The queue is empty and no request is in flight
    pub async fn next_request(&self) -> Option<Request> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut frontier = self.lock();
                if let Some(request) = frontier.queue.pop_front() {
                    frontier.in_flight += 1;
                    return Some(request);
                }
                if frontier.in_flight == 0 {
                    drop(frontier);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks a request handed out by `next_request` as finished
    ///
    /// Requests discovered while handling it must be added before this call.
    pub fn complete(&self) {
        {
            let mut frontier = self.lock();
            frontier.in_flight = frontier.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Number of requests waiting in the queue
    pub fn frontier_size(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of unique requests seen this run
    pub fn seen_count(&self) -> usize {
        self.lock().seen.len()
    }

    fn lock(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().expect("frontier lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn request(path: &str) -> Request {
        Request::new(
            Url::parse(&format!("https://shop.example.com{}", path)).unwrap(),
            Label::TopNav,
        )
    }

    #[test]
    fn test_add_request_deduplicates() {
        let scheduler = Scheduler::new();
        assert!(scheduler.add_request(request("/women.html")));
        assert!(!scheduler.add_request(request("/women.html#top")));
        assert!(scheduler.add_request(request("/men.html")));
        assert_eq!(scheduler.frontier_size(), 2);
        assert_eq!(scheduler.seen_count(), 2);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let scheduler = Scheduler::new();
        scheduler.add_request(request("/a.html"));
        scheduler.add_request(request("/b.html"));

        let first = scheduler.next_request().await.unwrap();
        let second = scheduler.next_request().await.unwrap();
        assert_eq!(first.url.path(), "/a.html");
        assert_eq!(second.url.path(), "/b.html");
        assert_eq!(scheduler.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_idle_returns_none() {
        let scheduler = Scheduler::new();
        assert!(scheduler.next_request().await.is_none());
    }

    #[tokio::test]
    async fn test_waits_while_request_in_flight() {
        let scheduler = Arc::new(Scheduler::new());
        scheduler.add_request(request("/home.html"));
        let _home = scheduler.next_request().await.unwrap();

        let waiter = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.next_request().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        scheduler.add_request(request("/women.html"));
        scheduler.complete();

        let next = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.unwrap().url.path(), "/women.html");
    }

    #[tokio::test]
    async fn test_finishes_when_last_request_completes() {
        let scheduler = Arc::new(Scheduler::new());
        scheduler.add_request(request("/home.html"));
        let _home = scheduler.next_request().await.unwrap();

        let waiter = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.next_request().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.complete();

        let next = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_resume_skips_known_keys() {
        let pending = vec![request("/men.html")];
        let known = vec![unique_key(&request("/women.html").url)];
        let scheduler = Scheduler::resume(pending, known);

        assert!(!scheduler.add_request(request("/women.html")));
        assert!(!scheduler.add_request(request("/men.html")));
        assert_eq!(scheduler.next_request().await.unwrap().url.path(), "/men.html");
    }

    #[test]
    fn test_request_unique_key() {
        let a = request("/shoes.html?p=2&dir=asc");
        let b = request("/shoes.html?dir=asc&p=2");
        assert_eq!(a.unique_key(), b.unique_key());
    }
}
