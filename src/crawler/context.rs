//! Per-request crawl context handed to the page handler
//!
//! The context owns the parsed document. Everything a handler produces
//! (new requests, product records) is buffered here and drained by the worker
//! once the handler returns, so handlers stay synchronous.

use crate::crawler::scheduler::Request;
use crate::scrape::{Label, ProductRecord};
use crate::url::{is_same_host, resolve_link};
use crate::ExtractError;
use scraper::{Html, Selector};
use url::Url;

/// Dispatch hook the engine calls for every fetched page
pub trait RequestHandler: Send + Sync {
    fn handle(&self, ctx: &mut CrawlContext<'_>) -> Result<(), ExtractError>;
}

/// Everything a handler produced for one page
#[derive(Debug, Default)]
pub struct HandlerOutput {
    pub requests: Vec<Request>,
    pub records: Vec<ProductRecord>,
    pub rejected: usize,
}

pub struct CrawlContext<'a> {
    request: &'a Request,
    loaded_url: Url,
    document: Html,
    output: HandlerOutput,
}

impl<'a> CrawlContext<'a> {
    /// Parses `body` as the page fetched for `request`
    ///
    /// `loaded_url` is where the page actually came from after redirects;
    /// relative links resolve against it.
    pub fn new(request: &'a Request, loaded_url: Url, body: &str) -> Self {
        Self {
            request,
            loaded_url,
            document: Html::parse_document(body),
            output: HandlerOutput::default(),
        }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn label(&self) -> &Label {
        &self.request.label
    }

    /// URL the request was enqueued under
    pub fn url(&self) -> &Url {
        &self.request.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Absolute, same-host link targets of every element matching `selector`
    pub fn hrefs(&self, selector: &Selector) -> Vec<Url> {
        self.document
            .select(selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| self.followable(href))
            .collect()
    }

    /// Enqueues every link matching `selector` with `label`
    ///
    /// Returns the number of links accepted into the context.
    pub fn enqueue_links(&mut self, selector: &Selector, label: Label) -> usize {
        let targets = self.hrefs(selector);
        self.push_requests(targets, label, 1)
    }

    /// Enqueues raw `href` values with `label`
    pub fn enqueue_hrefs<I>(&mut self, hrefs: I, label: Label) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let targets: Vec<Url> = hrefs
            .into_iter()
            .filter_map(|href| self.followable(href.as_ref()))
            .collect();
        self.push_requests(targets, label, 1)
    }

    /// Enqueues pagination targets one page deeper than the current request
    pub fn enqueue_next_page(&mut self, targets: Vec<Url>, label: Label) -> usize {
        let page_number = self.request.page_number.saturating_add(1);
        self.push_requests(targets, label, page_number)
    }

    /// Emits a product record
    pub fn push_data(&mut self, record: ProductRecord) {
        self.output.records.push(record);
    }

    /// Notes a record that was extracted but filtered out
    pub fn reject_data(&mut self, record: ProductRecord) {
        tracing::debug!("Filtered out product '{}' ({})", record.name, record.url);
        self.output.rejected += 1;
    }

    pub fn into_output(self) -> HandlerOutput {
        self.output
    }

    fn followable(&self, href: &str) -> Option<Url> {
        let target = resolve_link(href, &self.loaded_url)?;
        if is_same_host(&target, &self.loaded_url) {
            Some(target)
        } else {
            tracing::debug!("Skipping off-site link {}", target);
            None
        }
    }

    fn push_requests(&mut self, targets: Vec<Url>, label: Label, page_number: u32) -> usize {
        let count = targets.len();
        self.output.requests.extend(
            targets
                .into_iter()
                .map(|url| Request::with_page(url, label.clone(), page_number)),
        );
        count
    }
}
