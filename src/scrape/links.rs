//! Link discovery on top-navigation and category pages

use crate::crawler::CrawlContext;
use crate::scrape::selectors::{class_selector, element_text, SiteSelectors};
use crate::scrape::{FilterSettings, Label};
use scraper::Selector;

/// Enqueues the category listings reachable from the top navigation
///
/// Each `a.level-top` anchor names a category by its text. For every
/// accepted category, the links matching the anchor's own class selector and
/// carrying the same text are enqueued as `CATEGORY-<name>`.
///
/// Returns the number of links enqueued.
pub fn handle_top_nav(
    ctx: &mut CrawlContext<'_>,
    selectors: &SiteSelectors,
    filter: &FilterSettings,
) -> usize {
    let mut accepted: Vec<(String, Vec<String>)> = Vec::new();

    for anchor in ctx.document().select(&selectors.top_nav_link) {
        let category = element_text(anchor);
        if category.is_empty() {
            continue;
        }

        if !filter.accepts_category(&category) {
            tracing::debug!("Skipping category '{}'", category);
            continue;
        }

        if accepted.iter().any(|(name, _)| *name == category) {
            continue;
        }

        let derived = match class_selector(&anchor) {
            Some(derived) => derived,
            None => continue,
        };
        let selector = match Selector::parse(&derived) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("Cannot use selector '{}' for '{}': {:?}", derived, category, e);
                continue;
            }
        };

        let hrefs: Vec<String> = ctx
            .document()
            .select(&selector)
            .filter(|link| element_text(*link) == category)
            .filter_map(|link| link.value().attr("href"))
            .map(str::to_string)
            .collect();

        accepted.push((category, hrefs));
    }

    let mut enqueued = 0;
    for (category, hrefs) in accepted {
        let count = ctx.enqueue_hrefs(hrefs, Label::Category(category.clone()));
        tracing::info!("Category '{}': {} listing link(s) enqueued", category, count);
        enqueued += count;
    }
    enqueued
}

/// Enqueues the next listing page and every product on a category page
///
/// The next page keeps the same `CATEGORY-<name>` label; products get
/// `PRODUCT-<name>`. Pagination stops once `max_pages` listing pages of the
/// category have been enqueued.
pub fn handle_category_page(
    ctx: &mut CrawlContext<'_>,
    category: &str,
    selectors: &SiteSelectors,
    max_pages: u32,
) -> usize {
    let mut enqueued = 0;

    let next_pages = ctx.hrefs(&selectors.next_page);
    if !next_pages.is_empty() {
        let page_number = ctx.request().page_number;
        if page_number < max_pages {
            enqueued += ctx.enqueue_next_page(next_pages, Label::Category(category.to_string()));
        } else {
            tracing::warn!(
                "Category '{}' reached {} listing pages, not following {}",
                category,
                max_pages,
                next_pages[0]
            );
        }
    }

    let products = ctx.enqueue_links(&selectors.product_link, Label::Product(category.to_string()));
    tracing::debug!(
        "Category '{}' page {}: {} product link(s)",
        category,
        ctx.request().page_number,
        products
    );

    enqueued + products
}
