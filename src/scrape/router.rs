use crate::crawler::{CrawlContext, RequestHandler};
use crate::scrape::links::{handle_category_page, handle_top_nav};
use crate::scrape::product::extract_product;
use crate::scrape::selectors::SiteSelectors;
use crate::scrape::{FilterSettings, Label};
use crate::{ExtractError, ScraperError};
use std::sync::Arc;

/// Routes every fetched page to the handler for its label
///
/// The router is the engine's single dispatch hook. It holds the compiled
/// selectors and the shared, read-only filter settings.
pub struct Router {
    selectors: SiteSelectors,
    filter: Arc<FilterSettings>,
    max_category_pages: u32,
}

impl Router {
    pub fn new(filter: Arc<FilterSettings>, max_category_pages: u32) -> Result<Self, ScraperError> {
        Ok(Self {
            selectors: SiteSelectors::new()?,
            filter,
            max_category_pages,
        })
    }

    pub fn filter(&self) -> &FilterSettings {
        &self.filter
    }

    fn handle_product(&self, ctx: &mut CrawlContext<'_>, category: &str) -> Result<(), ExtractError> {
        let record = extract_product(ctx.document(), ctx.url(), category, &self.selectors)?;

        if self.filter.keep(&record) {
            tracing::info!("Product '{}' [{}] kept", record.name, record.sku);
            ctx.push_data(record);
        } else {
            ctx.reject_data(record);
        }
        Ok(())
    }
}

impl RequestHandler for Router {
    fn handle(&self, ctx: &mut CrawlContext<'_>) -> Result<(), ExtractError> {
        match ctx.label().clone() {
            Label::Product(category) => self.handle_product(ctx, &category),
            Label::Category(category) => {
                handle_category_page(ctx, &category, &self.selectors, self.max_category_pages);
                Ok(())
            }
            Label::TopNav => {
                let count = handle_top_nav(ctx, &self.selectors, &self.filter);
                tracing::info!("Top navigation of {}: {} category link(s)", ctx.url(), count);
                Ok(())
            }
        }
    }
}
