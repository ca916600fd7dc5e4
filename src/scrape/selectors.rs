//! CSS selectors for the storefront's page templates
//!
//! All selectors are compiled once when the router is built and shared by
//! every worker afterwards.

use crate::ScraperError;
use scraper::{ElementRef, Selector};

/// Top-navigation category anchors
pub const TOP_NAV_LINK: &str = "a.level-top";

/// "Next page" control on category listings
pub const NEXT_PAGE: &str = ".action.next";

/// Product anchors on category listings
pub const PRODUCT_LINK: &str = ".product-item-link";

pub const PRODUCT_NAME: &str = r#"span[itemprop="name"]"#;
pub const PRODUCT_SKU: &str = r#"div[itemprop="sku"]"#;
pub const PRICE_BOX: &str = "div.product-info-price";
pub const PRICE: &str = "span.price";
pub const GALLERY_IMAGE: &str = ".gallery-placeholder__image";
pub const DESCRIPTION: &str = "div.product.attribute.description > div.value";

/// Header cells of the "more information" attribute table
pub const ATTRIBUTE_LABEL: &str = ".col.label";

/// Value cells of the attribute table, keyed by their `data-th` attribute
pub const ATTRIBUTE_VALUE: &str = "td[data-th]";

/// Compiled selectors used by the page handlers
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub top_nav_link: Selector,
    pub next_page: Selector,
    pub product_link: Selector,
    pub name: Selector,
    pub sku: Selector,
    pub price_box: Selector,
    pub price: Selector,
    pub gallery_image: Selector,
    pub description: Selector,
    pub attribute_label: Selector,
    pub attribute_value: Selector,
}

impl SiteSelectors {
    /// Compiles every selector the handlers need
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            top_nav_link: parse_selector(TOP_NAV_LINK)?,
            next_page: parse_selector(NEXT_PAGE)?,
            product_link: parse_selector(PRODUCT_LINK)?,
            name: parse_selector(PRODUCT_NAME)?,
            sku: parse_selector(PRODUCT_SKU)?,
            price_box: parse_selector(PRICE_BOX)?,
            price: parse_selector(PRICE)?,
            gallery_image: parse_selector(GALLERY_IMAGE)?,
            description: parse_selector(DESCRIPTION)?,
            attribute_label: parse_selector(ATTRIBUTE_LABEL)?,
            attribute_value: parse_selector(ATTRIBUTE_VALUE)?,
        })
    }
}

/// Parses a CSS selector, mapping failures into `ScraperError::Selector`
pub fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Builds a class selector from an element's class list
///
/// `<a class="level-top ui-corner-all">` becomes `.level-top.ui-corner-all`.
/// Returns `None` for elements without classes.
pub fn class_selector(element: &ElementRef<'_>) -> Option<String> {
    let classes: Vec<&str> = element.value().classes().collect();
    if classes.is_empty() {
        return None;
    }
    Some(format!(".{}", classes.join(".")))
}

/// Concatenated text content of an element, trimmed
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
