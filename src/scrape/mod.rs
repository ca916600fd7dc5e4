//! Site-specific page handling
//!
//! - `label`: request labels and their text tags
//! - `links`: top-navigation and category-page link discovery
//! - `product`: product record extraction
//! - `filter`: category selection and keyword relevance
//! - `router`: the dispatch hook tying them together

mod filter;
mod label;
mod links;
pub mod product;
mod router;
pub mod selectors;

pub use filter::FilterSettings;
pub use label::Label;
pub use links::{handle_category_page, handle_top_nav};
pub use product::{extract_product, Attributes, ProductRecord, MANDATORY_FIELDS};
pub use router::Router;
pub use selectors::SiteSelectors;
