//! Product records and their extraction from product detail pages

use crate::scrape::selectors::{element_text, SiteSelectors};
use crate::ExtractError;
use scraper::Html;
use serde::ser::{Serialize, SerializeMap, Serializer};
use url::Url;

/// Keys every product record carries, in output order
pub const MANDATORY_FIELDS: [&str; 7] = [
    "name",
    "sku",
    "category",
    "price",
    "imageUrl",
    "url",
    "description",
];

/// Ordered attribute map taken from a product's "more information" table
///
/// Insertion order is kept. Inserting an existing key replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, returning the previous value for that key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Structured data extracted from one product page
///
/// Serializes to a flat JSON object: the mandatory keys first, then the
/// attributes in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub price: String,
    pub image_url: String,
    pub url: String,
    pub description: String,
    pub attributes: Attributes,
}

impl ProductRecord {
    /// All key/value pairs of the record, mandatory fields first
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        [
            ("name", self.name.as_str()),
            ("sku", self.sku.as_str()),
            ("category", self.category.as_str()),
            ("price", self.price.as_str()),
            ("imageUrl", self.image_url.as_str()),
            ("url", self.url.as_str()),
            ("description", self.description.as_str()),
        ]
        .into_iter()
        .chain(self.attributes.iter())
    }

    /// Every value of the record, including attribute values
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields().map(|(_, v)| v)
    }

    /// Looks up a value by its output key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MANDATORY_FIELDS.len() + self.attributes.len()))?;
        for (key, value) in self.fields() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Extracts a product record from a parsed product page
///
/// `url` is the address the page was requested under and `category` comes
/// from the request's label. Any missing mandatory element, or an attribute
/// label without a matching value cell, fails the whole page.
pub fn extract_product(
    document: &Html,
    url: &Url,
    category: &str,
    selectors: &SiteSelectors,
) -> Result<ProductRecord, ExtractError> {
    let missing = |field: &'static str| ExtractError::MissingField {
        field,
        url: url.to_string(),
    };

    let name = document
        .select(&selectors.name)
        .next()
        .map(element_text)
        .ok_or_else(|| missing("name"))?;

    let sku = document
        .select(&selectors.sku)
        .next()
        .map(element_text)
        .ok_or_else(|| missing("sku"))?;

    let price = document
        .select(&selectors.price_box)
        .next()
        .and_then(|price_box| price_box.select(&selectors.price).next())
        .map(element_text)
        .ok_or_else(|| missing("price"))?;

    let image_src = document
        .select(&selectors.gallery_image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or_else(|| missing("imageUrl"))?;
    let image_url = strip_query(image_src.trim()).to_string();

    let description = document
        .select(&selectors.description)
        .next()
        .map(element_text)
        .ok_or_else(|| missing("description"))?;

    let attributes = extract_attributes(document, url, selectors)?;

    Ok(ProductRecord {
        name,
        sku,
        category: category.to_string(),
        price,
        image_url,
        url: url.to_string(),
        description,
        attributes,
    })
}

/// Reads the attribute table: each label cell is paired with the value cell
/// whose `data-th` equals the label text
fn extract_attributes(
    document: &Html,
    url: &Url,
    selectors: &SiteSelectors,
) -> Result<Attributes, ExtractError> {
    let mut attributes = Attributes::new();

    for label_cell in document.select(&selectors.attribute_label) {
        let label = element_text(label_cell);
        if label.is_empty() {
            continue;
        }

        if MANDATORY_FIELDS.contains(&label.as_str()) {
            tracing::warn!(
                "Attribute '{}' on {} collides with a product field, skipping",
                label,
                url
            );
            continue;
        }

        let value = document
            .select(&selectors.attribute_value)
            .find(|cell| {
                cell.value()
                    .attr("data-th")
                    .map(|th| th.trim() == label)
                    .unwrap_or(false)
            })
            .map(element_text)
            .ok_or_else(|| ExtractError::MissingAttributeValue {
                label: label.clone(),
                url: url.to_string(),
            })?;

        attributes.insert(label, value);
    }

    Ok(attributes)
}

/// Drops everything from the first `?` on
fn strip_query(src: &str) -> &str {
    src.split('?').next().unwrap_or(src)
}
