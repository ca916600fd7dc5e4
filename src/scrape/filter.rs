//! Category selection and keyword relevance filtering

use crate::config::FilterConfig;
use crate::scrape::ProductRecord;
use std::collections::HashSet;

/// Immutable filter configuration shared by all workers
///
/// Categories and keywords are stored lowercased; every comparison is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSettings {
    desired_categories: HashSet<String>,
    include_keywords: HashSet<String>,
    exclude_keywords: HashSet<String>,
}

impl FilterSettings {
    pub fn new<C, I, E>(desired_categories: C, include_keywords: I, exclude_keywords: E) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            desired_categories: desired_categories
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .collect(),
            include_keywords: lowercase_set(include_keywords),
            exclude_keywords: lowercase_set(exclude_keywords),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(
            &config.desired_categories,
            &config.include_keywords,
            &config.exclude_keywords,
        )
    }

    /// Returns true when the top-navigation category should be followed
    ///
    /// An empty category set accepts every category.
    pub fn accepts_category(&self, name: &str) -> bool {
        self.desired_categories.is_empty()
            || self
                .desired_categories
                .contains(&name.trim().to_lowercase())
    }

    /// True when no include keywords are configured, or when any value of
    /// the record contains one of them
    pub fn includes_match(&self, record: &ProductRecord) -> bool {
        self.include_keywords.is_empty() || contains_any_keyword(record, &self.include_keywords)
    }

    /// True when any value of the record contains any exclude keyword
    pub fn excludes_match(&self, record: &ProductRecord) -> bool {
        contains_any_keyword(record, &self.exclude_keywords)
    }

    /// Decides whether a record is kept
    ///
    /// | include set | exclude set | kept when |
    /// |-------------|-------------|-----------|
    /// | empty | empty | always |
    /// | set | empty | an include keyword matches |
    /// | empty | set | no exclude keyword matches |
    /// | set | set | an include matches and no exclude matches |
    pub fn keep(&self, record: &ProductRecord) -> bool {
        self.includes_match(record) && !self.excludes_match(record)
    }

    pub fn desired_categories(&self) -> &HashSet<String> {
        &self.desired_categories
    }

    pub fn include_keywords(&self) -> &HashSet<String> {
        &self.include_keywords
    }

    pub fn exclude_keywords(&self) -> &HashSet<String> {
        &self.exclude_keywords
    }

    /// Logs the active filter sets, sorted for stable output
    pub fn log_summary(&self) {
        tracing::info!("Desired categories: {}", describe(&self.desired_categories));
        tracing::info!("Include keywords: {}", describe(&self.include_keywords));
        tracing::info!("Exclude keywords: {}", describe(&self.exclude_keywords));
    }
}

fn lowercase_set<T>(items: T) -> HashSet<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_lowercase())
        .collect()
}

fn contains_any_keyword(record: &ProductRecord, keywords: &HashSet<String>) -> bool {
    if keywords.is_empty() {
        return false;
    }
    record.values().any(|value| {
        let value = value.to_lowercase();
        keywords.iter().any(|keyword| value.contains(keyword.as_str()))
    })
}

fn describe(set: &HashSet<String>) -> String {
    if set.is_empty() {
        return "(any)".to_string();
    }
    let mut items: Vec<&str> = set.iter().map(String::as_str).collect();
    items.sort_unstable();
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::product::Attributes;

    fn record(name: &str, description: &str) -> ProductRecord {
        let mut attributes = Attributes::new();
        attributes.insert("Material", "Canvas");
        ProductRecord {
            name: name.to_string(),
            sku: "SKU-1".to_string(),
            category: "Shoes".to_string(),
            price: "$10.00".to_string(),
            image_url: "https://cdn.example.com/p.jpg".to_string(),
            url: "https://shop.example.com/p.html".to_string(),
            description: description.to_string(),
            attributes,
        }
    }

    fn settings(include: &[&str], exclude: &[&str]) -> FilterSettings {
        FilterSettings::new(Vec::<String>::new(), include, exclude)
    }

    #[test]
    fn test_no_keywords_keeps_everything() {
        assert!(settings(&[], &[]).keep(&record("Plain Shoe", "")));
    }

    #[test]
    fn test_include_only() {
        let filter = settings(&["leather"], &[]);
        assert!(filter.keep(&record("Brown Leather Boot", "")));
        assert!(!filter.keep(&record("Canvas Sneaker", "")));
    }

    #[test]
    fn test_exclude_only() {
        let filter = settings(&[], &["sale"]);
        assert!(filter.keep(&record("Sneaker", "")));
        assert!(!filter.keep(&record("Sneaker", "On SALE this week")));
    }

    #[test]
    fn test_include_and_exclude() {
        let filter = settings(&["leather"], &["sale"]);
        assert!(filter.keep(&record("Leather Boot", "Handmade")));
        assert!(!filter.keep(&record("Leather Boot", "Leather boot on sale")));
        assert!(!filter.keep(&record("Canvas Boot", "Handmade")));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let filter = settings(&["LEATHER"], &[]);
        assert!(filter.includes_match(&record("brown leather boot", "")));
        assert!(filter.includes_match(&record("BROWN LEATHER BOOT", "")));
    }

    #[test]
    fn test_attribute_values_are_searched() {
        let filter = settings(&["canvas"], &[]);
        assert!(filter.keep(&record("Sneaker", "")));
    }

    #[test]
    fn test_category_value_is_searched() {
        let filter = settings(&[], &["shoes"]);
        assert!(!filter.keep(&record("Sneaker", "")));
    }

    #[test]
    fn test_empty_sets() {
        let filter = settings(&[], &[]);
        let product = record("Leather Boot", "");
        assert!(filter.includes_match(&product));
        assert!(!filter.excludes_match(&product));
    }

    #[test]
    fn test_same_record_matches_both_sets() {
        let filter = settings(&["blue"], &["WIDGET"]);
        let product = record("Blue Widget", "");
        assert!(filter.includes_match(&product));
        assert!(filter.excludes_match(&product));
        assert!(!filter.keep(&product));
    }

    #[test]
    fn test_leather_without_sale() {
        let filter = settings(&["leather"], &["sale"]);
        assert!(!filter.keep(&record("Boots", "Genuine leather boots, on sale")));
        assert!(filter.keep(&record("Boots", "Genuine leather boots")));
    }

    #[test]
    fn test_accepts_category() {
        let any = FilterSettings::default();
        assert!(any.accepts_category("Women"));

        let filter = FilterSettings::new(["Women", " Sale "], Vec::<String>::new(), Vec::<String>::new());
        assert!(filter.accepts_category("women"));
        assert!(filter.accepts_category("SALE"));
        assert!(!filter.accepts_category("Men"));
    }

    #[test]
    fn test_from_config() {
        let config = FilterConfig {
            desired_categories: vec!["Bags".to_string()],
            include_keywords: vec!["Leather".to_string()],
            exclude_keywords: vec![],
        };
        let filter = FilterSettings::from_config(&config);
        assert!(filter.desired_categories().contains("bags"));
        assert!(filter.include_keywords().contains("leather"));
        assert!(filter.exclude_keywords().is_empty());
    }
}
