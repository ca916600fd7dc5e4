//! URL handling module for Rex-Scraper
//!
//! Normalization for request deduplication, host extraction, and link
//! resolution against the page a link was found on.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_host};
pub use normalize::{normalize_url, unique_key};

use url::Url;

/// Resolves an `href` found on `base` into an absolute, followable URL
///
/// Returns `None` when the link should not be followed:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - hrefs that do not resolve to an http(s) URL
///
/// # Examples
///
/// ```
/// use rex_scraper::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/women.html").unwrap();
/// let next = resolve_link("women.html?p=2", &base).unwrap();
/// assert_eq!(next.as_str(), "https://shop.example.com/women.html?p=2");
/// assert!(resolve_link("javascript:void(0)", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);

    Some(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://shop.example.com/women/tops.html").unwrap()
    }

    #[test]
    fn test_resolve_absolute_link() {
        let resolved = resolve_link("https://shop.example.com/bags.html", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://shop.example.com/bags.html");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let resolved = resolve_link("/men.html", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://shop.example.com/men.html");
    }

    #[test]
    fn test_resolve_path_relative_link() {
        let resolved = resolve_link("shirts.html", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://shop.example.com/women/shirts.html");
    }

    #[test]
    fn test_fragment_is_dropped() {
        let resolved = resolve_link("/item.html#reviews", &base_url()).unwrap();
        assert_eq!(resolved.as_str(), "https://shop.example.com/item.html");
    }

    #[test]
    fn test_skip_unfollowable_links() {
        for href in [
            "",
            "   ",
            "#top",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:shop@example.com",
            "tel:+123456",
            "data:text/html,<p>x</p>",
            "ftp://files.example.com/catalog.pdf",
        ] {
            assert!(resolve_link(href, &base_url()).is_none(), "{} should be skipped", href);
        }
    }
}
