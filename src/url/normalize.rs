use crate::UrlError;
use url::Url;

/// Normalizes a URL so that equivalent links share one form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Lowercase the host (the `url` crate does this while parsing)
/// 4. Remove the fragment
/// 5. Drop `utm_*` query parameters and sort the rest by key
/// 6. Remove the trailing slash (except for the root path)
///
/// Scheme and `www.` are left alone: shops often serve different content on
/// them, and a request must fetch exactly what the page linked to.
///
/// # Examples
///
/// ```
/// use rex_scraper::url::normalize_url;
///
/// let url = normalize_url("https://SHOP.example.com/shoes.html?p=2&dir=asc#top").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/shoes.html?dir=asc&p=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !key.starts_with("utm_"))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    Ok(url)
}

/// Returns the key a request is deduplicated by
pub fn unique_key(url: &Url) -> String {
    match normalize_url(url.as_str()) {
        Ok(normalized) => normalized.to_string(),
        Err(_) => url.to_string(),
    }
}
