use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rex_scraper::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Concurrency: {}", config.crawler.desired_concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Every run records this hash, so stored products can be traced back to the
/// filters that admitted them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
start-url = "https://shop.example.com/"

[filter]
desired-categories = ["Shoes", "Bags"]
include-keywords = ["Leather"]
exclude-keywords = ["sale"]

[crawler]
desired-concurrency = 4
max-request-retries = 2
max-category-pages = 50

[user-agent]
crawler-name = "TestScraper"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.start_url, "https://shop.example.com/");
        assert_eq!(config.filter.desired_categories, vec!["Shoes", "Bags"]);
        assert_eq!(config.crawler.desired_concurrency, 4);
        assert_eq!(config.crawler.max_request_retries, 2);
        assert_eq!(config.crawler.max_category_pages, 50);
        // Unset crawler keys fall back to defaults
        assert_eq!(config.crawler.request_timeout_secs, 30);
        assert_eq!(config.user_agent.crawler_name, "TestScraper");
    }

    #[test]
    fn test_optional_sections_default() {
        let config_content = r#"
[site]
start-url = "https://shop.example.com/"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

        let config = parse_config(config_content).unwrap();
        assert!(config.filter.desired_categories.is_empty());
        assert!(config.filter.include_keywords.is_empty());
        assert!(config.filter.exclude_keywords.is_empty());
        assert!(config.proxy.urls.is_empty());
        assert_eq!(config.crawler.desired_concurrency, 10);
        assert_eq!(config.crawler.max_request_retries, 3);
        assert_eq!(config.user_agent.crawler_name, "RexScraper");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[site]
start-url = "https://shop.example.com/"

[crawler]
desired-concurrency = 0

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_hash_tracks_filter_changes() {
        let base = r#"
[site]
start-url = "https://shop.example.com/"

[filter]
exclude-keywords = ["sale"]

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;
        let original = create_temp_config(base);
        let edited = create_temp_config(&base.replace(r#"["sale"]"#, r#"["sale", "outlet"]"#));

        let (config, hash) = load_config_with_hash(original.path()).unwrap();
        assert_eq!(config.filter.exclude_keywords, vec!["sale"]);
        assert_eq!(hash, compute_config_hash(original.path()).unwrap());
        assert_eq!(hash.len(), 64);

        assert_ne!(hash, compute_config_hash(edited.path()).unwrap());
    }
}
