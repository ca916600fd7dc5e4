//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a scrape run:
//! run information, request outcomes, products per category and failures.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failures listed in the summary before the list is truncated
const MAX_LISTED_FAILURES: usize = 50;

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Rex-Scraper Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Requests**: {}\n", summary.total_requests));
    md.push_str(&format!("- **Products Emitted**: {}\n", summary.total_products));
    md.push_str(&format!(
        "- **Products Filtered Out**: {}\n",
        summary.requests_rejected
    ));
    md.push_str(&format!(
        "- **Acceptance Rate**: {:.2}%\n",
        summary.acceptance_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", summary.error_rate()));

    // State breakdown
    md.push_str("## Request State Breakdown\n\n");
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Handled | {} |\n", summary.requests_handled));
    md.push_str(&format!("| Rejected | {} |\n", summary.requests_rejected));
    md.push_str(&format!("| Dead Link | {} |\n", summary.requests_dead_link));
    md.push_str(&format!("| Failed | {} |\n", summary.requests_failed));
    md.push_str(&format!("| Pending | {} |\n", summary.requests_pending));
    md.push_str(&format!("| Fetching | {} |\n\n", summary.requests_fetching));

    if !summary.products_by_category.is_empty() {
        md.push_str("## Products by Category\n\n");
        md.push_str("| Category | Products |\n");
        md.push_str("|----------|----------|\n");
        for (category, count) in &summary.products_by_category {
            md.push_str(&format!("| {} | {} |\n", category, count));
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | State | Error |\n");
        md.push_str("|-----|-------|-------|\n");
        for (url, state, message) in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                url,
                state,
                message.replace('|', "\\|")
            ));
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failures.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RequestState;
    use tempfile::TempDir;

    fn create_test_summary() -> CrawlSummary {
        let mut summary = CrawlSummary::new();
        summary.run_id = 1;
        summary.started_at = "2024-01-01T00:00:00Z".to_string();
        summary.finished_at = Some("2024-01-01T01:00:00Z".to_string());
        summary.duration_seconds = Some(3600);
        summary.status = "completed".to_string();
        summary.config_hash = "abc123".to_string();
        summary.total_requests = 1234;
        summary.requests_handled = 1100;
        summary.requests_rejected = 100;
        summary.requests_failed = 34;
        summary.total_products = 400;
        summary
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Rex-Scraper Run Summary"));
        assert!(markdown.contains("Run ID"));
        assert!(markdown.contains("- **Total Requests**: 1234"));
        assert!(markdown.contains("| Rejected | 100 |"));
        assert!(markdown.contains("- **Acceptance Rate**: 80.00%"));
        assert!(!markdown.contains("## Failures"));
    }

    #[test]
    fn test_markdown_with_categories_and_failures() {
        let mut summary = create_test_summary();
        summary.products_by_category = vec![("Women".to_string(), 300), ("Men".to_string(), 100)];
        summary.failures = vec![(
            "https://shop.example.com/broken.html".to_string(),
            RequestState::Failed,
            "Missing required field 'sku'".to_string(),
        )];

        let markdown = format_markdown_summary(&summary);

        assert!(markdown.contains("## Products by Category"));
        assert!(markdown.contains("| Women | 300 |"));
        assert!(markdown.contains("| https://shop.example.com/broken.html | failed | Missing required field 'sku' |"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_summary(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Rex-Scraper Run Summary"));
    }
}
