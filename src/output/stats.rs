//! Statistics generation from the scrape database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::RequestState;
use crate::storage::Storage;
use crate::ScraperError;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Run the product counts belong to
    pub run_id: Option<i64>,

    /// Total number of requests recorded
    pub total_requests: u64,

    /// Count of requests by state
    pub requests_by_state: HashMap<RequestState, u64>,

    /// Products emitted by the run
    pub total_products: u64,

    /// Product counts per category, largest first
    pub products_by_category: Vec<(String, u64)>,
}

/// Loads statistics for the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(ScraperError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, ScraperError> {
    let total_requests = storage.count_total_requests()?;

    let mut requests_by_state = HashMap::new();
    for state in RequestState::all_states() {
        let count = storage.count_requests_by_state(state)?;
        if count > 0 {
            requests_by_state.insert(state, count);
        }
    }

    let run_id = storage.get_latest_run()?.map(|run| run.id);
    let (total_products, products_by_category) = match run_id {
        Some(id) => (
            storage.count_products(id)?,
            storage.count_products_by_category(id)?,
        ),
        None => (0, Vec::new()),
    };

    Ok(CrawlStatistics {
        run_id,
        total_requests,
        requests_by_state,
        total_products,
        products_by_category,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    if let Some(run_id) = stats.run_id {
        println!("  Latest run: {}", run_id);
    }
    println!("  Total requests: {}", stats.total_requests);
    println!("  Products emitted: {}", stats.total_products);
    println!();

    println!("Requests by State:");
    let mut state_counts: Vec<_> = stats.requests_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_requests > 0 {
            (*count as f64 / stats.total_requests as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if !stats.products_by_category.is_empty() {
        println!("Products by Category:");
        for (category, count) in &stats.products_by_category {
            println!("  {}: {}", category, count);
        }
        println!();
    }

    let failed: u64 = stats
        .requests_by_state
        .iter()
        .filter(|(state, _)| state.is_error())
        .map(|(_, count)| *count)
        .sum();
    println!(
        "Failures: {} of {} requests",
        failed, stats.total_requests
    );
}
