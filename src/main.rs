//! Rex-Scraper main entry point
//!
//! This is the command-line interface for the Rex-Scraper product scraper.

use clap::Parser;
use rex_scraper::config::{load_config_with_hash, Config};
use rex_scraper::crawler::run_crawl;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Rex-Scraper: a product catalog scraper for a single storefront
///
/// Rex-Scraper walks the shop's top navigation, follows paginated category
/// listings down to product pages and stores every product that passes the
/// configured category and keyword filters.
#[derive(Parser, Debug)]
#[command(name = "rex-scraper")]
#[command(version = "1.0.0")]
#[command(about = "A product catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume an interrupted run (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh run, ignoring previous state
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with_all = ["stats", "export_summary", "export_json"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary", "export_json"])]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_json"])]
    export_summary: bool,

    /// Write the products of the latest run to PATH as JSON and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats", "export_summary"])]
    export_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if let Some(path) = &cli.export_json {
        handle_export_json(&config, path)?;
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rex_scraper=info,warn"),
            1 => EnvFilter::new("rex_scraper=debug,info"),
            2 => EnvFilter::new("rex_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn format_list(values: &[String]) -> String {
    if values.is_empty() {
        "(any)".to_string()
    } else {
        values.join(", ")
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Rex-Scraper Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);

    println!("\nFilters:");
    println!(
        "  Desired categories: {}",
        format_list(&config.filter.desired_categories)
    );
    println!(
        "  Include keywords: {}",
        format_list(&config.filter.include_keywords)
    );
    if config.filter.exclude_keywords.is_empty() {
        println!("  Exclude keywords: (none)");
    } else {
        println!(
            "  Exclude keywords: {}",
            config.filter.exclude_keywords.join(", ")
        );
    }

    println!("\nCrawler Configuration:");
    println!("  Concurrency: {}", config.crawler.desired_concurrency);
    println!("  Max retries: {}", config.crawler.max_request_retries);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Max pages per category: {}",
        config.crawler.max_category_pages
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nProxies ({}):", config.proxy.urls.len());
    for proxy in &config.proxy.urls {
        println!("  - {}", proxy);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start scraping from {}", config.site.start_url);
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use rex_scraper::output::{load_statistics, print_statistics};
    use rex_scraper::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use rex_scraper::output::{generate_markdown_summary, generate_summary};
    use rex_scraper::storage::SqliteStorage;

    println!("=== Exporting Run Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading run data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the --export-json mode: writes the latest run's products
fn handle_export_json(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use rex_scraper::output::export_products_json;
    use rex_scraper::storage::{SqliteStorage, Storage};

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.get_latest_run()?.map(|run| run.id);

    let written = export_products_json(&storage, run_id, path)?;
    println!("✓ Exported {} product(s) to: {}", written, path.display());

    Ok(())
}

/// Handles the main scrape operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh run (ignoring previous state)");
    } else {
        tracing::info!("Starting run (will resume if an interrupted run exists)");
    }
    tracing::info!("Start URL: {}", config.site.start_url);

    match run_crawl(config, config_hash, fresh).await {
        Ok(report) if report.interrupted => {
            tracing::warn!("Run {} interrupted; rerun without --fresh to resume", report.run_id);
            Ok(())
        }
        Ok(report) => {
            tracing::info!(
                "Run {} completed: {} product(s) stored",
                report.run_id,
                report.products_emitted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
