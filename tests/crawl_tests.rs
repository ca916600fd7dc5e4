//! Integration tests for the scraper
//!
//! These tests use wiremock to serve a small mock storefront and run the
//! whole pipeline end-to-end: top navigation, paginated categories, product
//! pages, filtering and storage.

use rex_scraper::config::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, ProxyConfig, SiteConfig, UserAgentConfig,
};
use rex_scraper::crawler::run_crawl;
use rex_scraper::state::RequestState;
use rex_scraper::storage::{SqliteStorage, Storage};
use rex_scraper::unique_key;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock shop
fn create_test_config(start_url: &str, dir: &TempDir, filter: FilterConfig, max_pages: u32) -> Config {
    Config {
        site: SiteConfig {
            start_url: start_url.to_string(),
        },
        filter,
        crawler: CrawlerConfig {
            desired_concurrency: 3,
            max_request_retries: 1,
            retry_delay_ms: 1,
            request_timeout_secs: 5,
            max_category_pages: max_pages,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: None,
        },
        proxy: ProxyConfig::default(),
        output: OutputConfig {
            database_path: dir.path().join("scrape.db").to_string_lossy().into_owned(),
            summary_path: dir.path().join("summary.md").to_string_lossy().into_owned(),
        },
    }
}

fn shoes_and_bags() -> FilterConfig {
    FilterConfig {
        desired_categories: vec!["shoes".to_string(), "Bags".to_string()],
        include_keywords: vec![],
        exclude_keywords: vec!["clearance".to_string()],
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

fn product_page(name: &str, sku: &str, price: &str, description: &str, color: &str) -> String {
    format!(
        r#"<html><body>
        <h1><span itemprop="name">{name}</span></h1>
        <div itemprop="sku">{sku}</div>
        <div class="product-info-price"><span class="price">{price}</span></div>
        <img class="gallery-placeholder__image" src="/media/{sku}.jpg?width=700">
        <div class="product attribute description"><div class="value">{description}</div></div>
        <table><tbody><tr>
            <th class="col label" scope="row">Color</th>
            <td class="col data" data-th="Color">{color}</td>
        </tr></tbody></table>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, page: &str, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mounts the storefront: three top-level categories, one of them paginated
async fn mount_shop(server: &MockServer, page_two_calls: u64) {
    let home = r#"<html><body><nav><ul>
        <li><a class="level-top ui-corner-all" href="/shoes.html"><span>Shoes</span></a></li>
        <li><a class="level-top ui-corner-all" href="/bags.html"><span>Bags</span></a></li>
        <li><a class="level-top ui-corner-all" href="/sale.html"><span>Sale</span></a></li>
    </ul></nav></body></html>"#;
    mount_page(server, "/", home.to_string(), 1).await;

    let shoes_page_one = r#"<html><body><ol class="products">
        <li><a class="product-item-link" href="/boots.html">Boots</a></li>
        <li><a class="product-item-link" href="/sandals.html">Sandals</a></li>
        </ol>
        <a class="action next" href="/shoes-page-2.html">Next</a>
    </body></html>"#;
    mount_page(server, "/shoes.html", shoes_page_one.to_string(), 1).await;

    let shoes_page_two = r#"<html><body><ol class="products">
        <li><a class="product-item-link" href="/loafers.html">Loafers</a></li>
        <li><a class="product-item-link" href="/boots.html">Boots</a></li>
        </ol>
    </body></html>"#;
    mount_page(server, "/shoes-page-2.html", shoes_page_two.to_string(), page_two_calls).await;

    let bags = r#"<html><body><ol class="products">
        <li><a class="product-item-link" href="/tote.html">Canvas Tote</a></li>
        <li><a class="product-item-link" href="/backpack.html">Backpack</a></li>
        <li><a class="product-item-link" href="/gone.html">Gone</a></li>
        <li><a class="product-item-link" href="https://elsewhere.example.org/bag.html">Elsewhere</a></li>
        </ol>
    </body></html>"#;
    mount_page(server, "/bags.html", bags.to_string(), 1).await;

    mount_page(server, "/sale.html", String::new(), 0).await;

    mount_page(
        server,
        "/boots.html",
        product_page("Leather Boots", "SH-1", "$120.00", "Hand-stitched leather boots.", "Brown"),
        1,
    )
    .await;
    mount_page(
        server,
        "/sandals.html",
        product_page("Beach Sandals", "SH-2", "$30.00", "Light sandals.", "Blue"),
        1,
    )
    .await;
    mount_page(
        server,
        "/loafers.html",
        product_page("Suede Loafers", "SH-3", "$90.00", "Soft suede loafers.", "Tan"),
        page_two_calls,
    )
    .await;
    mount_page(
        server,
        "/tote.html",
        product_page("Canvas Tote", "BG-1", "$15.00", "Clearance item, final sale.", "Beige"),
        1,
    )
    .await;
    mount_page(
        server,
        "/backpack.html",
        product_page("Trail Backpack", "BG-2", "$75.00", "Water resistant backpack.", "Green"),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
}

fn request_state(storage: &SqliteStorage, url: &str) -> Option<RequestState> {
    let key = unique_key(&Url::parse(url).unwrap());
    storage.get_request(&key).unwrap().map(|record| record.state)
}

#[tokio::test]
async fn test_full_scrape_of_mock_shop() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_shop(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir, shoes_and_bags(), 1000);
    let db_path = config.output.database_path.clone();
    let summary_path = config.output.summary_path.clone();

    let report = run_crawl(config, "test-hash", true).await.unwrap();
    assert!(!report.interrupted);
    assert_eq!(report.products_emitted, 4);
    assert_eq!(report.products_rejected, 1);
    assert_eq!(report.dead_links, 1);
    assert_eq!(report.requests_failed, 0);

    let storage = SqliteStorage::new(std::path::Path::new(&db_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, report.run_id);

    let products = storage.get_products(Some(run.id)).unwrap();
    assert_eq!(products.len(), 4);

    let mut names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["Beach Sandals", "Leather Boots", "Suede Loafers", "Trail Backpack"]
    );

    let boots = products.iter().find(|p| p.sku == "SH-1").unwrap();
    assert_eq!(boots.category, "Shoes");
    assert_eq!(boots.price, "$120.00");
    assert_eq!(boots.image_url, "/media/SH-1.jpg");
    assert_eq!(boots.url, format!("{}/boots.html", base_url));
    assert_eq!(boots.attributes.get("Color"), Some("Brown"));

    let loafers = products.iter().find(|p| p.sku == "SH-3").unwrap();
    assert_eq!(loafers.category, "Shoes");

    let backpack = products.iter().find(|p| p.sku == "BG-2").unwrap();
    assert_eq!(backpack.category, "Bags");

    assert_eq!(
        request_state(&storage, &format!("{}/tote.html", base_url)),
        Some(RequestState::Rejected)
    );
    assert_eq!(
        request_state(&storage, &format!("{}/gone.html", base_url)),
        Some(RequestState::DeadLink)
    );
    assert_eq!(
        request_state(&storage, &format!("{}/boots.html", base_url)),
        Some(RequestState::Handled)
    );
    assert_eq!(request_state(&storage, &format!("{}/sale.html", base_url)), None);
    assert_eq!(request_state(&storage, "https://elsewhere.example.org/bag.html"), None);

    assert_eq!(storage.count_requests_by_state(RequestState::Pending).unwrap(), 0);
    assert_eq!(storage.count_requests_by_state(RequestState::Fetching).unwrap(), 0);

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("# Rex-Scraper Run Summary"));
    assert!(summary.contains("| Shoes | 3 |"));
}

#[tokio::test]
async fn test_pagination_stops_at_page_cap() {
    let server = MockServer::start().await;
    mount_shop(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), &dir, shoes_and_bags(), 1);

    let report = run_crawl(config, "test-hash", true).await.unwrap();
    assert_eq!(report.products_emitted, 3);
}

#[tokio::test]
async fn test_include_keywords_restrict_products() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_shop(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let filter = FilterConfig {
        desired_categories: vec!["Shoes".to_string(), "Bags".to_string()],
        include_keywords: vec!["LEATHER".to_string(), "suede".to_string()],
        exclude_keywords: vec![],
    };
    let config = create_test_config(&format!("{}/", base_url), &dir, filter, 1000);
    let db_path = config.output.database_path.clone();

    let report = run_crawl(config, "test-hash", true).await.unwrap();
    assert_eq!(report.products_emitted, 2);
    assert_eq!(report.products_rejected, 3);

    let storage = SqliteStorage::new(std::path::Path::new(&db_path)).unwrap();
    let mut skus: Vec<String> = storage
        .get_products(None)
        .unwrap()
        .into_iter()
        .map(|p| p.sku)
        .collect();
    skus.sort();
    assert_eq!(skus, vec!["SH-1", "SH-3"]);

    assert_eq!(
        request_state(&storage, &format!("{}/sandals.html", base_url)),
        Some(RequestState::Rejected)
    );
}
