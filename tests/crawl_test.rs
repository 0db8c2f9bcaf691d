//! End-to-end crawl tests against a mock site
//!
//! The mock serves an explore listing, two event pages, an organizer profile
//! and one event page that is gone.

mod common;

use common::{config_for, load_fixture};
use eventharvest::config::Config;
use eventharvest::crawler::{CrawlController, ListingSource, PageFetcher};
use eventharvest::models::{CrawlState, EventRecord};
use eventharvest::storage::EventExporter;
use eventharvest::utils::error::CrawlerError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NO_KEYWORDS: &[&str] = &[];

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_page(server: &MockServer, route: &str, fixture: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(load_fixture(fixture)))
        .mount(server)
        .await;
}

/// Mock site with the explore listing and every page it links to
async fn mock_site() -> MockServer {
    let server = MockServer::start().await;

    mount_page(&server, "/explore", "explore.html").await;
    mount_page(&server, "/e/rust-india", "full_event.html").await;
    mount_page(&server, "/e/founders-breakfast", "sparse_event.html").await;
    mount_page(&server, "/u/usr-asha", "profile.html").await;

    Mock::given(method("GET"))
        .and(path("/e/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

fn controller(config: &Config) -> CrawlController<PageFetcher> {
    let fetcher = PageFetcher::new(&config.crawler)
        .unwrap()
        .with_backoff(Duration::from_millis(10));
    CrawlController::new(Arc::new(fetcher), config).unwrap()
}

#[tokio::test]
async fn test_explore_crawl_end_to_end() {
    let server = mock_site().await;
    let config = config_for(&server.uri());

    let outcome = controller(&config)
        .crawl_listing(&ListingSource::Explore, NO_KEYWORDS, None)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.stats.discovered, 3);
    assert_eq!(outcome.stats.fetched, 2);
    assert_eq!(outcome.stats.failed, 1);

    let full = &outcome.records[0];
    assert_eq!(full.event_url, format!("{}/e/rust-india", server.uri()));
    assert_eq!(full.event_name, "Rust India Meetup");
    assert_eq!(full.organizer_contact, format!("{}/u/usr-asha", server.uri()));
    assert_eq!(
        full.social_links(),
        vec![
            "https://x.com/rustindia",
            "https://www.instagram.com/rustindia",
            "https://www.linkedin.com/in/asharao",
            "https://github.com/asharao",
        ]
    );

    let sparse = &outcome.records[1];
    assert_eq!(sparse.event_name, "Founders Breakfast");
    assert_eq!(sparse.organizer_name, "Priya Menon");
}

#[tokio::test]
async fn test_profiles_can_be_disabled() {
    let server = MockServer::start().await;
    mount_page(&server, "/e/rust-india", "full_event.html").await;
    Mock::given(method("GET"))
        .and(path("/u/usr-asha"))
        .respond_with(html(load_fixture("profile.html")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.crawler.fetch_profiles = false;

    let record = controller(&config)
        .extract_one(&format!("{}/e/rust-india", server.uri()))
        .await
        .unwrap();

    assert_eq!(record.social_links().len(), 3);
}

#[tokio::test]
async fn test_explore_keywords_prefilter_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/explore", "explore.html").await;
    mount_page(&server, "/e/founders-breakfast", "sparse_event.html").await;
    Mock::given(method("GET"))
        .and(path("/e/rust-india"))
        .respond_with(html(load_fixture("full_event.html")))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let outcome = controller(&config)
        .crawl_listing(&ListingSource::Explore, &["breakfast"], None)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].event_name, "Founders Breakfast");
}

#[tokio::test]
async fn test_calendar_keywords_filter_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rust-india"))
        .respond_with(html(load_fixture("explore.html")))
        .mount(&server)
        .await;
    mount_page(&server, "/e/rust-india", "full_event.html").await;
    mount_page(&server, "/e/founders-breakfast", "sparse_event.html").await;
    mount_page(&server, "/u/usr-asha", "profile.html").await;

    let config = config_for(&server.uri());
    let outcome = controller(&config)
        .crawl_listing(&ListingSource::Slug("rust-india".into()), &["koramangala"], None)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].location, "Koramangala Social");
    assert_eq!(outcome.stats.filtered_out, 1);
}

#[tokio::test]
async fn test_missing_city_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/new-delhi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let result = controller(&config)
        .crawl_listing(&ListingSource::City("New Delhi".into()), NO_KEYWORDS, None)
        .await;

    assert!(matches!(result, Err(CrawlerError::Fetch(_))));
}

#[tokio::test]
async fn test_state_skips_completed_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/explore", "explore.html").await;
    mount_page(&server, "/e/founders-breakfast", "sparse_event.html").await;
    Mock::given(method("GET"))
        .and(path("/e/rust-india"))
        .respond_with(html(load_fixture("full_event.html")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/e/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut state = CrawlState::new();
    state.mark_completed(&format!("{}/e/rust-india", server.uri()));

    let config = config_for(&server.uri());
    let outcome = controller(&config)
        .crawl_listing(&ListingSource::Explore, NO_KEYWORDS, Some(&mut state))
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(state.last_source.as_deref(), Some("explore"));
    assert_eq!(state.total_errors, 1);
    assert!(state.is_completed(&format!("{}/e/founders-breakfast", server.uri())));
}

#[tokio::test]
async fn test_crawl_then_export() {
    let server = mock_site().await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config_for(&server.uri());
    config.output.directory = dir.path().to_path_buf();
    config.output.prefix = "luma_events".to_string();
    config.output.format = "both".to_string();

    let outcome = controller(&config)
        .crawl_listing(&ListingSource::Explore, NO_KEYWORDS, None)
        .await
        .unwrap();
    let paths = EventExporter::new(&config.output)
        .unwrap()
        .export(&outcome.records)
        .unwrap();

    assert_eq!(paths.len(), 2);

    let json = std::fs::read_to_string(&paths[0]).unwrap();
    let records: Vec<EventRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(records, outcome.records);

    let csv = std::fs::read_to_string(&paths[1]).unwrap();
    let rows: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("event_name,date_time,location"));
}
