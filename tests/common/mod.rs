//! Common test utilities

use eventharvest::config::Config;
use eventharvest::models::EventRecord;
use std::fs;

/// Test fixture paths
pub const FIXTURES_DIR: &str = "tests/fixtures/html";

#[allow(dead_code)]
pub fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

/// Create a test record with every field filled
#[allow(dead_code)]
pub fn create_test_record() -> EventRecord {
    EventRecord {
        event_name: "Rust India Meetup".to_string(),
        date_time: "Monday 6 October 10:00 - 19:00".to_string(),
        location: "Koramangala, Bengaluru".to_string(),
        event_details: "An evening of talks about async Rust and systems tooling.".to_string(),
        organizer_name: "Asha Rao".to_string(),
        organizer_contact: "https://lu.ma/u/asha".to_string(),
        host_email: "hello@rustindia.dev".to_string(),
        host_social_media: "https://x.com/rustindia, https://github.com/rustindia".to_string(),
        event_url: "https://lu.ma/e/rust-india".to_string(),
    }
}

/// Config pointed at a mock server, without rate limiting delays
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.base_url = base_url.to_string();
    config.crawler.rate_limit = 100.0;
    config.crawler.max_retries = 2;
    config.crawler.request_timeout_secs = 5;
    config
}
