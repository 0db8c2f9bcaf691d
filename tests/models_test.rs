//! Tests for models module

mod common;

use eventharvest::models::{CrawlState, EventField, EventRecord, SENTINEL};

#[test]
fn test_json_keys_follow_column_order() {
    let record = common::create_test_record();
    let json = serde_json::to_string(&record).unwrap();

    let positions: Vec<usize> = EventField::header()
        .iter()
        .map(|key| json.find(&format!("\"{key}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_json_round_trip_keeps_sentinels() {
    let mut record = common::create_test_record();
    record.host_email = SENTINEL.to_string();

    let json = serde_json::to_string_pretty(&record).unwrap();
    assert!(json.contains(r#""host_email": "N/A""#));

    let parsed: EventRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
    assert!(parsed.is_missing(EventField::HostEmail));
}

#[test]
fn test_complete_record_has_no_missing_fields() {
    let record = common::create_test_record();
    assert!(EventField::ALL.iter().all(|f| !record.is_missing(*f)));
    assert_eq!(record.to_row()[EventField::ALL.len() - 1], record.event_url);
}

#[test]
fn test_keyword_matches_organizer() {
    let record = common::create_test_record();
    assert!(record.matches_keywords(&["asha"]));
    assert!(record.matches_keywords(&["bengaluru"]));
    assert!(!record.matches_keywords(&["async"]));
}

#[test]
fn test_crawl_state_missing_file_is_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let state = CrawlState::load(&dir.path().join("absent.json"));

    assert!(state.completed_urls.is_empty());
    assert!(state.started_at.is_some());
    assert_eq!(state.total_errors, 0);
}

#[test]
fn test_crawl_state_tracks_errors() {
    let mut state = CrawlState::new();
    state.record_error();
    state.record_error();
    state.mark_completed("https://lu.ma/e/rust-india");

    assert_eq!(state.total_errors, 2);
    assert_eq!(state.total_fetched, 1);
    assert!(state.is_completed("https://lu.ma/e/rust-india"));
    assert!(!state.is_completed("https://lu.ma/e/other"));
}
