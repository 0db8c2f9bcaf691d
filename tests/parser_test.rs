//! Extraction tests over HTML fixture files
//!
//! - Fully structured event page
//! - Text-only page that relies on pattern fallbacks
//! - Field precedence, length bounds and social link caps

mod common;

use common::load_fixture;
use eventharvest::config::ExtractionConfig;
use eventharvest::models::{EventField, EventRecord, SENTINEL};
use eventharvest::parser::{AssemblyState, RecordAssembler};

const FULL_URL: &str = "https://lu.ma/e/rust-india";
const SPARSE_URL: &str = "https://lu.ma/e/founders-breakfast";

fn assemble(url: &str, html: &str) -> EventRecord {
    RecordAssembler::default()
        .assemble(url, html)
        .expect("fixture should parse")
}

fn page(body: &str) -> String {
    format!("<html><head><title>Page</title></head><body>{body}</body></html>")
}

// ============================================================================
// Structured Event Page
// ============================================================================

#[test]
fn test_full_event_name() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(record.event_name, "Rust India Meetup");
}

#[test]
fn test_full_event_date_time_drops_offset() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(record.date_time, "Monday 6 October 10:00 - 19:00");
    assert!(!record.date_time.contains("GMT"));
}

#[test]
fn test_full_event_location_from_marker_glyph() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(record.location, "Koramangala Social");
}

#[test]
fn test_full_event_details_strip_heading() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert!(record
        .event_details
        .starts_with("Join the Rust India community"));
    assert!(record.event_details.ends_with("open networking."));
    assert!(!record.event_details.contains("About Event"));
}

#[test]
fn test_full_event_organizer_and_contact() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(record.organizer_name, "Asha Rao");
    assert_eq!(record.organizer_contact, "https://lu.ma/u/usr-asha");
}

#[test]
fn test_full_event_email() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(record.host_email, "hello@rustindia.dev");
}

#[test]
fn test_full_event_social_links_in_source_order() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    assert_eq!(
        record.social_links(),
        vec![
            "https://x.com/rustindia",
            "https://www.instagram.com/rustindia",
            "https://www.linkedin.com/in/asharao",
        ]
    );
    assert!(!record.host_social_media.contains("dropbox"));
}

#[test]
fn test_script_content_never_reaches_fields() {
    let record = assemble(FULL_URL, &load_fixture("full_event.html"));
    for field in EventField::ALL {
        assert!(!record.get(field).contains("nobody"), "{field}");
        assert!(!record.get(field).contains("__NEXT_DATA__"), "{field}");
    }
}

#[test]
fn test_profile_merge_adds_new_platforms_only() {
    let assembler = RecordAssembler::default();
    let mut pending = assembler
        .extract(FULL_URL, &load_fixture("full_event.html"))
        .unwrap();
    assert_eq!(pending.state(), AssemblyState::SocialLinksExtracted);

    let profile_url = pending.profile_url().map(str::to_string).unwrap();
    assembler.merge_profile(&mut pending, &profile_url, &load_fixture("profile.html"));

    let record = pending.finalize();
    assert_eq!(
        record.host_social_media,
        "https://x.com/rustindia, https://www.instagram.com/rustindia, \
         https://www.linkedin.com/in/asharao, https://github.com/asharao"
    );
}

// ============================================================================
// Text-Only Event Page
// ============================================================================

#[test]
fn test_sparse_name_from_page_title() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert_eq!(record.event_name, "Founders Breakfast");
}

#[test]
fn test_sparse_relative_date_with_meridiem_range() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert_eq!(record.date_time, "Tomorrow 8:30 AM - 10:00 AM");
}

#[test]
fn test_sparse_location_from_at_prefix() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert_eq!(record.location, "Third Wave Coffee");
}

#[test]
fn test_sparse_details_from_leading_paragraphs() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert_eq!(
        record.event_details,
        "Tomorrow 8:30 AM - 10:00 AM Breakfast meetup at Third Wave Coffee. \
         Come meet early stage founders and operators over coffee and idli."
    );
}

#[test]
fn test_sparse_organizer_from_label() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert_eq!(record.organizer_name, "Priya Menon");
    assert_eq!(record.organizer_contact, SENTINEL);
}

#[test]
fn test_sparse_missing_fields_are_sentinel() {
    let record = assemble(SPARSE_URL, &load_fixture("sparse_event.html"));
    assert!(record.is_missing(EventField::HostEmail));
    assert!(record.is_missing(EventField::HostSocialMedia));
    assert_eq!(record.event_url, SPARSE_URL);
}

// ============================================================================
// Cross-cutting Properties
// ============================================================================

#[test]
fn test_no_field_is_ever_empty() {
    let pages = [
        load_fixture("full_event.html"),
        load_fixture("sparse_event.html"),
        load_fixture("profile.html"),
        load_fixture("explore.html"),
        page(""),
        page("<p>   </p><div>\u{200B}</div>"),
    ];

    for html in &pages {
        let record = assemble("https://lu.ma/e/any", html);
        for field in EventField::ALL {
            assert!(!record.get(field).is_empty(), "{field} empty");
            assert_eq!(record.get(field).trim(), record.get(field), "{field} untrimmed");
        }
    }
}

#[test]
fn test_structural_name_beats_label_pattern() {
    let html = page(r#"<h1 class="title">Structural Title</h1><p>Event name: Pattern Title</p>"#);
    let record = assemble("https://lu.ma/e/precedence", &html);
    assert_eq!(record.event_name, "Structural Title");
}

#[test]
fn test_label_pattern_used_without_structure() {
    let html = "<html><body><p>Event name: Pattern Title</p></body></html>";
    let record = assemble("https://lu.ma/e/label", html);
    assert_eq!(record.event_name, "Pattern Title");
}

#[test]
fn test_date_and_time_are_joined() {
    let html = page("<div>Monday 6 October</div><div>10:00 - 19:00</div>");
    let record = assemble("https://lu.ma/e/join", &html);
    assert_eq!(record.date_time, "Monday 6 October 10:00 - 19:00");
}

#[test]
fn test_short_description_falls_through() {
    let html = page(
        r#"<div class="description">Too short.</div>
           <p>A longer paragraph that easily clears the minimum.</p>"#,
    );
    let record = assemble("https://lu.ma/e/short", &html);
    assert_eq!(
        record.event_details,
        "A longer paragraph that easily clears the minimum."
    );
}

#[test]
fn test_long_description_is_truncated() {
    let long = "x".repeat(1500);
    let html = page(&format!(r#"<div class="description">{long}</div>"#));
    let record = assemble("https://lu.ma/e/long", &html);
    assert_eq!(record.event_details.chars().count(), 1200);
}

#[test]
fn test_social_links_are_deduplicated_and_capped() {
    let html = page(
        r#"<div class="social-links">
             <a href="https://x.com/one">1</a>
             <a href="https://X.com/ONE">1 again</a>
             <a href="https://instagram.com/two">2</a>
             <a href="https://facebook.com/three">3</a>
             <a href="https://linkedin.com/in/four">4</a>
             <a href="https://youtube.com/@five">5</a>
             <a href="https://tiktok.com/@six">6</a>
             <a href="https://github.com/seven">7</a>
             <a href="https://t.me/eight">8</a>
           </div>"#,
    );
    let record = assemble("https://lu.ma/e/social", &html);
    let links = record.social_links();
    assert_eq!(links.len(), 5);
    assert_eq!(links[0], "https://x.com/one");
    assert_eq!(links[4], "https://youtube.com/@five");
}

#[test]
fn test_social_links_dedup_across_sources_before_cap() {
    let html = page(
        r#"<div class="social-links">
             <a href="https://x.com/one">x</a>
             <a href="https://instagram.com/two">ig</a>
           </div>
           <div class="host-card">
             <a href="https://X.com/ONE">x again</a>
             <a href="https://linkedin.com/in/three">li</a>
           </div>
           <p>Follow https://INSTAGRAM.com/TWO and https://youtube.com/@four.</p>"#,
    );
    let profile = r#"<html><body>
        <a href="https://LinkedIn.com/in/THREE">li</a>
        <a href="https://facebook.com/five">fb</a>
        <a href="https://tiktok.com/@six">tt</a>
    </body></html>"#;

    let assembler = RecordAssembler::default();
    let mut pending = assembler
        .extract("https://lu.ma/e/mixed", &html)
        .unwrap();
    assembler.merge_profile(&mut pending, "https://lu.ma/u/usr-mixed", profile);
    let record = pending.finalize();

    assert_eq!(
        record.social_links(),
        vec![
            "https://x.com/one",
            "https://instagram.com/two",
            "https://linkedin.com/in/three",
            "https://youtube.com/@four",
            "https://facebook.com/five",
        ]
    );
}

#[test]
fn test_location_noise_is_stripped() {
    let html = page("<div>📍 Indiranagar Social Sign in to register</div>");
    let record = assemble("https://lu.ma/e/noise", &html);
    assert_eq!(record.location, "Indiranagar Social");
}

#[test]
fn test_extra_selectors_from_config() {
    let config = ExtractionConfig {
        extra_name_selectors: vec!["span.headline".to_string()],
        ..ExtractionConfig::default()
    };
    let html = "<html><body><span class=\"headline\">Configured Name</span></body></html>";
    let record = RecordAssembler::new(&config)
        .assemble("https://lu.ma/e/custom", html)
        .unwrap();
    assert_eq!(record.event_name, "Configured Name");
}

#[test]
fn test_invalid_extra_selector_is_skipped() {
    let config = ExtractionConfig {
        extra_name_selectors: vec!["[[broken".to_string()],
        ..ExtractionConfig::default()
    };
    let html = "<html><head><title>Fallback · Luma</title></head><body></body></html>";
    let record = RecordAssembler::new(&config)
        .assemble("https://lu.ma/e/broken", html)
        .unwrap();
    assert_eq!(record.event_name, "Fallback");
}
