// Core data structures for the event harvester

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Placeholder stored in any field that could not be recovered
pub const SENTINEL: &str = "N/A";

/// Separator used when serializing the social link list into one field
pub const SOCIAL_SEPARATOR: &str = ", ";

/// Extraction output for one event page
///
/// Every field is a plain string so that a record can be written verbatim as
/// one JSON object or one CSV row. Missing values hold [`SENTINEL`], never an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_name: String,
    pub date_time: String,
    pub location: String,
    pub event_details: String,
    pub organizer_name: String,
    pub organizer_contact: String,
    pub host_email: String,
    pub host_social_media: String,
    pub event_url: String,
}

impl EventRecord {
    /// Value of one field
    pub fn get(&self, field: EventField) -> &str {
        match field {
            EventField::EventName => &self.event_name,
            EventField::DateTime => &self.date_time,
            EventField::Location => &self.location,
            EventField::EventDetails => &self.event_details,
            EventField::OrganizerName => &self.organizer_name,
            EventField::OrganizerContact => &self.organizer_contact,
            EventField::HostEmail => &self.host_email,
            EventField::HostSocialMedia => &self.host_social_media,
            EventField::EventUrl => &self.event_url,
        }
    }

    /// Whether a field holds the sentinel
    pub fn is_missing(&self, field: EventField) -> bool {
        self.get(field) == SENTINEL
    }

    /// Field values in export column order
    pub fn to_row(&self) -> Vec<String> {
        EventField::ALL
            .iter()
            .map(|field| self.get(*field).to_string())
            .collect()
    }

    /// Social links as a list (empty when the field is the sentinel)
    pub fn social_links(&self) -> Vec<&str> {
        if self.host_social_media == SENTINEL {
            return Vec::new();
        }
        self.host_social_media
            .split(SOCIAL_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Keyword filter over name, location and organizer
    ///
    /// An empty keyword list keeps every record.
    pub fn matches_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let haystack = format!(
            "{} {} {}",
            self.event_name, self.location, self.organizer_name
        )
        .to_lowercase();

        keywords
            .iter()
            .any(|k| haystack.contains(&k.as_ref().to_lowercase()))
    }
}

/// The nine output fields, in export column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    EventName,
    DateTime,
    Location,
    EventDetails,
    OrganizerName,
    OrganizerContact,
    HostEmail,
    HostSocialMedia,
    EventUrl,
}

impl EventField {
    pub const ALL: [EventField; 9] = [
        Self::EventName,
        Self::DateTime,
        Self::Location,
        Self::EventDetails,
        Self::OrganizerName,
        Self::OrganizerContact,
        Self::HostEmail,
        Self::HostSocialMedia,
        Self::EventUrl,
    ];

    /// Column / JSON key name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventName => "event_name",
            Self::DateTime => "date_time",
            Self::Location => "location",
            Self::EventDetails => "event_details",
            Self::OrganizerName => "organizer_name",
            Self::OrganizerContact => "organizer_contact",
            Self::HostEmail => "host_email",
            Self::HostSocialMedia => "host_social_media",
            Self::EventUrl => "event_url",
        }
    }

    /// Header row for tabular export
    pub fn header() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }
}

impl std::fmt::Display for EventField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Crawl progress, persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrawlState {
    pub completed_urls: HashSet<String>,
    pub last_source: Option<String>,
    pub total_fetched: u32,
    pub total_errors: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlState {
    /// Create new crawl state
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            started_at: Some(now),
            updated_at: now,
            ..Default::default()
        }
    }

    /// Mark a page as extracted
    pub fn mark_completed(&mut self, url: &str) {
        self.completed_urls.insert(url.to_string());
        self.total_fetched += 1;
        self.updated_at = Utc::now();
    }

    /// Record a failed page
    pub fn record_error(&mut self) {
        self.total_errors += 1;
        self.updated_at = Utc::now();
    }

    /// Check whether a page was already extracted
    pub fn is_completed(&self, url: &str) -> bool {
        self.completed_urls.contains(url)
    }

    /// Save state to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load state from a JSON file; a missing or corrupt file yields a fresh state
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_else(Self::new)
    }
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Event URLs found on the listing page
    pub discovered: u32,
    /// Pages the loader returned markup for
    pub fetched: u32,
    /// Records produced by the assembler
    pub extracted: u32,
    /// Records dropped by the keyword filter
    pub filtered_out: u32,
    /// Pages that could not be acquired
    pub failed: u32,
    /// URLs left unscheduled because of cancellation
    pub cancelled: u32,
    pub duration_secs: u64,
}

impl CrawlStats {
    /// Percentage of attempted pages that failed
    pub fn error_rate(&self) -> f64 {
        let attempted = self.fetched + self.failed;
        if attempted == 0 {
            0.0
        } else {
            (self.failed as f64 / attempted as f64) * 100.0
        }
    }

    /// Records kept after filtering
    pub fn kept(&self) -> u32 {
        self.extracted.saturating_sub(self.filtered_out)
    }
}
