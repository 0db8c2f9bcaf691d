//! Record assembler
//!
//! Runs every field cascade over one page and produces an [`EventRecord`].
//! Assembly moves through a fixed sequence of states:
//!
//! `Init → NameExtracted → DateTimeExtracted → LocationExtracted →
//! DetailsExtracted → OrganizerExtracted → SocialLinksExtracted → Finalized`
//!
//! [`RecordAssembler::extract`] stops at `SocialLinksExtracted` and returns a
//! [`PendingRecord`]. The caller may then fetch the organizer profile page and
//! hand it to [`RecordAssembler::merge_profile`] before calling
//! [`PendingRecord::finalize`], which fills every missing field with the
//! sentinel.
//!
//! All of this is synchronous. No page is fetched from here.

use tracing::debug;

use super::document::DocumentView;
use super::normalize::FieldKind;
use super::patterns::{EMAIL_PATTERNS, LOCATION_PATTERNS, NAME_LABEL_PATTERNS};
use super::selectors::{EventSelectors, DATETIME_ATTR, OG_TITLE, PAGE_TITLE};
use super::social::{SocialAggregator, SocialLinkSet};
use super::strategy::{Cascade, OrganizerCascade, Strategy};
use crate::config::ExtractionConfig;
use crate::models::{EventField, EventRecord, SENTINEL};
use crate::utils::error::ParseError;

/// Paragraphs joined by the last-resort description strategy
const LEADING_PARAGRAPHS: usize = 3;

/// Insert runtime selectors at position `at` when any are configured
fn with_custom(mut strategies: Vec<Strategy>, at: usize, custom: &[String]) -> Vec<Strategy> {
    if !custom.is_empty() {
        strategies.insert(at, Strategy::CustomSelectors(custom.to_vec()));
    }
    strategies
}

/// Assembly progress of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssemblyState {
    Init,
    NameExtracted,
    DateTimeExtracted,
    LocationExtracted,
    DetailsExtracted,
    OrganizerExtracted,
    SocialLinksExtracted,
    Finalized,
}

impl AssemblyState {
    /// The only state reachable from this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::NameExtracted),
            Self::NameExtracted => Some(Self::DateTimeExtracted),
            Self::DateTimeExtracted => Some(Self::LocationExtracted),
            Self::LocationExtracted => Some(Self::DetailsExtracted),
            Self::DetailsExtracted => Some(Self::OrganizerExtracted),
            Self::OrganizerExtracted => Some(Self::SocialLinksExtracted),
            Self::SocialLinksExtracted => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }
}

/// A record whose fields are extracted but not yet finalized
#[derive(Debug, Clone)]
pub struct PendingRecord {
    state: AssemblyState,
    event_url: String,
    event_name: Option<String>,
    date_time: Option<String>,
    location: Option<String>,
    event_details: Option<String>,
    organizer_name: Option<String>,
    organizer_contact: Option<String>,
    host_email: Option<String>,
    social: SocialLinkSet,
    max_social_links: usize,
}

impl PendingRecord {
    fn new(event_url: &str, max_social_links: usize) -> Self {
        Self {
            state: AssemblyState::Init,
            event_url: event_url.to_string(),
            event_name: None,
            date_time: None,
            location: None,
            event_details: None,
            organizer_name: None,
            organizer_contact: None,
            host_email: None,
            social: SocialLinkSet::new(),
            max_social_links,
        }
    }

    fn advance(&mut self, to: AssemblyState) {
        debug_assert_eq!(self.state.next(), Some(to), "out-of-order assembly step");
        self.state = to;
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn event_url(&self) -> &str {
        &self.event_url
    }

    /// Organizer profile page worth fetching for more social links
    pub fn profile_url(&self) -> Option<&str> {
        self.organizer_contact
            .as_deref()
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
    }

    /// Social links gathered so far, uncapped
    pub fn social_links(&self) -> &[String] {
        self.social.as_slice()
    }

    /// Fill missing fields with the sentinel and produce the record
    pub fn finalize(mut self) -> EventRecord {
        self.advance(AssemblyState::Finalized);

        let or_sentinel = |value: Option<String>| value.unwrap_or_else(|| SENTINEL.to_string());

        EventRecord {
            event_name: or_sentinel(self.event_name),
            date_time: or_sentinel(self.date_time),
            location: or_sentinel(self.location),
            event_details: or_sentinel(self.event_details),
            organizer_name: or_sentinel(self.organizer_name),
            organizer_contact: or_sentinel(self.organizer_contact),
            host_email: or_sentinel(self.host_email),
            host_social_media: or_sentinel(self.social.serialize(self.max_social_links)),
            event_url: self.event_url,
        }
    }
}

/// Builds event records from raw page markup
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    name: Cascade,
    date_time: Cascade,
    location: Cascade,
    details: Cascade,
    host_email: Cascade,
    organizer: OrganizerCascade,
    social: SocialAggregator,
    max_social_links: usize,
}

impl RecordAssembler {
    #[must_use]
    pub fn new(config: &ExtractionConfig) -> Self {
        let selectors = EventSelectors::new();

        let name = Cascade::new(
            EventField::EventName,
            FieldKind::EventName,
            with_custom(
                vec![
                    Strategy::FirstMatchText(selectors.name),
                    Strategy::Attribute {
                        selector: &OG_TITLE,
                        attr: "content",
                    },
                    Strategy::ElementText(&PAGE_TITLE),
                    Strategy::FirstPattern(&NAME_LABEL_PATTERNS),
                ],
                1,
                &config.extra_name_selectors,
            ),
        );

        let date_time = Cascade::new(
            EventField::DateTime,
            FieldKind::DateTime,
            vec![
                Strategy::DateTimeJoin,
                Strategy::Attribute {
                    selector: &DATETIME_ATTR,
                    attr: "datetime",
                },
                Strategy::FirstMatchText(selectors.date),
            ],
        );

        let location = Cascade::new(
            EventField::Location,
            FieldKind::Location,
            with_custom(
                vec![
                    Strategy::FirstPattern(&LOCATION_PATTERNS),
                    Strategy::FirstMatchText(selectors.location),
                ],
                2,
                &config.extra_location_selectors,
            ),
        );

        let details = Cascade::new(
            EventField::EventDetails,
            FieldKind::Details,
            with_custom(
                vec![
                    Strategy::EachMatchText(selectors.details),
                    Strategy::HeadingSection,
                    Strategy::LeadingParagraphs(LEADING_PARAGRAPHS),
                ],
                1,
                &config.extra_details_selectors,
            ),
        );

        let host_email = Cascade::new(
            EventField::HostEmail,
            FieldKind::Email,
            vec![
                Strategy::FirstPattern(&EMAIL_PATTERNS),
                Strategy::MailtoLink,
                Strategy::ContactContainers(selectors.contact_containers),
            ],
        );

        Self {
            name,
            date_time,
            location,
            details,
            host_email,
            organizer: OrganizerCascade::new(selectors.organizer),
            social: SocialAggregator::new(config.max_profile_links),
            max_social_links: config.max_social_links,
        }
    }

    /// Run every field cascade over one page
    ///
    /// # Errors
    ///
    /// Fails only when the markup cannot be turned into a document; field
    /// failures end up as missing values instead.
    pub fn extract(&self, url: &str, markup: &str) -> Result<PendingRecord, ParseError> {
        let doc = DocumentView::parse(url, markup)?;
        let mut record = PendingRecord::new(url, self.max_social_links);

        record.event_name = self.commit(&self.name, &doc);
        record.advance(AssemblyState::NameExtracted);

        record.date_time = self.commit(&self.date_time, &doc);
        record.advance(AssemblyState::DateTimeExtracted);

        record.location = self.commit(&self.location, &doc);
        record.advance(AssemblyState::LocationExtracted);

        record.event_details = self.commit(&self.details, &doc);
        record.advance(AssemblyState::DetailsExtracted);

        let organizer = self.organizer.run(&doc);
        record.organizer_name = organizer.name;
        record.organizer_contact = organizer.contact;
        record.host_email = self.commit(&self.host_email, &doc);
        record.advance(AssemblyState::OrganizerExtracted);

        record.social = self.social.collect(&doc);
        record.advance(AssemblyState::SocialLinksExtracted);

        debug!(
            url = %url,
            social_links = record.social.len(),
            has_organizer = record.organizer_name.is_some(),
            "Page extracted"
        );

        Ok(record)
    }

    /// Add social links from the organizer profile page
    ///
    /// Unparsable profile markup is ignored; the record keeps what it has.
    pub fn merge_profile(&self, record: &mut PendingRecord, profile_url: &str, markup: &str) {
        if record.state != AssemblyState::SocialLinksExtracted {
            return;
        }

        let profile = match DocumentView::parse(profile_url, markup) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(url = %profile_url, error = %e, "Profile page not parsable");
                return;
            }
        };

        let added = self
            .social
            .profile_links(&profile)
            .into_iter()
            .filter(|link| record.social.insert(link.clone()))
            .count();

        debug!(url = %profile_url, added, "Profile links merged");
    }

    /// Extract and finalize one page without a profile fetch
    pub fn assemble(&self, url: &str, markup: &str) -> Result<EventRecord, ParseError> {
        Ok(self.extract(url, markup)?.finalize())
    }

    fn commit(&self, cascade: &Cascade, doc: &DocumentView) -> Option<String> {
        let committed = cascade.run(doc)?;
        debug!(
            url = %doc.url(),
            field = %cascade.field,
            strategy = committed.strategy,
            "Field extracted"
        );
        Some(committed.value)
    }
}

impl Default for RecordAssembler {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
