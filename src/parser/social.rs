//! Social link aggregation
//!
//! Links are gathered from five sources on the event page, in this order,
//! without short-circuiting:
//!
//! 1. anchors inside "social links" group containers
//! 2. anchors inside single "social link" containers
//! 3. anchors inside host, organizer or creator containers
//! 4. anchors next to a "hosted by" / "organizer" / "creator" text node
//! 5. platform URL shapes found in the page text
//!
//! Every link must point at an allow-listed platform host. Duplicates are
//! detected case-insensitively and the first spelling seen is kept. The
//! organizer profile page, when fetched, adds at most a few more links
//! through [`SocialAggregator::profile_links`].

use scraper::ElementRef;
use std::collections::HashSet;
use tracing::trace;
use url::Url;

use super::document::{own_string, parent_element, DocumentView};
use super::patterns::{Platform, HOST_MARKER, SOCIAL_URL_PATTERNS};
use super::selectors::{NamedSelector, SocialSelectors, ANCHORS, HOST_MARKER_CANDIDATES};
use crate::models::SOCIAL_SEPARATOR;

/// Characters that end a URL pasted into running text
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// Ordered, deduplicated set of social links for one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinkSet {
    links: Vec<String>,
    seen: HashSet<String>,
}

impl SocialLinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link unless an equal one (ignoring case) is already present
    pub fn insert(&mut self, link: String) -> bool {
        if self.seen.insert(link.to_lowercase()) {
            self.links.push(link);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.links
    }

    /// First `cap` links in insertion order
    pub fn capped(&self, cap: usize) -> &[String] {
        &self.links[..self.links.len().min(cap)]
    }

    /// Record value for the first `cap` links, `None` when empty
    pub fn serialize(&self, cap: usize) -> Option<String> {
        let kept = self.capped(cap);
        (!kept.is_empty()).then(|| kept.join(SOCIAL_SEPARATOR))
    }
}

/// Accept `href` when it is an http(s) URL on an allow-listed host
pub fn accept_link(doc: &DocumentView, href: &str) -> Option<String> {
    let resolved = doc.resolve(href)?;
    let url = Url::parse(&resolved).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    Platform::from_host(url.host_str()?)?;
    Some(resolved)
}

fn trim_pasted_url(raw: &str) -> &str {
    raw.trim_end_matches(TRAILING_PUNCTUATION)
}

/// Multi-source social link collector
#[derive(Debug, Clone)]
pub struct SocialAggregator {
    groups: &'static [NamedSelector],
    singles: &'static [NamedSelector],
    host_context: &'static [NamedSelector],
    max_profile_links: usize,
}

impl SocialAggregator {
    pub fn new(max_profile_links: usize) -> Self {
        let selectors = SocialSelectors::new();
        Self {
            groups: selectors.groups,
            singles: selectors.singles,
            host_context: selectors.host_context,
            max_profile_links,
        }
    }

    /// Collect links from every on-page source
    pub fn collect(&self, doc: &DocumentView) -> SocialLinkSet {
        let mut links = SocialLinkSet::new();

        for (source, selectors) in [
            ("social_group", self.groups),
            ("social_single", self.singles),
            ("host_context", self.host_context),
        ] {
            for named in selectors {
                for container in doc.select_all(&named.selector) {
                    self.add_anchors(doc, container, source, &mut links);
                }
            }
        }

        for marker in doc
            .select_all(&HOST_MARKER_CANDIDATES)
            .filter(|el| own_string(*el).is_some_and(|s| HOST_MARKER.is_match(s)))
        {
            if let Some(parent) = parent_element(marker) {
                self.add_anchors(doc, parent, "host_marker", &mut links);
            }
        }

        for raw in SOCIAL_URL_PATTERNS.find_all(doc.text()) {
            if let Some(link) = accept_link(doc, trim_pasted_url(&raw)) {
                links.insert(link);
            }
        }

        links
    }

    /// Links found on an organizer profile page, capped
    pub fn profile_links(&self, profile: &DocumentView) -> Vec<String> {
        let mut links = SocialLinkSet::new();

        for (_, href) in profile.anchors() {
            if let Some(link) = accept_link(profile, href) {
                links.insert(link);
            }
        }
        for raw in SOCIAL_URL_PATTERNS.find_all(profile.text()) {
            if let Some(link) = accept_link(profile, trim_pasted_url(&raw)) {
                links.insert(link);
            }
        }

        links.capped(self.max_profile_links).to_vec()
    }

    fn add_anchors(
        &self,
        doc: &DocumentView,
        container: ElementRef<'_>,
        source: &'static str,
        links: &mut SocialLinkSet,
    ) {
        let own = (container.value().name() == "a")
            .then(|| container.value().attr("href"))
            .flatten();
        let nested = container
            .select(&ANCHORS)
            .filter_map(|a| a.value().attr("href"));

        for href in own.into_iter().chain(nested) {
            if let Some(link) = accept_link(doc, href) {
                if links.insert(link) {
                    trace!(source, href, "Social link collected");
                }
            }
        }
    }
}
