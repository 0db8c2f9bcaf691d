//! Field strategies and the cascade runner
//!
//! A [`Cascade`] is an ordered list of [`Strategy`] values for one field.
//! Running it asks each strategy for raw candidates in turn and cleans every
//! candidate with the field's normalizer; the first candidate that survives
//! is committed and nothing after it runs.
//!
//! A strategy that fails is logged at debug level and treated as if it had
//! produced nothing. A candidate rejected by the normalizer is logged at trace
//! level only.

use scraper::{ElementRef, Selector};
use tracing::{debug, trace};

use super::document::{element_text, next_siblings, own_string, DocumentView, Sibling};
use super::normalize::{clean, FieldKind};
use super::patterns::{
    PatternSet, DETAILS_HEADING, EMAIL_PATTERNS, ORGANIZER_LABEL_PATTERNS, PROFILE_PATH,
    TIME_PATTERNS, DATE_PATTERNS,
};
use super::selectors::{
    NamedSelector, HEADING_CANDIDATES, PARAGRAPHS, PROFILE_ANCHORS, SECTION_BOUNDARY_TAGS,
};
use crate::models::EventField;
use crate::utils::error::ParseError;

/// Sibling texts collected after a section heading
const SECTION_SIBLING_LIMIT: usize = 5;

/// One way of producing raw candidates for a field
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Text of the first node matched by each selector, in selector order
    FirstMatchText(&'static [NamedSelector]),
    /// Text of every node matched by each selector, in document order
    EachMatchText(&'static [NamedSelector]),
    /// Selectors supplied at runtime, tried like [`Strategy::FirstMatchText`]
    CustomSelectors(Vec<String>),
    /// An attribute of the first element that carries it
    Attribute {
        selector: &'static Selector,
        attr: &'static str,
    },
    /// Text of the first element matched by the selector
    ElementText(&'static Selector),
    /// First accepted pattern match over the text projection
    FirstPattern(&'static PatternSet),
    /// Accepted pattern matches over the text projection, in precedence order
    EachPattern(&'static PatternSet),
    /// First date match joined with the first time match
    DateTimeJoin,
    /// Siblings following an "about"/"agenda" heading
    HeadingSection,
    /// The first paragraphs of the page joined together
    LeadingParagraphs(usize),
    /// Address of the first `mailto:` link
    MailtoLink,
    /// Email pattern over the markup of contact-like containers
    ContactContainers(&'static [NamedSelector]),
}

impl Strategy {
    /// Short name used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstMatchText(_) => "first_match_text",
            Self::EachMatchText(_) => "each_match_text",
            Self::CustomSelectors(_) => "custom_selectors",
            Self::Attribute { .. } => "attribute",
            Self::ElementText(_) => "element_text",
            Self::FirstPattern(_) => "first_pattern",
            Self::EachPattern(_) => "each_pattern",
            Self::DateTimeJoin => "date_time_join",
            Self::HeadingSection => "heading_section",
            Self::LeadingParagraphs(_) => "leading_paragraphs",
            Self::MailtoLink => "mailto_link",
            Self::ContactContainers(_) => "contact_containers",
        }
    }

    /// Raw candidates in the order they should be tried
    pub fn candidates(&self, doc: &DocumentView) -> Result<Vec<String>, ParseError> {
        let candidates = match self {
            Self::FirstMatchText(selectors) => selectors
                .iter()
                .filter_map(|s| doc.first_text(&s.selector))
                .collect(),

            Self::EachMatchText(selectors) => selectors
                .iter()
                .flat_map(|s| doc.select_all(&s.selector).map(element_text))
                .collect(),

            Self::CustomSelectors(sources) => {
                let mut out = Vec::with_capacity(sources.len());
                for source in sources {
                    let selector = Selector::parse(source)
                        .map_err(|e| ParseError::InvalidSelector(format!("{source}: {e}")))?;
                    out.extend(doc.first_text(&selector));
                }
                out
            }

            Self::Attribute { selector, attr } => {
                doc.attr(selector, attr).map(str::to_string).into_iter().collect()
            }

            Self::ElementText(selector) => doc.first_text(selector).into_iter().collect(),

            Self::FirstPattern(set) => set.find_first(doc.text()).into_iter().collect(),

            Self::EachPattern(set) => set.find_all(doc.text()),

            Self::DateTimeJoin => {
                let date = DATE_PATTERNS.find_first(doc.text());
                let time = TIME_PATTERNS.find_first(doc.text());
                match (date, time) {
                    (Some(date), Some(time)) => vec![format!("{date} {time}")],
                    (Some(only), None) | (None, Some(only)) => vec![only],
                    (None, None) => Vec::new(),
                }
            }

            Self::HeadingSection => doc
                .select_all(&HEADING_CANDIDATES)
                .filter(|el| own_string(*el).is_some_and(|s| DETAILS_HEADING.is_match(s)))
                .map(section_after)
                .collect(),

            Self::LeadingParagraphs(count) => {
                let joined = doc
                    .select_all(&PARAGRAPHS)
                    .take(*count)
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                vec![joined]
            }

            Self::MailtoLink => doc
                .anchors()
                .find_map(|(_, href)| mailto_address(href))
                .into_iter()
                .collect(),

            Self::ContactContainers(selectors) => selectors
                .iter()
                .filter_map(|s| doc.select_first(&s.selector))
                .filter_map(|el| EMAIL_PATTERNS.find_first(&el.html()))
                .collect(),
        };

        Ok(candidates)
    }
}

fn section_after(heading: ElementRef<'_>) -> String {
    let mut texts = Vec::new();

    for sibling in next_siblings(heading) {
        if let Sibling::Element(el) = sibling {
            if SECTION_BOUNDARY_TAGS.contains(&el.value().name()) {
                break;
            }
        }

        let text = sibling.text();
        if !text.is_empty() {
            texts.push(text);
        }
        if texts.len() >= SECTION_SIBLING_LIMIT {
            break;
        }
    }

    texts.join(" ")
}

fn mailto_address(href: &str) -> Option<String> {
    let rest = href.trim().strip_prefix("mailto:")?;
    let address = rest.split('?').next().unwrap_or(rest);
    EMAIL_PATTERNS.find_first(address)
}

/// A committed value and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub value: String,
    pub strategy: &'static str,
}

/// Ordered strategies for one field
#[derive(Debug, Clone)]
pub struct Cascade {
    pub field: EventField,
    pub kind: FieldKind,
    strategies: Vec<Strategy>,
}

impl Cascade {
    pub fn new(field: EventField, kind: FieldKind, strategies: Vec<Strategy>) -> Self {
        Self {
            field,
            kind,
            strategies,
        }
    }

    /// Run strategies in order and commit the first surviving candidate
    pub fn run(&self, doc: &DocumentView) -> Option<Committed> {
        for strategy in &self.strategies {
            let candidates = match strategy.candidates(doc) {
                Ok(candidates) => candidates,
                Err(e) => {
                    debug!(
                        url = %doc.url(),
                        field = %self.field,
                        strategy = strategy.label(),
                        error = %e,
                        "Strategy failed, trying next"
                    );
                    continue;
                }
            };

            for raw in candidates {
                match clean(&raw, self.kind) {
                    Some(value) => {
                        trace!(field = %self.field, strategy = strategy.label(), "Committed");
                        return Some(Committed {
                            value,
                            strategy: strategy.label(),
                        });
                    }
                    None => trace!(
                        field = %self.field,
                        strategy = strategy.label(),
                        chars = raw.chars().count(),
                        "Candidate rejected"
                    ),
                }
            }
        }

        None
    }
}

/// Organizer name and profile contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizerMatch {
    pub name: Option<String>,
    pub contact: Option<String>,
}

/// Organizer cascade
///
/// Name and contact come from the same node when possible, so this does not
/// fit the single-value [`Cascade`]:
///
/// 1. Structural selectors; the first surviving node supplies the name, and
///    its link target the contact when the node is an anchor
/// 2. Without a contact, the first profile anchor supplies it (and the name
///    when still missing)
/// 3. Without a name, label patterns over the page text
#[derive(Debug, Clone)]
pub struct OrganizerCascade {
    selectors: &'static [NamedSelector],
}

impl OrganizerCascade {
    pub fn new(selectors: &'static [NamedSelector]) -> Self {
        Self { selectors }
    }

    pub fn run(&self, doc: &DocumentView) -> OrganizerMatch {
        let mut found = OrganizerMatch::default();

        for named in self.selectors {
            let Some(el) = doc.select_first(&named.selector) else {
                continue;
            };
            let Some(name) = clean(&element_text(el), FieldKind::Organizer) else {
                trace!(selector = named.css, "Organizer candidate rejected");
                continue;
            };

            found.name = Some(name);
            if el.value().name() == "a" {
                found.contact = el.value().attr("href").and_then(|h| doc.resolve(h));
            }
            break;
        }

        if found.contact.is_none() {
            if let Some(anchor) = doc.select_first(&PROFILE_ANCHORS) {
                found.contact = anchor
                    .value()
                    .attr("href")
                    .filter(|h| h.contains(PROFILE_PATH))
                    .and_then(|h| doc.resolve(h));
                if found.name.is_none() {
                    found.name = clean(&element_text(anchor), FieldKind::Organizer);
                }
            }
        }

        if found.name.is_none() {
            found.name = ORGANIZER_LABEL_PATTERNS
                .find_all(doc.text())
                .iter()
                .find_map(|raw| clean(raw, FieldKind::Organizer));
        }

        found
    }
}
