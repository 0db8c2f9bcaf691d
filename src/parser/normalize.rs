//! Text normalization for extracted field candidates
//!
//! Every candidate a strategy produces goes through [`clean`] before it can be
//! committed to a record. One cleaning pass is a fixed pipeline:
//!
//! 1. Remove control characters (newline and tab survive until step 3)
//! 2. Remove invisible format characters; locations keep U+200B, which the
//!    noise patterns treat as an end-of-value marker
//! 3. Collapse whitespace runs to a single space
//! 4. Apply the field's noise strip-patterns, in order, each on the output of
//!    the previous one
//! 5. Remove any remaining zero-width characters and collapse whitespace again
//! 6. Enforce the field's length bounds
//!
//! Passes repeat until the value stops changing, so a cleaned value is a fixed
//! point: `clean(clean(x)) == clean(x)`. A candidate that ends up empty or
//! under the minimum length yields `None`, which the assembler later stores as
//! the sentinel.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::models::SENTINEL;
use crate::utils::{normalize_whitespace, truncate_chars};

/// Noise patterns for date/time values
///
/// Offset suffixes are dropped so that the stored value reads as wall-clock time.
const DATETIME_NOISE: &[&str] = &[r"GMT\+5:30", r"GMT[+-][0-9:]+", r"UTC[+-][0-9:]+"];

/// Noise patterns for locations
///
/// Order matters: the `Venue:`/`Location:` prefixes must be cut before the
/// zero-width-space rule drops everything after the marker.
const LOCATION_NOISE: &[&str] = &[
    r"Date:.*?Time:.*?",
    r"🕓.*?📍",
    r"Hosted by.*",
    "Venue:.*?\u{200B}",
    "Location:.*?\u{200B}",
    r"Contact us:.*",
    r"Email:.*",
    r"Telegram.*",
    r"Kickstart.*",
    r"We're also.*",
    r"Join our.*",
    r"Explore Events.*",
    r"Sign.*",
    r"Report.*",
    "\u{200B}.*",
    r"\.{2,}",
    r"\s+",
];

/// Noise patterns for organizer names
const ORGANIZER_NOISE: &[&str] = &[r"\.{2,}", r"\s+", r"Access Support", r"LinkedOut \."];

/// Noise patterns for event descriptions
const DETAILS_NOISE: &[&str] = &[r"\bAbout\s+Event\b[:\-]?"];

/// Noise patterns for event names taken from page titles
const NAME_NOISE: &[&str] = &[r"\s*[·|]\s*Luma\s*$"];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .unwrap()
        })
        .collect()
}

static DATETIME_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(DATETIME_NOISE));
static LOCATION_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(LOCATION_NOISE));
static ORGANIZER_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(ORGANIZER_NOISE));
static DETAILS_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(DETAILS_NOISE));
static NAME_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(NAME_NOISE));

/// Kind of field a candidate is cleaned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    EventName,
    DateTime,
    Location,
    Details,
    Organizer,
    Email,
}

/// What to do with a candidate longer than the field's maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Cut at the boundary and keep the prefix
    Truncate,
    /// Treat as no candidate
    Reject,
}

/// Length bounds of a field, counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_chars: usize,
    pub max_chars: Option<usize>,
    pub overflow: Overflow,
}

impl FieldKind {
    /// Length bounds enforced after noise stripping
    pub fn bounds(&self) -> Bounds {
        match self {
            Self::EventName => Bounds {
                min_chars: 2,
                max_chars: Some(300),
                overflow: Overflow::Truncate,
            },
            Self::DateTime => Bounds {
                min_chars: 3,
                max_chars: None,
                overflow: Overflow::Truncate,
            },
            Self::Location => Bounds {
                min_chars: 2,
                max_chars: Some(100),
                overflow: Overflow::Reject,
            },
            Self::Details => Bounds {
                min_chars: 20,
                max_chars: Some(1200),
                overflow: Overflow::Truncate,
            },
            Self::Organizer => Bounds {
                min_chars: 2,
                max_chars: Some(100),
                overflow: Overflow::Reject,
            },
            Self::Email => Bounds {
                min_chars: 6,
                max_chars: Some(254),
                overflow: Overflow::Reject,
            },
        }
    }

    /// Locations use U+200B to separate the venue from trailing page text
    fn keeps_marker(&self) -> bool {
        matches!(self, Self::Location)
    }

    fn strip_patterns(&self) -> &'static [Regex] {
        match self {
            Self::EventName => &NAME_STRIP,
            Self::DateTime => &DATETIME_STRIP,
            Self::Location => &LOCATION_STRIP,
            Self::Details => &DETAILS_STRIP,
            Self::Organizer => &ORGANIZER_STRIP,
            Self::Email => &[],
        }
    }
}

/// Clean a raw candidate for the given field kind
///
/// Returns `None` when nothing usable is left.
///
/// # Examples
///
/// ```
/// use eventharvest::parser::normalize::{clean, FieldKind};
///
/// let loc = clean("Mumbai Hosted by Someone", FieldKind::Location);
/// assert_eq!(loc.as_deref(), Some("Mumbai"));
///
/// assert_eq!(clean("too short", FieldKind::Details), None);
/// ```
pub fn clean(text: &str, kind: FieldKind) -> Option<String> {
    // Every pass that changes the value also shortens it, so this ends
    let mut current = clean_pass(text, kind)?;
    loop {
        let next = clean_pass(&current, kind)?;
        if next == current {
            return Some(current);
        }
        current = next;
    }
}

fn clean_pass(text: &str, kind: FieldKind) -> Option<String> {
    let visible: String = remove_control_chars(text)
        .chars()
        .filter(|c| !is_invisible(*c) || (*c == ZERO_WIDTH_SPACE && kind.keeps_marker()))
        .collect();
    let mut cleaned = normalize_whitespace(&visible);

    for pattern in kind.strip_patterns() {
        cleaned = pattern.replace_all(&cleaned, " ").into_owned();
    }

    let cleaned = normalize_whitespace(&remove_zero_width(&cleaned));
    enforce_bounds(cleaned, kind.bounds())
}

/// Like [`clean`], but maps a rejected candidate to the sentinel
pub fn clean_or_sentinel(text: &str, kind: FieldKind) -> String {
    clean(text, kind).unwrap_or_else(|| SENTINEL.to_string())
}

fn enforce_bounds(text: String, bounds: Bounds) -> Option<String> {
    let len = text.chars().count();

    if len == 0 || len < bounds.min_chars {
        return None;
    }

    match bounds.max_chars {
        Some(max) if len > max => match bounds.overflow {
            Overflow::Truncate => Some(truncate_chars(&text, max).trim_end().to_string()),
            Overflow::Reject => None,
        },
        _ => Some(text),
    }
}

const ZERO_WIDTH_SPACE: char = '\u{200B}';

fn is_invisible(c: char) -> bool {
    matches!(c,
        '\u{200B}'..='\u{200F}' |
        '\u{2028}'..='\u{202F}' |
        '\u{2060}' |
        '\u{FEFF}'
    )
}

/// Remove zero-width spaces and similar invisible characters
///
/// # Examples
///
/// ```
/// use eventharvest::parser::normalize::remove_zero_width;
///
/// let text = "Mum\u{200B}bai\u{FEFF}";
/// assert_eq!(remove_zero_width(text), "Mumbai");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Remove control characters except newline and tab
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            clean("  Ethereum \n\n India\tHackathon ", FieldKind::EventName).as_deref(),
            Some("Ethereum India Hackathon")
        );
    }

    #[test]
    fn test_datetime_strips_offsets() {
        assert_eq!(
            clean("Monday 6 October 10:00 GMT+5:30", FieldKind::DateTime).as_deref(),
            Some("Monday 6 October 10:00")
        );
        assert_eq!(
            clean("Oct 6 18:00 UTC+2", FieldKind::DateTime).as_deref(),
            Some("Oct 6 18:00")
        );
        assert_eq!(
            clean("Oct 6 18:00 gmt-04:00", FieldKind::DateTime).as_deref(),
            Some("Oct 6 18:00")
        );
        assert_eq!(clean("GMT+5:30", FieldKind::DateTime), None);
    }

    #[test]
    fn test_location_strips_trailing_boilerplate() {
        assert_eq!(
            clean("Bangalore Hosted by ETH India", FieldKind::Location).as_deref(),
            Some("Bangalore")
        );
        assert_eq!(
            clean("New Delhi Contact us: hello@x.io", FieldKind::Location).as_deref(),
            Some("New Delhi")
        );
        assert_eq!(
            clean("Koramangala Sign in to register", FieldKind::Location).as_deref(),
            Some("Koramangala")
        );
        assert_eq!(
            clean("Mumbai Report event", FieldKind::Location).as_deref(),
            Some("Mumbai")
        );
    }

    #[test]
    fn test_location_zero_width_marker_drops_tail() {
        assert_eq!(
            clean("Pune\u{200B}Register now for free", FieldKind::Location).as_deref(),
            Some("Pune")
        );
        assert_eq!(
            clean("Venue: \u{200B}Goa", FieldKind::Location).as_deref(),
            Some("Goa")
        );
    }

    #[test]
    fn test_location_length_bounds() {
        assert_eq!(clean("X", FieldKind::Location), None);
        let long = "a".repeat(101);
        assert_eq!(clean(&long, FieldKind::Location), None);
        let edge = "b".repeat(100);
        assert_eq!(clean(&edge, FieldKind::Location), Some(edge));
    }

    #[test]
    fn test_details_bounds() {
        assert_eq!(clean("ten chars!", FieldKind::Details), None);

        let long = "word ".repeat(300);
        let cleaned = clean(&long, FieldKind::Details).unwrap();
        assert!(cleaned.chars().count() <= 1200);
        assert!(cleaned.chars().count() >= 1199);
        assert!(!cleaned.ends_with(' '));
    }

    #[test]
    fn test_details_strips_heading_prefix() {
        assert_eq!(
            clean(
                "About Event: A full day of talks and workshops.",
                FieldKind::Details
            )
            .as_deref(),
            Some("A full day of talks and workshops.")
        );
    }

    #[test]
    fn test_organizer_cleanup() {
        assert_eq!(
            clean("ETH India... Access Support", FieldKind::Organizer).as_deref(),
            Some("ETH India")
        );
        assert_eq!(clean("A", FieldKind::Organizer), None);
    }

    #[test]
    fn test_name_drops_site_suffix() {
        assert_eq!(
            clean("Rust Meetup · Luma", FieldKind::EventName).as_deref(),
            Some("Rust Meetup")
        );
    }

    #[test]
    fn test_clean_is_idempotent_on_samples() {
        let samples = [
            ("Bangalore Hosted by ETH India", FieldKind::Location),
            ("Monday 6 October 10:00 - 19:00 GMT+5:30", FieldKind::DateTime),
            ("About Event A workshop about compilers and parsers.", FieldKind::Details),
            ("ETH.. India", FieldKind::Organizer),
            ("Sig\u{2060}nature Lounge Bengaluru", FieldKind::EventName),
            ("Access Access Support Support Guild", FieldKind::Organizer),
        ];
        for (input, kind) in samples {
            let once = clean(input, kind).unwrap();
            assert_eq!(clean(&once, kind).as_deref(), Some(once.as_str()), "{input}");
        }
    }

    #[test]
    fn test_clean_or_sentinel() {
        assert_eq!(clean_or_sentinel("", FieldKind::EventName), SENTINEL);
        assert_eq!(clean_or_sentinel("   ", FieldKind::Location), SENTINEL);
    }

    #[test]
    fn test_remove_control_chars() {
        let clean = remove_control_chars("Hello\x00World\x07\nNext");
        assert_eq!(clean, "HelloWorld\nNext");
    }

    #[test]
    fn test_invisible_characters_do_not_hide_noise() {
        assert_eq!(clean("Sig\u{2060}nature Lounge", FieldKind::Location), None);
        assert_eq!(
            clean(
                "About\u{200C} Event: A full day of talks on rust tooling",
                FieldKind::Details
            )
            .as_deref(),
            Some("A full day of talks on rust tooling")
        );
        assert_eq!(
            clean("Rust\u{FEFF} Meetup ·\u{200D} Luma", FieldKind::EventName).as_deref(),
            Some("Rust Meetup")
        );
    }

    #[test]
    fn test_repeated_noise_is_stripped_to_a_fixed_point() {
        assert_eq!(
            clean("Rust Meetup · Luma · Luma", FieldKind::EventName).as_deref(),
            Some("Rust Meetup")
        );
        assert_eq!(
            clean(
                "About About Event Event: Two days of compiler talks",
                FieldKind::Details
            )
            .as_deref(),
            Some("Two days of compiler talks")
        );
    }

    #[test]
    fn test_truncation_result_is_stable() {
        // The cut lands right after "Luma", turning the tail into a suffix
        let name = format!("{} · Lumaverse", "n".repeat(293));
        let once = clean(&name, FieldKind::EventName).unwrap();
        assert_eq!(clean(&once, FieldKind::EventName), Some(once.clone()));
        assert_eq!(once, "n".repeat(293));
    }
}
