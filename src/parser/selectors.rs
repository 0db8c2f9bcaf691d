//! CSS selectors for event pages and listing pages
//!
//! Every list is ordered from most to least specific. Strategies walk a list
//! in order, so reordering entries changes which value wins.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

// Ordered list of selectors that keep their source text for logging
macro_rules! selector_list {
    ($($s:expr),+ $(,)?) => {
        vec![$(NamedSelector { css: $s, selector: parse_selector!($s) }),+]
    };
}

/// A parsed selector together with its source text
#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub css: &'static str,
    pub selector: Selector,
}

lazy_static! {
    // Event title; the bare heading tag is the last resort
    static ref EVENT_NAME: Vec<NamedSelector> = selector_list![
        r#"h1[data-testid="event-title"]"#,
        r#"[data-testid="event-name"]"#,
        "h1.event-title",
        "h1.title",
        r#"[class*="title"]"#,
        "h1",
    ];

    static ref EVENT_DATE: Vec<NamedSelector> = selector_list![
        r#"[data-testid="event-date"]"#,
        ".event-date",
        ".date",
        r#"[class*="date"]"#,
        r#"[class*="time"]"#,
        r#"[class*="datetime"]"#,
    ];

    static ref EVENT_LOCATION: Vec<NamedSelector> = selector_list![
        r#"[data-testid="event-location"]"#,
        ".event-location",
        ".location",
        r#"[class*="location"]"#,
        r#"[class*="venue"]"#,
        r#"[class*="address"]"#,
        r#"[class*="place"]"#,
        r#"[class*="where"]"#,
    ];

    static ref EVENT_DETAILS: Vec<NamedSelector> = selector_list![
        r#"[data-testid="event-description"]"#,
        r#"[data-testid="event-details"]"#,
        r#"section[data-testid*="description"]"#,
        r#"div[data-testid*="description"]"#,
        r#"section[class*="description"]"#,
        r#"div[class*="description"]"#,
        r#"section[class*="about"]"#,
        r#"div[class*="about"]"#,
        "article",
    ];

    static ref ORGANIZER: Vec<NamedSelector> = selector_list![
        r#"[data-testid="organizer-name"]"#,
        ".organizer-name",
        ".organizer",
        r#"[class*="organizer"]"#,
        r#"[class*="host"]"#,
        r#"[class*="creator"]"#,
        r#"[class*="by"]"#,
        r#"a[href*="/u/"]"#,
    ];

    static ref CONTACT_CONTAINERS: Vec<NamedSelector> = selector_list![
        r#"[class*="contact"]"#,
        r#"[class*="email"]"#,
        r#"[class*="phone"]"#,
        r#"[class*="social"]"#,
        r#"[data-testid*="contact"]"#,
    ];

    static ref SOCIAL_GROUPS: Vec<NamedSelector> = selector_list![
        r#"div[class*="social-links"]"#,
        r#"section[class*="social-links"]"#,
    ];

    static ref SOCIAL_SINGLES: Vec<NamedSelector> = selector_list![
        r#"div[class*="social-link"]"#,
        r#"span[class*="social-link"]"#,
    ];

    static ref HOST_CONTEXT: Vec<NamedSelector> = selector_list![
        r#"[class*="host"]"#,
        r#"[class*="organizer"]"#,
        r#"[class*="creator"]"#,
        r#"[class*="by"]"#,
        r#"[data-testid*="host"]"#,
        r#"[data-testid*="organizer"]"#,
        r#"[data-testid*="creator"]"#,
        r#"[class*="event-creator"]"#,
        r#"[class*="event-organizer"]"#,
        r#"[class*="event-host"]"#,
    ];

    // Event links on listing pages; the first selector with any match wins
    static ref LISTING_LINKS: Vec<NamedSelector> = selector_list![
        r#"a[href*="/event/"]"#,
        r#"a[href*="/e/"]"#,
        r#"[data-testid="event-card"] a"#,
        ".event-card a",
        r#"a[class*="event"]"#,
    ];

    static ref CITY_LISTING_LINKS: Vec<NamedSelector> = selector_list![
        r#"a[href*="/event/"]"#,
        r#"a[href*="/e/"]"#,
        r#"[data-testid="event-card"] a"#,
        ".event-card a",
        r#"a[class*="event"]"#,
        r#"[class*="event"] a"#,
    ];

    pub static ref DATETIME_ATTR: Selector = parse_selector!("time[datetime]");
    pub static ref OG_TITLE: Selector = parse_selector!(r#"meta[property="og:title"]"#);
    pub static ref PAGE_TITLE: Selector = parse_selector!("title");
    pub static ref ANCHORS: Selector = parse_selector!("a[href]");
    pub static ref PROFILE_ANCHORS: Selector = parse_selector!(r#"a[href*="/u/"]"#);
    pub static ref PARAGRAPHS: Selector = parse_selector!("p");
    pub static ref HEADING_CANDIDATES: Selector = parse_selector!("h1, h2, h3, h4, p, span");
    pub static ref HOST_MARKER_CANDIDATES: Selector = parse_selector!("div, section, span, p");
}

/// Tags that end a heading-anchored section
pub const SECTION_BOUNDARY_TAGS: &[&str] = &["h1", "h2", "h3", "h4"];

/// Tags left out of the plain-text projection
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Tags that start a new line in the plain-text projection
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Selectors for the fields of one event page
pub struct EventSelectors {
    pub name: &'static [NamedSelector],
    pub date: &'static [NamedSelector],
    pub location: &'static [NamedSelector],
    pub details: &'static [NamedSelector],
    pub organizer: &'static [NamedSelector],
    pub contact_containers: &'static [NamedSelector],
}

impl EventSelectors {
    pub fn new() -> Self {
        Self {
            name: &EVENT_NAME,
            date: &EVENT_DATE,
            location: &EVENT_LOCATION,
            details: &EVENT_DETAILS,
            organizer: &ORGANIZER,
            contact_containers: &CONTACT_CONTAINERS,
        }
    }
}

impl Default for EventSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Container selectors searched by the social link aggregator
pub struct SocialSelectors {
    pub groups: &'static [NamedSelector],
    pub singles: &'static [NamedSelector],
    pub host_context: &'static [NamedSelector],
}

impl SocialSelectors {
    pub fn new() -> Self {
        Self {
            groups: &SOCIAL_GROUPS,
            singles: &SOCIAL_SINGLES,
            host_context: &HOST_CONTEXT,
        }
    }
}

impl Default for SocialSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Event link selectors for a listing page
pub fn listing_links(city_page: bool) -> &'static [NamedSelector] {
    if city_page {
        &CITY_LISTING_LINKS
    } else {
        &LISTING_LINKS
    }
}
