//! Pattern library
//!
//! Ordered recognition patterns per semantic field. The order of every list
//! in this module is a precedence policy: strategies walk a [`PatternSet`]
//! pattern by pattern, and within one pattern match by match in document
//! order, so the first surviving match of the earliest pattern wins.
//!
//! Static word lists (weekdays, months, venue types, remote keywords, the
//! city gazetteer and the social platform allow-list) are kept apart from
//! the matching logic so they can be extended without touching it.

use regex::{Captures, Regex, RegexBuilder};
use std::fmt;
use std::sync::LazyLock;

/// Version of the pattern lists below
///
/// Bump whenever a list changes order or content, since extraction output
/// depends on it.
pub const PATTERN_LIBRARY_VERSION: u32 = 1;

pub const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Full month names first so that `March` is never cut to `Mar`
pub const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
    "Jan",
    "Feb",
    "Mar",
    "Apr",
    "Jun",
    "Jul",
    "Aug",
    "Sep",
    "Oct",
    "Nov",
    "Dec",
];

pub const RELATIVE_DAYS: &[&str] = &["Today", "Tomorrow", "Yesterday"];

/// Glyphs that pages put in front of a venue line
pub const LOCATION_GLYPHS: &[&str] = &[
    "📍", "🏢", "🏛", "🏪", "🏬", "🏭", "🏮", "🏯", "🏰", "🏱", "🏲", "🏳", "🏴", "🏵", "🏶",
    "🏷", "🏸", "🏹", "🏺",
];

pub const VENUE_TYPES: &[&str] = &[
    "Conference Room",
    "Building",
    "Floor",
    "Room",
    "Hall",
    "Auditorium",
    "Theater",
    "Theatre",
    "Center",
    "Centre",
    "Office",
    "Studio",
    "Workshop",
    "Lab",
    "Laboratory",
    "Classroom",
    "Meeting Room",
];

pub const REMOTE_KEYWORDS: &[&str] = &[
    "Online",
    "Virtual",
    "Zoom",
    "Google Meet",
    "Microsoft Teams",
    "Webinar",
    "Web Event",
    "Digital Event",
    "Remote Event",
];

/// Last-resort city names for location matching
pub const GAZETTEER: &[&str] = &[
    "New Delhi",
    "Delhi",
    "Mumbai",
    "Bangalore",
    "Chennai",
    "Hyderabad",
    "Kolkata",
    "Pune",
    "Ahmedabad",
    "Jaipur",
    "Lucknow",
    "Kanpur",
    "Nagpur",
    "Indore",
    "Thane",
    "Bhopal",
    "Visakhapatnam",
    "Pimpri-Chinchwad",
    "Patna",
    "Vadodara",
    "Ghaziabad",
    "Ludhiana",
    "Agra",
    "Nashik",
    "Faridabad",
    "Meerut",
    "Rajkot",
    "Kalyan-Dombivli",
    "Vasai-Virar",
    "Varanasi",
    "Srinagar",
    "Aurangabad",
    "Dhanbad",
    "Amritsar",
    "Allahabad",
    "Ranchi",
    "Howrah",
    "Coimbatore",
    "Jabalpur",
    "Gwalior",
    "Vijayawada",
    "Jodhpur",
    "Madurai",
    "Raipur",
    "Kota",
    "Guwahati",
    "Chandigarh",
    "Solapur",
    "Hubli-Dharwad",
    "Bareilly",
    "Moradabad",
    "Mysore",
    "Gurgaon",
    "Aligarh",
    "Jalandhar",
    "Tiruchirappalli",
    "Bhubaneswar",
    "Salem",
    "Warangal",
    "Mira-Bhayandar",
    "Thiruvananthapuram",
    "Bhiwandi",
    "Saharanpur",
    "Gorakhpur",
    "Guntur",
    "Bikaner",
    "Amravati",
    "Noida",
    "Jamshedpur",
    "Bhilai",
    "Cuttack",
    "Firozabad",
    "Kochi",
    "Nellore",
    "Bhavnagar",
    "Dehradun",
    "Durgapur",
    "Asansol",
    "Rourkela",
    "Nanded",
    "Kolhapur",
    "Ajmer",
    "Akola",
    "Gulbarga",
    "Jamnagar",
    "Ujjain",
    "Loni",
    "Siliguri",
    "Jhansi",
    "Ulhasnagar",
    "Jammu",
    "Sangli-Miraj",
    "Mangalore",
    "Erode",
    "Belgaum",
    "Ambattur",
    "Tirunelveli",
    "Malegaon",
    "Gaya",
    "Jalgaon",
    "Udaipur",
    "Maheshtala",
    "Tirupur",
    "Davanagere",
    "Kozhikode",
    "Kurnool",
    "Rajpur",
    "Sonarpur",
    "Bokaro",
    "South Dumdum",
    "Bellary",
    "Patiala",
    "Gopalpur",
    "Agartala",
    "Bhagalpur",
    "Muzaffarnagar",
    "Bhatpara",
    "Panihati",
    "Latur",
    "Dhule",
    "Rohtak",
    "Korba",
    "Bhilwara",
    "Berhampur",
    "Muzaffarpur",
    "Ahmednagar",
    "Mathura",
    "Kollam",
    "Avadi",
    "Kadapa",
    "Kamarhati",
    "Bilaspur",
    "Shahjahanpur",
    "Satara",
    "Bijapur",
    "Rampur",
    "Shivamogga",
    "Chandrapur",
    "Junagadh",
    "Thrissur",
    "Alwar",
    "Bardhaman",
    "Kulti",
    "Kakinada",
    "Nizamabad",
    "Parbhani",
    "Tumkur",
    "Hisar",
    "Ozhukarai",
    "Bihar Sharif",
    "Panipat",
    "Darbhanga",
    "Bally",
    "Aizawl",
    "Dewas",
    "Ichalkaranji",
    "Tirupati",
    "Karnal",
    "Bathinda",
    "Shivpuri",
    "Rewa",
    "Gondia",
    "Hoshiarpur",
    "Guna",
    "Raichur",
];

/// Path segment of user profile pages
pub const PROFILE_PATH: &str = "/u/";

/// Social platforms accepted by the link aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    X,
    Instagram,
    Facebook,
    LinkedIn,
    YouTube,
    TikTok,
    GitHub,
    Discord,
    Telegram,
}

impl Platform {
    /// Allow-listed hosts, in scan order
    pub const HOSTS: &'static [(&'static str, Platform)] = &[
        ("x.com", Platform::X),
        ("twitter.com", Platform::X),
        ("instagram.com", Platform::Instagram),
        ("facebook.com", Platform::Facebook),
        ("linkedin.com", Platform::LinkedIn),
        ("youtube.com", Platform::YouTube),
        ("tiktok.com", Platform::TikTok),
        ("github.com", Platform::GitHub),
        ("discord.gg", Platform::Discord),
        ("telegram.me", Platform::Telegram),
        ("t.me", Platform::Telegram),
    ];

    /// Platform for a host, matching exactly or as a subdomain
    ///
    /// ```
    /// use eventharvest::parser::patterns::Platform;
    ///
    /// assert_eq!(Platform::from_host("www.instagram.com"), Some(Platform::Instagram));
    /// assert_eq!(Platform::from_host("dropbox.com"), None);
    /// ```
    pub fn from_host(host: &str) -> Option<Platform> {
        let host = host.to_ascii_lowercase();
        Self::HOSTS.iter().find_map(|(allowed, platform)| {
            let is_match = host == *allowed
                || host
                    .strip_suffix(allowed)
                    .is_some_and(|prefix| prefix.ends_with('.'));
            is_match.then_some(*platform)
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::LinkedIn => "linkedin",
            Self::YouTube => "youtube",
            Self::TikTok => "tiktok",
            Self::GitHub => "github",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
        };
        f.write_str(name)
    }
}

/// Field a pattern set recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternField {
    Date,
    Time,
    Location,
    Organizer,
    Email,
    SocialUrl,
    EventName,
}

/// How a pattern's match is turned into one raw string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// Whole matched text
    WholeMatch,
    /// Non-empty capture groups joined with a single space
    JoinGroups,
    /// Non-empty capture groups joined with the given separator
    JoinWith(&'static str),
    /// One capture group
    Group(usize),
}

impl Assembly {
    fn assemble(&self, caps: &Captures<'_>) -> String {
        match self {
            Self::WholeMatch => caps[0].trim().to_string(),
            Self::JoinGroups => join_groups(caps, " "),
            Self::JoinWith(sep) => join_groups(caps, sep),
            Self::Group(idx) => caps
                .get(*idx)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        }
    }
}

fn join_groups(caps: &Captures<'_>, sep: &str) -> String {
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// One recognition pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: &'static str,
    regex: Regex,
    assembly: Assembly,
}

impl Pattern {
    fn new(name: &'static str, source: &str, assembly: Assembly, case_insensitive: bool) -> Self {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()
            .unwrap_or_else(|e| panic!("pattern {name} failed to compile: {e}"));
        Self {
            name,
            regex,
            assembly,
        }
    }

    fn ci(name: &'static str, source: &str, assembly: Assembly) -> Self {
        Self::new(name, source, assembly, true)
    }

    /// Assembled matches in document order
    pub fn matches<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.regex
            .captures_iter(text)
            .map(|caps| self.assembly.assemble(&caps))
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Ordered patterns for one field with raw match length limits
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub field: PatternField,
    pub version: u32,
    patterns: Vec<Pattern>,
    /// Matches with this many characters or fewer are dropped
    min_exclusive: usize,
    /// Matches with this many characters or more are dropped
    max_exclusive: Option<usize>,
}

impl PatternSet {
    fn new(field: PatternField, patterns: Vec<Pattern>) -> Self {
        Self {
            field,
            version: PATTERN_LIBRARY_VERSION,
            patterns,
            min_exclusive: 0,
            max_exclusive: None,
        }
    }

    fn longer_than(mut self, chars: usize) -> Self {
        self.min_exclusive = chars;
        self
    }

    fn shorter_than(mut self, chars: usize) -> Self {
        self.max_exclusive = Some(chars);
        self
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    fn accepts(&self, candidate: &str) -> bool {
        let len = candidate.chars().count();
        !candidate.is_empty()
            && len > self.min_exclusive
            && self.max_exclusive.map_or(true, |max| len < max)
    }

    /// All accepted matches, pattern by pattern, each in document order
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.matches(text))
            .filter(|m| self.accepts(m))
            .collect()
    }

    /// First accepted match in precedence order
    pub fn find_first(&self, text: &str) -> Option<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.matches(text))
            .find(|m| self.accepts(m))
    }
}

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Horizontal whitespace only, so location matches stay on one line
const HSPACE: &str = r"[ \t]";

pub static DATE_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    let days = alternation(WEEKDAYS);
    let months = alternation(MONTHS);
    let relative = alternation(RELATIVE_DAYS);

    PatternSet::new(
        PatternField::Date,
        vec![
            Pattern::ci(
                "weekday_day_month",
                &format!(r"\b({days})[,\s]+(\d{{1,2}})(?:st|nd|rd|th)?[,\s]+({months})\b"),
                Assembly::JoinGroups,
            ),
            Pattern::ci(
                "day_month",
                &format!(r"\b(\d{{1,2}})(?:st|nd|rd|th)?[,\s]+({months})\b"),
                Assembly::JoinGroups,
            ),
            Pattern::ci(
                "month_day",
                &format!(r"\b({months})[,\s]+(\d{{1,2}})(?:st|nd|rd|th)?\b"),
                Assembly::JoinGroups,
            ),
            Pattern::ci(
                "iso_date",
                r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b",
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "numeric_date",
                r"\b\d{1,2}[/-]\d{1,2}[/-]\d{4}\b",
                Assembly::WholeMatch,
            ),
            Pattern::ci("relative_day", &format!(r"\b({relative})\b"), Assembly::Group(1)),
        ],
    )
    .longer_than(3)
});

pub static TIME_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        PatternField::Time,
        vec![
            Pattern::ci(
                "clock_range",
                r"\b\d{1,2}:\d{2}(?:\s*(?:AM|PM))?\s*[-–—]\s*\d{1,2}:\d{2}(?:\s*(?:AM|PM)\b)?",
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "clock_time",
                r"\b\d{1,2}:\d{2}(?:\s*(?:AM|PM)\b)?",
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "meridiem_range",
                r"\b\d{1,2}(?::\d{2})?\s*(?:AM|PM)\s*(?:[-–—]|to)\s*\d{1,2}(?::\d{2})?\s*(?:AM|PM)\b",
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "twenty_four_hour_range",
                r"\b\d{2}:\d{2}\s*[-–—]\s*\d{2}:\d{2}\b",
                Assembly::WholeMatch,
            ),
        ],
    )
    .longer_than(3)
});

pub static LOCATION_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    let place = r"([A-Za-z](?:[A-Za-z \t]*[A-Za-z])?)";
    let glyphs = LOCATION_GLYPHS
        .iter()
        .map(|g| regex::escape(g))
        .collect::<Vec<_>>()
        .join("|");

    PatternSet::new(
        PatternField::Location,
        vec![
            Pattern::ci(
                "marker_glyph",
                &format!("(?:{glyphs})\u{FE0F}?{HSPACE}*{place}"),
                Assembly::Group(1),
            ),
            Pattern::ci("at_prefix", &format!(r"\bat{HSPACE}+{place}"), Assembly::Group(1)),
            Pattern::ci("in_prefix", &format!(r"\bin{HSPACE}+{place}"), Assembly::Group(1)),
            Pattern::ci(
                "venue_label",
                &format!(r"\bvenue:?{HSPACE}*{place}"),
                Assembly::Group(1),
            ),
            Pattern::ci(
                "location_label",
                &format!(r"\blocation:?{HSPACE}*{place}"),
                Assembly::Group(1),
            ),
            Pattern::ci(
                "where_label",
                &format!(r"\bwhere:?{HSPACE}*{place}"),
                Assembly::Group(1),
            ),
            Pattern::new(
                "city_region",
                r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*),[ \t]*([A-Z]{2}|[A-Z][a-z]+)\b",
                Assembly::JoinWith(", "),
                false,
            ),
            Pattern::ci(
                "venue_type",
                &format!(
                    r"\b(?:{}){HSPACE}+[A-Za-z0-9](?:[A-Za-z0-9 \t]*[A-Za-z0-9])?\b",
                    alternation(VENUE_TYPES)
                ),
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "remote_keyword",
                &format!(r"\b({})\b", alternation(REMOTE_KEYWORDS)),
                Assembly::Group(1),
            ),
            Pattern::ci(
                "gazetteer",
                &format!(r"\b({})\b", alternation(GAZETTEER)),
                Assembly::Group(1),
            ),
        ],
    )
    .longer_than(2)
    .shorter_than(100)
});

pub static ORGANIZER_LABEL_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    let name = r"([^,\n\r]{2,50})";
    PatternSet::new(
        PatternField::Organizer,
        vec![
            Pattern::ci("hosted_by", &format!(r"hosted\s+by\s*:?\s*{name}"), Assembly::Group(1)),
            Pattern::ci("organizer", &format!(r"organizer\s*:?\s*{name}"), Assembly::Group(1)),
            Pattern::ci("creator", &format!(r"creator\s*:?\s*{name}"), Assembly::Group(1)),
            Pattern::ci("by", &format!(r"by\s+{name}"), Assembly::Group(1)),
            Pattern::ci(
                "presented_by",
                &format!(r"presented\s+by\s*:?\s*{name}"),
                Assembly::Group(1),
            ),
            Pattern::ci(
                "sponsored_by",
                &format!(r"sponsored\s+by\s*:?\s*{name}"),
                Assembly::Group(1),
            ),
        ],
    )
});

pub static EMAIL_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        PatternField::Email,
        vec![Pattern::new(
            "email",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            Assembly::WholeMatch,
            false,
        )],
    )
});

/// Platform URL shapes found in raw page text
pub static SOCIAL_URL_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    let tail = r#"[^\s"'<>]+"#;
    PatternSet::new(
        PatternField::SocialUrl,
        vec![
            Pattern::ci(
                "platform_profile",
                &format!(
                    r"https?://(?:www\.)?(?:x|twitter|instagram|facebook|linkedin|youtube|tiktok|github)\.com/{tail}"
                ),
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "discord_invite",
                &format!(r"https?://discord\.gg/{tail}"),
                Assembly::WholeMatch,
            ),
            Pattern::ci(
                "telegram",
                &format!(r"https?://(?:t\.me|telegram\.me)/{tail}"),
                Assembly::WholeMatch,
            ),
        ],
    )
});

/// Labelled event names such as `Event name: Rust Meetup`
pub static NAME_LABEL_PATTERNS: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        PatternField::EventName,
        vec![Pattern::ci(
            "name_label",
            r"\bevent\s*(?:name|title)\s*:\s*([^\n]{3,150})",
            Assembly::Group(1),
        )],
    )
});

/// Headings that introduce a description section
pub static DETAILS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(about( the)? event|about|event details|agenda|what to expect)")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Text that marks a host block
pub static HOST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"hosted by|organizer|creator")
        .case_insensitive(true)
        .build()
        .unwrap()
});
