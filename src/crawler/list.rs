//! Listing page crawler
//!
//! Finds event page links on an explore, calendar or city page. The ordered
//! link selectors are tried until one matches anything; a plain scan of every
//! anchor for event-looking paths is the fallback.

use scraper::Html;
use std::collections::HashSet;
use std::fmt;

use crate::config::CrawlerConfig;
use crate::crawler::url::UrlResolver;
use crate::crawler::DocumentLoader;
use crate::parser::document::element_text;
use crate::parser::selectors::{listing_links, ANCHORS};
use crate::utils::error::{CrawlerError, ParseError};

/// Where event links are discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// Site-wide explore page
    Explore,
    /// Calendar or community page, `{base}/{slug}`
    Slug(String),
    /// City page, `{base}/{city-slug}`
    City(String),
}

impl ListingSource {
    /// Build a source from CLI-style arguments
    ///
    /// `slug` or `city` upgrade the default `explore` source; asking for
    /// `custom` or `city` without its argument is an error.
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::InvalidSource` for unknown source names and
    /// for missing slug or city arguments
    pub fn from_args(
        source: &str,
        slug: Option<&str>,
        city: Option<&str>,
    ) -> Result<Self, CrawlerError> {
        let slug = slug.map(str::trim).filter(|s| !s.is_empty());
        let city = city.map(str::trim).filter(|s| !s.is_empty());

        match source.to_lowercase().as_str() {
            "explore" => match (city, slug) {
                (Some(city), _) => {
                    tracing::info!(city, "Auto-detected city source");
                    Ok(Self::City(city.to_string()))
                }
                (None, Some(slug)) => {
                    tracing::info!(slug, "Auto-detected custom source");
                    Ok(Self::Slug(slug.to_string()))
                }
                (None, None) => Ok(Self::Explore),
            },
            "custom" | "slug" => slug.map(|s| Self::Slug(s.to_string())).ok_or_else(|| {
                CrawlerError::InvalidSource("--slug is required when using --source custom".into())
            }),
            "city" => city.map(|c| Self::City(c.to_string())).ok_or_else(|| {
                CrawlerError::InvalidSource("--city is required when using --source city".into())
            }),
            other => Err(CrawlerError::InvalidSource(format!(
                "unknown source '{other}' (expected explore, custom or city)"
            ))),
        }
    }

    /// Path of the listing page under the site root
    pub fn path(&self) -> String {
        match self {
            Self::Explore => "explore".to_string(),
            Self::Slug(slug) => slug.trim_matches('/').to_string(),
            Self::City(city) => UrlResolver::city_slug(city),
        }
    }

    pub fn is_city(&self) -> bool {
        matches!(self, Self::City(_))
    }

    /// Explore pages are pre-filtered by anchor text before fetching
    pub fn prefilters_links(&self) -> bool {
        matches!(self, Self::Explore)
    }
}

impl fmt::Display for ListingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explore => write!(f, "explore"),
            Self::Slug(slug) => write!(f, "custom:{slug}"),
            Self::City(city) => write!(f, "city:{city}"),
        }
    }
}

/// One event link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: String,
    pub anchor_text: String,
}

impl DiscoveredLink {
    fn matches_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        let text = self.anchor_text.to_lowercase();
        keywords
            .iter()
            .any(|k| text.contains(&k.as_ref().to_lowercase()))
    }
}

/// Event link discovery from listing pages
#[derive(Debug, Clone)]
pub struct ListingCrawler {
    resolver: UrlResolver,
    max_per_listing: usize,
    max_per_city: usize,
}

impl ListingCrawler {
    /// Create a listing crawler rooted at the configured base URL
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidUrl` for an invalid base URL
    pub fn new(config: &CrawlerConfig) -> Result<Self, ParseError> {
        Ok(Self {
            resolver: UrlResolver::new(&config.base_url)?,
            max_per_listing: config.max_events_per_listing,
            max_per_city: config.max_events_per_city,
        })
    }

    /// Absolute URL of the listing page for `source`
    pub fn listing_url(&self, source: &ListingSource) -> String {
        self.resolver.page(&source.path())
    }

    /// Maximum event links taken from one listing page
    pub fn cap(&self, source: &ListingSource) -> usize {
        if source.is_city() {
            self.max_per_city
        } else {
            self.max_per_listing
        }
    }

    /// Fetch the listing page and return its event links
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Fetch` if the listing page cannot be loaded
    /// and `CrawlerError::NoEventsFound` if it links to no events
    pub async fn collect<L, S>(
        &self,
        loader: &L,
        source: &ListingSource,
        keywords: &[S],
    ) -> Result<Vec<DiscoveredLink>, CrawlerError>
    where
        L: DocumentLoader + ?Sized,
        S: AsRef<str>,
    {
        let url = self.listing_url(source);
        tracing::info!(source = %source, url = %url, "Fetching listing page");

        let markup = loader.fetch(&url).await?;
        let links = self.discover(source, &markup, keywords);

        if links.is_empty() {
            return Err(CrawlerError::NoEventsFound);
        }

        tracing::info!(source = %source, links = links.len(), "Collected event links");
        Ok(links)
    }

    /// Event links on an already fetched listing page
    ///
    /// Links are resolved, deduplicated in first-seen order and capped. On
    /// explore pages with keywords, links whose anchor text mentions none of
    /// them are dropped.
    pub fn discover<S: AsRef<str>>(
        &self,
        source: &ListingSource,
        markup: &str,
        keywords: &[S],
    ) -> Vec<DiscoveredLink> {
        let document = Html::parse_document(markup);

        let mut candidates = Vec::new();
        for named in listing_links(source.is_city()) {
            candidates.extend(
                document
                    .select(&named.selector)
                    .filter_map(|el| el.value().attr("href").map(|href| (href, element_text(el)))),
            );
            if !candidates.is_empty() {
                tracing::debug!(selector = named.css, found = candidates.len(), "Link selector matched");
                break;
            }
        }

        if candidates.is_empty() {
            candidates.extend(
                document
                    .select(&ANCHORS)
                    .filter_map(|el| el.value().attr("href").map(|href| (href, el)))
                    .filter(|(href, _)| UrlResolver::is_event_link(href))
                    .map(|(href, el)| (href, element_text(el))),
            );
            tracing::debug!(found = candidates.len(), "Fell back to anchor scan");
        }

        let mut seen = HashSet::new();
        let links: Vec<DiscoveredLink> = candidates
            .into_iter()
            .filter_map(|(href, anchor_text)| {
                let url = self.resolver.resolve(href)?;
                seen.insert(url.clone())
                    .then_some(DiscoveredLink { url, anchor_text })
            })
            .take(self.cap(source))
            .collect();

        if !source.prefilters_links() || keywords.is_empty() {
            return links;
        }

        let before = links.len();
        let kept: Vec<DiscoveredLink> = links
            .into_iter()
            .filter(|link| link.matches_keywords(keywords))
            .collect();
        tracing::debug!(before, after = kept.len(), "Pre-filtered links by anchor text");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_KEYWORDS: &[&str] = &[];

    fn crawler() -> ListingCrawler {
        ListingCrawler::new(&CrawlerConfig::default()).unwrap()
    }

    #[test]
    fn test_source_from_args() {
        assert_eq!(
            ListingSource::from_args("explore", None, None).unwrap(),
            ListingSource::Explore
        );
        assert_eq!(
            ListingSource::from_args("explore", None, Some("Mumbai")).unwrap(),
            ListingSource::City("Mumbai".into())
        );
        assert_eq!(
            ListingSource::from_args("explore", Some("ethindia"), None).unwrap(),
            ListingSource::Slug("ethindia".into())
        );
        assert!(matches!(
            ListingSource::from_args("city", None, None),
            Err(CrawlerError::InvalidSource(_))
        ));
        assert!(ListingSource::from_args("custom", None, None).is_err());
        assert!(ListingSource::from_args("archive", None, None).is_err());
    }

    #[test]
    fn test_listing_urls() {
        let crawler = crawler();
        assert_eq!(
            crawler.listing_url(&ListingSource::Explore),
            "https://lu.ma/explore"
        );
        assert_eq!(
            crawler.listing_url(&ListingSource::City("New Delhi".into())),
            "https://lu.ma/new-delhi"
        );
        assert_eq!(
            crawler.listing_url(&ListingSource::Slug("ethindia".into())),
            "https://lu.ma/ethindia"
        );
    }

    #[test]
    fn test_first_matching_selector_wins() {
        let html = r#"
            <a href="/event/one">One</a>
            <a href="/e/two">Two</a>
            <div class="event-card"><a href="/three">Three</a></div>
        "#;
        let links = crawler().discover(&ListingSource::Explore, html, NO_KEYWORDS);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, ["https://lu.ma/event/one"]);
    }

    #[test]
    fn test_card_selector_used_when_no_event_paths() {
        let html = r#"<div data-testid="event-card"><a href="/abc123">Card</a></div>"#;
        let links = crawler().discover(&ListingSource::Explore, html, NO_KEYWORDS);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://lu.ma/abc123");
        assert_eq!(links[0].anchor_text, "Card");
    }

    #[test]
    fn test_dedup_and_cap() {
        let mut html = String::from(r#"<a href="/event/dup">A</a><a href="/event/dup#x">B</a>"#);
        for i in 0..40 {
            html.push_str(&format!(r#"<a href="/event/e{i}">E{i}</a>"#));
        }

        let crawler = crawler();
        let explore = crawler.discover(&ListingSource::Explore, &html, NO_KEYWORDS);
        assert_eq!(explore.len(), 20);
        assert_eq!(explore[0].url, "https://lu.ma/event/dup");
        assert_eq!(explore[1].url, "https://lu.ma/event/e0");

        let city = crawler.discover(&ListingSource::City("pune".into()), &html, NO_KEYWORDS);
        assert_eq!(city.len(), 30);
    }

    #[test]
    fn test_explore_prefilter_by_anchor_text() {
        let html = r#"
            <a href="/event/a">Rust Meetup Bengaluru</a>
            <a href="/event/b">Yoga in the park</a>
        "#;
        let crawler = crawler();

        let explore = crawler.discover(&ListingSource::Explore, html, &["rust"]);
        assert_eq!(explore.len(), 1);
        assert_eq!(explore[0].url, "https://lu.ma/event/a");

        // Calendar pages defer filtering to the extracted record
        let slug = crawler.discover(&ListingSource::Slug("cal".into()), html, &["rust"]);
        assert_eq!(slug.len(), 2);
    }

    #[test]
    fn test_no_links() {
        let links = crawler().discover(
            &ListingSource::Explore,
            r#"<a href="/about">About</a>"#,
            NO_KEYWORDS,
        );
        assert!(links.is_empty());
    }
}
