//! URL resolution for listing, event and profile pages
//!
//! Every link found on a page is resolved against the site root, stripped of
//! its fragment and restricted to http(s) before it is scheduled.

use url::Url;

use crate::utils::error::ParseError;

/// Path fragments that mark an event page link
const EVENT_PATH_MARKERS: &[&str] = &["/event/", "/e/"];

/// Site-aware URL resolver
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base: Url,
}

impl UrlResolver {
    /// Create a resolver rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL
    pub fn new(base_url: &str) -> Result<Self, ParseError> {
        let base = Url::parse(base_url).map_err(|_| ParseError::InvalidUrl(base_url.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ParseError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base })
    }

    /// Resolve `href` to an absolute http(s) URL without fragment
    ///
    /// # Examples
    ///
    /// ```
    /// use eventharvest::crawler::url::UrlResolver;
    ///
    /// let resolver = UrlResolver::new("https://lu.ma").unwrap();
    /// assert_eq!(
    ///     resolver.resolve("/e/abc#tickets").as_deref(),
    ///     Some("https://lu.ma/e/abc")
    /// );
    /// assert_eq!(resolver.resolve("mailto:a@b.io"), None);
    /// ```
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut url = self.base.join(href).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        url.set_fragment(None);
        Some(url.to_string())
    }

    /// Whether an href looks like an event page
    pub fn is_event_link(href: &str) -> bool {
        EVENT_PATH_MARKERS.iter().any(|marker| href.contains(marker))
    }

    /// Absolute URL of a page directly under the site root
    pub fn page(&self, path: &str) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!("/{}", path.trim_start_matches('/')));
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }

    /// URL slug for a city name: lower-cased, spaces and underscores as `-`
    ///
    /// ```
    /// use eventharvest::crawler::url::UrlResolver;
    ///
    /// assert_eq!(UrlResolver::city_slug("New Delhi"), "new-delhi");
    /// assert_eq!(UrlResolver::city_slug("san_francisco"), "san-francisco");
    /// ```
    pub fn city_slug(city: &str) -> String {
        city.trim().to_lowercase().replace([' ', '_'], "-")
    }
}
