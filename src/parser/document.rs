//! Document view over a parsed event page
//!
//! A [`DocumentView`] is built once per page and is read-only afterwards. It
//! offers the structural queries the field strategies need plus a flattened
//! plain-text projection of the page body.
//!
//! The projection keeps block structure as line breaks: every block-level
//! element starts and ends a line, runs of spaces inside a line collapse to
//! one, and empty lines are dropped. Script, style and head content never
//! reaches it.
//!
//! `scraper::Html` is not `Send`, so a view must be dropped before the
//! owning task awaits anything.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::selectors::{ANCHORS, BLOCK_TAGS, NON_CONTENT_TAGS};
use crate::utils::error::ParseError;

/// One node following an element among its siblings
#[derive(Debug, Clone, Copy)]
pub enum Sibling<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
}

impl<'a> Sibling<'a> {
    /// Trimmed text with inner text nodes joined by a space
    pub fn text(&self) -> String {
        match self {
            Self::Element(el) => element_text(*el),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// Parsed page plus its text projection
pub struct DocumentView {
    url: String,
    base: Option<Url>,
    html: Html,
    text: String,
}

impl std::fmt::Debug for DocumentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentView")
            .field("url", &self.url)
            .field("text_len", &self.text.len())
            .finish()
    }
}

impl DocumentView {
    /// Parse raw markup fetched from `url`
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyDocument`] when the markup is blank.
    pub fn parse(url: &str, markup: &str) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let html = Html::parse_document(markup);
        let text = project_text(&html);

        Ok(Self {
            url: url.to_string(),
            base: Url::parse(url).ok(),
            html,
            text,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Flattened plain text of the page body
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First element matching the selector in document order
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All elements matching the selector in document order
    pub fn select_all<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// Text of the first matching element
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.select_first(selector).map(element_text)
    }

    /// Attribute of the first matching element that carries it
    pub fn attr<'a>(&'a self, selector: &'a Selector, name: &str) -> Option<&'a str> {
        self.select_all(selector).find_map(|el| el.value().attr(name))
    }

    /// Every anchor with an `href`, paired with that `href`
    pub fn anchors(&self) -> impl Iterator<Item = (ElementRef<'_>, &str)> + '_ {
        self.html
            .select(&ANCHORS)
            .filter_map(|el| el.value().attr("href").map(|href| (el, href)))
    }

    /// Resolve a link target against the page URL
    pub fn resolve(&self, href: &str) -> Option<String> {
        resolve_against(self.base.as_ref(), href)
    }
}

/// Resolve `href` against `base`, accepting already absolute targets as-is
pub fn resolve_against(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
    }
}

/// Trimmed text nodes of an element joined with single spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of an element whose only descendant chain ends in one text node
pub fn own_string(element: ElementRef<'_>) -> Option<&str> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }

    if let Some(text) = only.value().as_text() {
        return Some(&**text);
    }
    ElementRef::wrap(only).and_then(own_string)
}

/// Element and non-blank text siblings after `element`
pub fn next_siblings(element: ElementRef<'_>) -> impl Iterator<Item = Sibling<'_>> {
    element.next_siblings().filter_map(|node| {
        if let Some(text) = node.value().as_text() {
            let text: &str = text;
            return (!text.trim().is_empty()).then_some(Sibling::Text(text));
        }
        ElementRef::wrap(node).map(Sibling::Element)
    })
}

/// Parent element, if any
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

fn project_text(html: &Html) -> String {
    let mut raw = String::new();
    push_text(html.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = child.value().name();
        if NON_CONTENT_TAGS.contains(&tag) {
            continue;
        }

        let block = BLOCK_TAGS.contains(&tag);
        if block {
            out.push('\n');
        }
        push_text(child, out);
        if block {
            out.push('\n');
        }
    }
}
