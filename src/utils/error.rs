//! Error types for the event harvester
//!
//! This module defines the domain error enums used by the loader, the
//! extraction engine and the crawl controller.

use thiserror::Error;

/// Errors that can occur while acquiring a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response status
    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether the loader may retry after this failure
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::HttpStatus(status) => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::MaxRetriesExceeded | Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Errors raised inside the extraction engine
///
/// None of these abort a record: a strategy that fails is logged and the
/// cascade moves on as if it had produced no candidate.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Markup contained nothing to parse
    #[error("Document is empty")]
    EmptyDocument,

    /// A runtime-supplied selector failed to parse
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by the crawl controller
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Listing page yielded no event links
    #[error("No events found")]
    NoEventsFound,

    /// Listing source arguments are inconsistent
    #[error("Invalid listing source: {0}")]
    InvalidSource(String),
}
