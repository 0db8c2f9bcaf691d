//! Error classification for the eventharvest crate
//!
//! Domain errors live in [`crate::utils::error`]. This module gives them a
//! shared [`HarvestErrorTrait`] so the crawl loop can tag every skipped page
//! with an [`ErrorCategory`] in its log line.
//!
//! # Usage
//!
//! ```
//! use eventharvest::error::{ErrorCategory, HarvestErrorTrait};
//! use eventharvest::utils::error::FetchError;
//!
//! let err = FetchError::Timeout;
//! assert_eq!(err.category(), ErrorCategory::Network);
//! ```

pub use crate::utils::error::{CrawlerError, FetchError, ParseError};

/// Common trait for all eventharvest error types
pub trait HarvestErrorTrait: std::error::Error {
    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// Parsing and extraction errors
    Parsing,
    /// Configuration and validation errors
    Config,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

impl HarvestErrorTrait for FetchError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl HarvestErrorTrait for ParseError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl HarvestErrorTrait for CrawlerError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Parse(e) => e.category(),
            Self::NoEventsFound => ErrorCategory::Parsing,
            Self::InvalidSource(_) => ErrorCategory::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_categories() {
        assert_eq!(FetchError::Timeout.category(), ErrorCategory::Network);
        assert_eq!(FetchError::HttpStatus(404).category(), ErrorCategory::Network);
        assert_eq!(ParseError::EmptyDocument.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_crawler_error_delegates_to_source() {
        let fetch = CrawlerError::Fetch(FetchError::MaxRetriesExceeded);
        assert_eq!(fetch.category(), ErrorCategory::Network);

        let parse = CrawlerError::Parse(ParseError::EmptyDocument);
        assert_eq!(parse.category(), ErrorCategory::Parsing);

        assert_eq!(CrawlerError::NoEventsFound.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_invalid_source_is_config() {
        let err = CrawlerError::InvalidSource("city".into());
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(ErrorCategory::Config.to_string(), "config");
    }
}
