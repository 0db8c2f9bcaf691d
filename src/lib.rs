//! eventharvest - Luma event page harvester
//!
//! Extracts structured event records (name, schedule, location, description,
//! organizer identity and contact channels) from event pages whose markup
//! varies across templates.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Page loading, listing discovery and crawl orchestration
//! - [`parser`] - Field extraction engine (cascades, patterns, normalization)
//! - [`models`] - Core data structures and types
//! - [`storage`] - JSON and CSV export
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use eventharvest::config::Config;
//! use eventharvest::crawler::{CrawlController, ListingSource, PageFetcher};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = PageFetcher::new(&config.crawler)?;
//!     let controller = CrawlController::new(Arc::new(fetcher), &config)?;
//!     let outcome = controller
//!         .crawl_listing(&ListingSource::City("Bengaluru".into()), &["rust"], None)
//!         .await?;
//!     println!("{} events", outcome.records.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CrawlController, DocumentLoader, ListingSource, PageFetcher};
    pub use crate::error::{ErrorCategory, HarvestErrorTrait};
    pub use crate::models::{CrawlState, CrawlStats, EventField, EventRecord, SENTINEL};
    pub use crate::parser::RecordAssembler;
    pub use crate::storage::{EventExporter, OutputFormat};
}

// Direct re-exports for convenience
pub use models::{EventRecord, SENTINEL};
