pub mod crawl;
pub mod extract;

// Re-export command functions for convenience
pub use crawl::{crawl, CrawlArgs};
pub use extract::extract;
