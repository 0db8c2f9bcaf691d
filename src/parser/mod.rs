//! Event page parsing and field extraction
//!
//! This module turns the markup of one event page into an
//! [`EventRecord`](crate::models::EventRecord). Extraction is synchronous and
//! never performs I/O; fetching is the crawler's job.
//!
//! Layers, bottom-up:
//!
//! - [`normalize`]: text cleaning and length bounds per field
//! - [`patterns`]: ordered recognition patterns and static word lists
//! - [`selectors`]: ordered structural selectors
//! - [`document`]: parsed page with a plain-text projection
//! - [`strategy`]: per-field cascades of extraction strategies
//! - [`social`]: multi-source social link collection
//! - [`assembler`]: the record state machine tying it together

pub mod assembler;
pub mod document;
pub mod normalize;
pub mod patterns;
pub mod selectors;
pub mod social;
pub mod strategy;

// Re-export main parser and public types
pub use assembler::{AssemblyState, PendingRecord, RecordAssembler};
pub use document::DocumentView;
pub use normalize::{clean, FieldKind};
pub use patterns::{Platform, PATTERN_LIBRARY_VERSION};
pub use social::{SocialAggregator, SocialLinkSet};
pub use strategy::{Cascade, Committed, OrganizerCascade, OrganizerMatch, Strategy};
