//! Indexing filters for a crawl pipeline.
//!
//! Three filters enrich a parsed page before it is indexed:
//!
//! - `contentlength` records the length of the parsed text.
//! - `contentner` adds one field per named-entity category.
//! - `youtubeccreader` does the same, and for YouTube watch pages also adds
//!   the video's closed captions plus the entities found in them.

pub mod config;
pub mod indexer;
pub mod models;
pub mod services;
