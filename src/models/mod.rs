//! Data models passed through the indexing filter chain.

mod crawl;
mod document;
mod parse;

pub use crawl::{CrawlDatum, CrawlStatus, Inlink, Inlinks};
pub use document::{FieldValue, IndexDocument};
pub use parse::Parse;
