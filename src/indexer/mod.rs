//! Indexing filters.
//!
//! Each filter receives a document with its parsed content and crawl record
//! and appends fields before the document goes to the search backend.

mod chain;
mod contentlength;
mod contentner;
mod filter;
mod youtubeccreader;

pub use chain::{create_filter, IndexingFilters, DEFAULT_FILTER_ORDER};
pub use contentlength::{ContentLengthFilter, CONTENT_LENGTH_FIELD};
pub use contentner::ContentNerFilter;
pub use filter::{IndexingError, IndexingFilter};
pub use youtubeccreader::{
    resolve_output_dir, YoutubeCcReaderFilter, CC_PREFIX, CLOSED_CAPTION_FIELD,
    DEFAULT_URL_REGEX, OUTPUT_DIR_REGEX,
};
