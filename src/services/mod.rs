//! Services backing the indexing filters.
//!
//! Filters stay thin: entity recognition and caption retrieval live here and
//! can be driven from the CLI or other hosts as well.

pub mod captions;
pub mod ner;

pub use captions::{
    CaptionDocument, CaptionError, CaptionOptions, CaptionRetriever, CaptionSource, Cue,
    YtDlpCaptionSource,
};
pub use ner::{
    add_entity_fields, flatten_entities, CoreNlpBackend, EntityCategory, NerAdapter, NerBackend,
    NerError, NerResult, RegexNerBackend,
};
