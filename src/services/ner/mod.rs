//! Named Entity Recognition.
//!
//! Provides a `NerBackend` trait for pluggable recognisers, a lazily
//! constructed `NerAdapter` shared by the filters, and the flattening rule
//! that turns a recognition result into document fields.

mod adapter;
mod corenlp;
mod regex_backend;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::IndexDocument;

pub use adapter::NerAdapter;
pub use corenlp::CoreNlpBackend;
pub use regex_backend::RegexNerBackend;

/// Entity category to the distinct surface strings recognised for it.
pub type NerResult = BTreeMap<String, BTreeSet<String>>;

/// Separator placed between the members of one category when flattened.
pub const VALUE_SEPARATOR: &str = " : ";

/// The seven entity classes emitted by the built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityCategory {
    Person,
    Organization,
    Location,
    Date,
    Time,
    Money,
    Percent,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 7] = [
        EntityCategory::Person,
        EntityCategory::Organization,
        EntityCategory::Location,
        EntityCategory::Date,
        EntityCategory::Time,
        EntityCategory::Money,
        EntityCategory::Percent,
    ];

    /// Field name used for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Person => "PERSON",
            EntityCategory::Organization => "ORGANIZATION",
            EntityCategory::Location => "LOCATION",
            EntityCategory::Date => "DATE",
            EntityCategory::Time => "TIME",
            EntityCategory::Money => "MONEY",
            EntityCategory::Percent => "PERCENT",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

/// Errors from NER backends.
#[derive(Debug, Error)]
pub enum NerError {
    #[error("NER backend initialization failed: {0}")]
    Init(String),

    #[error("NER recognition failed: {0}")]
    Recognition(String),

    #[error("NER request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Trait for pluggable NER backends.
///
/// Implementations must tolerate concurrent calls; filters share one backend
/// across all worker tasks.
#[async_trait]
pub trait NerBackend: Send + Sync {
    /// Human-readable backend identifier (e.g. "regex", "corenlp").
    fn backend_id(&self) -> &str;

    /// Recognise entities in `text`.
    async fn recognise(&self, text: &str) -> Result<NerResult, NerError>;
}

/// Flatten each category's set into one string joined by `VALUE_SEPARATOR`.
/// Empty sets flatten to the empty string.
pub fn flatten_entities(names: &NerResult) -> Vec<(&str, String)> {
    names
        .iter()
        .map(|(category, values)| {
            let mut joined = String::new();
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    joined.push_str(VALUE_SEPARATOR);
                }
                joined.push_str(value);
            }
            (category.as_str(), joined)
        })
        .collect()
}

/// Add one field per category to `doc`, named `{prefix}{CATEGORY}`.
pub fn add_entity_fields(doc: &mut IndexDocument, names: &NerResult, prefix: &str) {
    for (category, joined) in flatten_entities(names) {
        tracing::debug!("{}{}: {}", prefix, category, joined);
        doc.add(format!("{}{}", prefix, category), joined);
    }
}
