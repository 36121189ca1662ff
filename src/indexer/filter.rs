//! IndexingFilter trait, the contract every plugin in the chain implements.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Configuration;
use crate::models::{CrawlDatum, IndexDocument, Inlinks, Parse};

/// Host-level failures. Recoverable problems inside a filter (NER, captions,
/// output directories) are logged and never surface here.
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("Unknown indexing filter: {0}")]
    UnknownFilter(String),
}

/// A plugin that enriches a document before it is sent to the index.
///
/// Filters are configured once and then called concurrently from many
/// tasks, so `filter` takes `&self`.
#[async_trait]
pub trait IndexingFilter: Send + Sync {
    /// Plugin name used in `indexingfilter.order`.
    fn name(&self) -> &str;

    /// Read options. Called once, before any `filter` call; performs no I/O.
    fn configure(&mut self, conf: &Configuration);

    /// The configuration passed to `configure`.
    fn conf(&self) -> &Configuration;

    /// Append fields to `doc` and return it.
    async fn filter(
        &self,
        doc: IndexDocument,
        parse: &Parse,
        url: &str,
        datum: &CrawlDatum,
        inlinks: &Inlinks,
    ) -> Result<IndexDocument, IndexingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_filter_is_the_only_host_error() {
        let err = IndexingError::UnknownFilter("geoip".to_string());
        assert_eq!(err.to_string(), "Unknown indexing filter: geoip");
        match err {
            IndexingError::UnknownFilter(name) => assert_eq!(name, "geoip"),
        }
    }
}
