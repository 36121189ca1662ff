//! Ordered chain of indexing filters.

use tracing::debug;

use super::{
    ContentLengthFilter, ContentNerFilter, IndexingError, IndexingFilter, YoutubeCcReaderFilter,
};
use crate::config::{keys, Configuration};
use crate::models::{CrawlDatum, IndexDocument, Inlinks, Parse};

/// Chain order used when `indexingfilter.order` is not set.
pub const DEFAULT_FILTER_ORDER: &[&str] = &["contentlength", "contentner", "youtubeccreader"];

/// Build and configure a filter by plugin name.
pub fn create_filter(
    name: &str,
    conf: &Configuration,
) -> Result<Box<dyn IndexingFilter>, IndexingError> {
    let mut filter: Box<dyn IndexingFilter> = match name {
        "contentlength" => Box::new(ContentLengthFilter::new()),
        "contentner" => Box::new(ContentNerFilter::new()),
        "youtubeccreader" => Box::new(YoutubeCcReaderFilter::new()),
        other => return Err(IndexingError::UnknownFilter(other.to_string())),
    };
    filter.configure(conf);
    Ok(filter)
}

/// Runs each filter in order, threading the document through.
pub struct IndexingFilters {
    filters: Vec<Box<dyn IndexingFilter>>,
}

impl IndexingFilters {
    /// Use already configured filters.
    pub fn new(filters: Vec<Box<dyn IndexingFilter>>) -> Self {
        Self { filters }
    }

    /// Build the chain named by `indexingfilter.order`.
    pub fn from_conf(conf: &Configuration) -> Result<Self, IndexingError> {
        let mut names = conf.get_strings(keys::FILTER_ORDER);
        if names.is_empty() {
            names = DEFAULT_FILTER_ORDER.iter().map(|n| n.to_string()).collect();
        }

        let filters = names
            .iter()
            .map(|name| create_filter(name, conf))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Indexing filter chain: {}", names.join(" -> "));
        Ok(Self::new(filters))
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub async fn filter(
        &self,
        mut doc: IndexDocument,
        parse: &Parse,
        url: &str,
        datum: &CrawlDatum,
        inlinks: &Inlinks,
    ) -> Result<IndexDocument, IndexingError> {
        for filter in &self.filters {
            doc = filter.filter(doc, parse, url, datum, inlinks).await?;
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let chain = IndexingFilters::from_conf(&Configuration::new()).unwrap();
        assert_eq!(chain.names(), DEFAULT_FILTER_ORDER.to_vec());
    }

    #[test]
    fn test_configured_order() {
        let conf = Configuration::new().with(keys::FILTER_ORDER, "youtubeccreader, contentlength");
        let chain = IndexingFilters::from_conf(&conf).unwrap();
        assert_eq!(chain.names(), vec!["youtubeccreader", "contentlength"]);
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let conf = Configuration::new().with(keys::FILTER_ORDER, "contentlength,language");
        match IndexingFilters::from_conf(&conf) {
            Err(IndexingError::UnknownFilter(name)) => assert_eq!(name, "language"),
            other => panic!("expected UnknownFilter, got {:?}", other.map(|c| c.names().len())),
        }
    }

    #[test]
    fn test_created_filters_are_configured() {
        let conf = Configuration::new().with(keys::CONTENT_LENGTH_TAGS, "length");
        let filter = create_filter("contentlength", &conf).unwrap();
        assert_eq!(filter.conf(), &conf);
    }
}
