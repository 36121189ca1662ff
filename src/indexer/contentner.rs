use async_trait::async_trait;
use tracing::error;

use super::{IndexingError, IndexingFilter};
use crate::config::Configuration;
use crate::models::{CrawlDatum, IndexDocument, Inlinks, Parse};
use crate::services::ner::{add_entity_fields, NerAdapter};

/// Adds one field per entity category found in the parsed text.
pub struct ContentNerFilter {
    conf: Configuration,
    ner: NerAdapter,
    custom_ner: bool,
}

impl ContentNerFilter {
    pub fn new() -> Self {
        Self {
            conf: Configuration::default(),
            ner: NerAdapter::default(),
            custom_ner: false,
        }
    }

    /// Use a specific adapter instead of the one built from configuration.
    /// `configure` keeps it.
    pub fn with_ner(mut self, ner: NerAdapter) -> Self {
        self.ner = ner;
        self.custom_ner = true;
        self
    }
}

impl Default for ContentNerFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexingFilter for ContentNerFilter {
    fn name(&self) -> &str {
        "contentner"
    }

    fn configure(&mut self, conf: &Configuration) {
        self.conf = conf.clone();
        if !self.custom_ner {
            self.ner = NerAdapter::from_conf(conf);
        }
    }

    fn conf(&self) -> &Configuration {
        &self.conf
    }

    async fn filter(
        &self,
        mut doc: IndexDocument,
        parse: &Parse,
        url: &str,
        _datum: &CrawlDatum,
        _inlinks: &Inlinks,
    ) -> Result<IndexDocument, IndexingError> {
        match self.ner.recognise(parse.text()).await {
            Ok(names) => add_entity_fields(&mut doc, &names, ""),
            Err(e) => error!("NER failed for {}: {}", url, e),
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::keys;
    use crate::models::FieldValue;
    use crate::services::ner::{NerBackend, RegexNerBackend};

    async fn run(filter: &ContentNerFilter, text: &str) -> IndexDocument {
        let mut doc = IndexDocument::new();
        doc.add("id", "page-1");
        filter
            .filter(
                doc,
                &Parse::new(text),
                "https://example.org/",
                &CrawlDatum::default(),
                &Inlinks::default(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_emits_category_fields() {
        let filter = ContentNerFilter::new()
            .with_ner(NerAdapter::with_backend(Arc::new(RegexNerBackend::new())));
        let doc = run(&filter, "Senator Alice Walker met with the FBI in Washington.").await;

        assert_eq!(doc.first_value("ORGANIZATION"), Some(&FieldValue::from("FBI")));
        assert_eq!(doc.first_value("LOCATION"), Some(&FieldValue::from("Washington")));
        assert!(doc.contains("PERSON"));
        assert!(doc.contains("id"));
    }

    #[tokio::test]
    async fn test_init_failure_passes_document_through() {
        let mut filter = ContentNerFilter::new();
        filter.configure(&Configuration::new().with(keys::NER_BACKEND, "missing"));

        let doc = run(&filter, "Senator Alice Walker met with the FBI.").await;
        assert_eq!(doc.field_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[tokio::test]
    async fn test_empty_text_adds_nothing() {
        let filter = ContentNerFilter::new().with_ner(NerAdapter::new(|| {
            Ok(Arc::new(RegexNerBackend::new()) as Arc<dyn NerBackend>)
        }));
        let doc = run(&filter, "").await;
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_configure_keeps_conf() {
        let mut filter = ContentNerFilter::new();
        let conf = Configuration::new().with(keys::CONTENT_NER_TAGS, "a,b");
        filter.configure(&conf);
        assert_eq!(filter.conf(), &conf);
        assert_eq!(filter.name(), "contentner");
    }
}
