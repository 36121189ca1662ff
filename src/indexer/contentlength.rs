use async_trait::async_trait;

use super::{IndexingError, IndexingFilter};
use crate::config::Configuration;
use crate::models::{CrawlDatum, IndexDocument, Inlinks, Parse};

pub const CONTENT_LENGTH_FIELD: &str = "contentlength";

/// Records the character count of the parsed text.
#[derive(Debug, Default)]
pub struct ContentLengthFilter {
    conf: Configuration,
}

impl ContentLengthFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexingFilter for ContentLengthFilter {
    fn name(&self) -> &str {
        "contentlength"
    }

    fn configure(&mut self, conf: &Configuration) {
        self.conf = conf.clone();
    }

    fn conf(&self) -> &Configuration {
        &self.conf
    }

    async fn filter(
        &self,
        mut doc: IndexDocument,
        parse: &Parse,
        _url: &str,
        _datum: &CrawlDatum,
        _inlinks: &Inlinks,
    ) -> Result<IndexDocument, IndexingError> {
        doc.add(CONTENT_LENGTH_FIELD, parse.text().chars().count());
        Ok(doc)
    }
}
