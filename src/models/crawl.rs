//! Crawl-side inputs carried alongside each parsed page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fetch state of a URL at indexing time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Unfetched,
    #[default]
    Fetched,
    NotModified,
    Redirected,
    Gone,
}

/// Crawl record for the page being indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlDatum {
    pub status: CrawlStatus,
    pub score: f32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// A link pointing at the page being indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inlink {
    pub from_url: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inlinks {
    pub inlinks: Vec<Inlink>,
}

impl Inlinks {
    pub fn is_empty(&self) -> bool {
        self.inlinks.is_empty()
    }
}
