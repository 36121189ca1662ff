use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{CaptionDocument, CaptionError, CaptionOptions};

/// Something that can fetch the default caption track of a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Identifier used in log messages.
    fn source_id(&self) -> &str;

    /// Fetch the default track for `url`, writing any intermediate files
    /// under `output_dir`. `Ok(None)` means the video has no usable track.
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        options: &CaptionOptions,
    ) -> Result<Option<CaptionDocument>, CaptionError>;
}

/// Caption retrieval bound to a single video URL.
pub struct CaptionRetriever {
    url: String,
    output_dir: PathBuf,
    options: CaptionOptions,
    source: Arc<dyn CaptionSource>,
}

impl CaptionRetriever {
    pub fn new(
        url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        options: CaptionOptions,
        source: Arc<dyn CaptionSource>,
    ) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            options,
            source,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download the default caption track.
    ///
    /// Returns `None` when the video has no track, the track is empty, or
    /// anything along the way fails. Failures are logged, never returned.
    pub async fn retrieve(&self) -> Option<CaptionDocument> {
        match self
            .source
            .fetch(&self.url, &self.output_dir, &self.options)
            .await
        {
            Ok(Some(doc)) if doc.is_empty() => {
                debug!("Caption track for {} has no cues", self.url);
                None
            }
            Ok(Some(doc)) => Some(doc),
            Ok(None) => {
                debug!("No default caption track for {}", self.url);
                None
            }
            Err(e) => {
                warn!(
                    "Caption retrieval via {} failed for {}: {}",
                    self.source.source_id(),
                    self.url,
                    e
                );
                None
            }
        }
    }

    /// Render a retrieved document with this retriever's options.
    pub fn process(&self, doc: &CaptionDocument) -> String {
        doc.render(&self.options)
    }
}
