//! YouTube closed-caption reader.
//!
//! For every document the filter first runs NER over the parsed body, exactly
//! like `contentner`. If the URL is a YouTube watch page it then downloads the
//! default caption track, stores the rendered text in `closedcaption`, and
//! runs NER a second time over the captions, emitting those categories with a
//! `CC-` prefix so they never collide with the body fields.
//!
//! Every failure on the caption path degrades to "no caption fields"; the
//! document is always returned.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, error, warn};

use super::{IndexingError, IndexingFilter};
use crate::config::{keys, Configuration};
use crate::models::{CrawlDatum, IndexDocument, Inlinks, Parse};
use crate::services::captions::{
    CaptionOptions, CaptionRetriever, CaptionSource, YtDlpCaptionSource,
};
use crate::services::ner::{add_entity_fields, NerAdapter};

pub const CLOSED_CAPTION_FIELD: &str = "closedcaption";

/// Prefix for entity fields recognised in caption text.
pub const CC_PREFIX: &str = "CC-";

pub const DEFAULT_URL_REGEX: &str = r"^https?://(www.)?youtube.com/watch\?v=[\w\-=]{11}$";

/// Output directories starting with one of these characters are rejected.
pub const OUTPUT_DIR_REGEX: &str = r"^[^-+&@#%?=~|!:,;].+";

static DEFAULT_URL_GATE: LazyLock<Regex> =
    LazyLock::new(|| full_match(DEFAULT_URL_REGEX).expect("default URL regex should compile"));

static OUTPUT_DIR_GATE: LazyLock<Regex> =
    LazyLock::new(|| full_match(OUTPUT_DIR_REGEX).expect("output dir regex should compile"));

/// Anchor `pattern` at both ends so `is_match` means the whole input matched.
fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^(?:{})$", pattern))
}

/// Options read by `configure`.
#[derive(Debug, Clone)]
struct ReaderSettings {
    output_dir: Option<String>,
    url_gate: Regex,
    options: CaptionOptions,
}

impl ReaderSettings {
    fn from_conf(conf: &Configuration) -> Self {
        let url_gate = match conf.get(keys::URL_REGEX) {
            Some(pattern) => full_match(pattern).unwrap_or_else(|e| {
                warn!(
                    "Invalid {} '{}', using default: {}",
                    keys::URL_REGEX,
                    pattern,
                    e
                );
                DEFAULT_URL_GATE.clone()
            }),
            None => DEFAULT_URL_GATE.clone(),
        };

        Self {
            output_dir: conf.get(keys::OUTPUT_DIR).map(str::to_string),
            url_gate,
            options: CaptionOptions::from_conf(conf),
        }
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self::from_conf(&Configuration::default())
    }
}

/// Choose the directory for caption files.
///
/// A configured directory must pass the output-dir regex and be creatable;
/// otherwise the system temp directory is used. Never fails.
pub async fn resolve_output_dir(configured: Option<&str>) -> PathBuf {
    let fallback = std::env::temp_dir();
    let Some(configured) = configured else {
        return fallback;
    };

    if !OUTPUT_DIR_GATE.is_match(configured) {
        warn!(
            "Output directory '{}' rejected, using {}",
            configured,
            fallback.display()
        );
        return fallback;
    }

    let dir = Path::new(configured);
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(
            "Cannot create output directory '{}' ({}), using {}",
            configured,
            e,
            fallback.display()
        );
        return fallback;
    }

    dir.to_path_buf()
}

/// Body NER plus YouTube caption ingestion with caption NER.
pub struct YoutubeCcReaderFilter {
    conf: Configuration,
    settings: ReaderSettings,
    ner: NerAdapter,
    captions: Arc<dyn CaptionSource>,
    custom_ner: bool,
    custom_captions: bool,
}

impl YoutubeCcReaderFilter {
    pub fn new() -> Self {
        Self {
            conf: Configuration::default(),
            settings: ReaderSettings::default(),
            ner: NerAdapter::default(),
            captions: Arc::new(YtDlpCaptionSource::default()),
            custom_ner: false,
            custom_captions: false,
        }
    }

    /// Replace the caption source. `configure` keeps it.
    pub fn with_caption_source(mut self, source: Arc<dyn CaptionSource>) -> Self {
        self.captions = source;
        self.custom_captions = true;
        self
    }

    /// Replace the NER adapter. `configure` keeps it.
    pub fn with_ner(mut self, ner: NerAdapter) -> Self {
        self.ner = ner;
        self.custom_ner = true;
        self
    }

    pub fn caption_options(&self) -> CaptionOptions {
        self.settings.options
    }

    pub fn url_matches(&self, url: &str) -> bool {
        self.settings.url_gate.is_match(url)
    }

    async fn recognise_into(&self, doc: &mut IndexDocument, text: &str, prefix: &str, url: &str) {
        match self.ner.recognise(text).await {
            Ok(names) => add_entity_fields(doc, &names, prefix),
            Err(e) if prefix.is_empty() => error!("NER on body of {} failed: {}", url, e),
            Err(e) => error!("NER on captions of {} failed: {}", url, e),
        }
    }
}

impl Default for YoutubeCcReaderFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexingFilter for YoutubeCcReaderFilter {
    fn name(&self) -> &str {
        "youtubeccreader"
    }

    fn configure(&mut self, conf: &Configuration) {
        self.conf = conf.clone();
        self.settings = ReaderSettings::from_conf(conf);
        if !self.custom_ner {
            self.ner = NerAdapter::from_conf(conf);
        }
        if !self.custom_captions {
            self.captions = Arc::new(YtDlpCaptionSource::from_conf(conf));
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
        self.recognise_into(&mut doc, parse.text(), "", url).await;

        if !self.url_matches(url) {
            debug!("{} is not a YouTube video URL, skipping captions", url);
            return Ok(doc);
        }

        let output_dir = resolve_output_dir(self.settings.output_dir.as_deref()).await;
        let retriever = CaptionRetriever::new(
            url,
            output_dir,
            self.settings.options,
            self.captions.clone(),
        );

        let Some(captions) = retriever.retrieve().await else {
            return Ok(doc);
        };

        let cc_text = retriever.process(&captions);
        debug!("{}: {} caption characters", url, cc_text.len());
        doc.add(CLOSED_CAPTION_FIELD, cc_text.as_str());

        self.recognise_into(&mut doc, &cc_text, CC_PREFIX, url).await;

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_gate() {
        let filter = YoutubeCcReaderFilter::new();
        assert!(filter.url_matches("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(filter.url_matches("http://youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!filter.url_matches("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10"));
        assert!(!filter.url_matches("https://www.youtube.com/watch?v=short"));
        assert!(!filter.url_matches("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!filter.url_matches("https://example.org/page"));
    }

    #[test]
    fn test_configured_gate_must_match_whole_url() {
        let mut filter = YoutubeCcReaderFilter::new();
        filter.configure(&Configuration::new().with(keys::URL_REGEX, r"https://videos\.example/\d+"));

        assert!(filter.url_matches("https://videos.example/42"));
        assert!(!filter.url_matches("https://videos.example/42/comments"));
        assert!(!filter.url_matches("see https://videos.example/42"));
    }

    #[test]
    fn test_invalid_gate_falls_back_to_default() {
        let mut filter = YoutubeCcReaderFilter::new();
        filter.configure(&Configuration::new().with(keys::URL_REGEX, "(unclosed"));
        assert!(filter.url_matches("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[test]
    fn test_caption_options_from_conf() {
        let mut filter = YoutubeCcReaderFilter::new();
        assert_eq!(filter.caption_options(), CaptionOptions::default());

        filter.configure(
            &Configuration::new()
                .with(keys::DEBUG, "true")
                .with(keys::INCLUDE_TITLE, "TRUE")
                .with(keys::INCLUDE_TRACK_TITLE, "false")
                .with(keys::REMOVE_TIMING_SUBTITLE, "false"),
        );
        assert_eq!(
            filter.caption_options(),
            CaptionOptions {
                debug: true,
                include_title: true,
                include_track_title: false,
                remove_timing: false,
            }
        );
    }

    #[test]
    fn test_output_dir_gate() {
        assert!(OUTPUT_DIR_GATE.is_match("/var/lib/captions"));
        assert!(OUTPUT_DIR_GATE.is_match("captions"));
        for rejected in ["-weird", "+x", "~/captions", "|pipe", ";rm", "a"] {
            assert!(!OUTPUT_DIR_GATE.is_match(rejected), "{}", rejected);
        }
    }

    #[tokio::test]
    async fn test_resolve_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("cc").join("out");
        let nested_str = nested.to_string_lossy().to_string();

        assert_eq!(resolve_output_dir(Some(&nested_str)).await, nested);
        assert!(nested.is_dir());

        assert_eq!(resolve_output_dir(None).await, std::env::temp_dir());
        assert_eq!(resolve_output_dir(Some("-weird")).await, std::env::temp_dir());
    }

    #[tokio::test]
    async fn test_uncreatable_output_dir_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let below_file = file.join("captions").to_string_lossy().to_string();

        assert_eq!(resolve_output_dir(Some(&below_file)).await, std::env::temp_dir());
    }
}
