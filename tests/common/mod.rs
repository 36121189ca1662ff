//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use indexfilters::models::{CrawlDatum, IndexDocument, Inlinks, Parse};
use indexfilters::services::{
    CaptionDocument, CaptionError, CaptionOptions, CaptionSource, Cue, NerBackend, NerError,
    NerResult,
};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Recognises a fixed vocabulary: any listed word present in the text is
/// reported under its category.
pub struct KeywordNer {
    vocabulary: Vec<(&'static str, &'static str)>,
    pub calls: AtomicUsize,
}

impl KeywordNer {
    pub fn new(vocabulary: &[(&'static str, &'static str)]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn people() -> Self {
        Self::new(&[
            ("Alice", "PERSON"),
            ("Bob", "PERSON"),
            ("Acme", "ORGANIZATION"),
        ])
    }
}

#[async_trait]
impl NerBackend for KeywordNer {
    fn backend_id(&self) -> &str {
        "keyword"
    }

    async fn recognise(&self, text: &str) -> Result<NerResult, NerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut result: NerResult = BTreeMap::new();
        for (word, category) in &self.vocabulary {
            if text.split(|c: char| !c.is_alphanumeric()).any(|w| w == *word) {
                result
                    .entry(category.to_string())
                    .or_insert_with(BTreeSet::new)
                    .insert(word.to_string());
            }
        }
        Ok(result)
    }
}

/// Always fails recognition.
pub struct BrokenNer;

#[async_trait]
impl NerBackend for BrokenNer {
    fn backend_id(&self) -> &str {
        "broken"
    }

    async fn recognise(&self, _text: &str) -> Result<NerResult, NerError> {
        Err(NerError::Recognition("engine crashed".to_string()))
    }
}

/// What a `FakeCaptions` source does when fetched.
#[derive(Clone)]
pub enum CaptionBehaviour {
    Track(Vec<&'static str>),
    NoTrack,
    Fail,
}

/// In-memory caption source recording every call.
pub struct FakeCaptions {
    behaviour: CaptionBehaviour,
    pub calls: AtomicUsize,
    pub output_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeCaptions {
    pub fn new(behaviour: CaptionBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            output_dirs: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_output_dir(&self) -> Option<PathBuf> {
        self.output_dirs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CaptionSource for FakeCaptions {
    fn source_id(&self) -> &str {
        "fake"
    }

    async fn fetch(
        &self,
        _url: &str,
        output_dir: &Path,
        _options: &CaptionOptions,
    ) -> Result<Option<CaptionDocument>, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.output_dirs.lock().unwrap().push(output_dir.to_path_buf());

        match &self.behaviour {
            CaptionBehaviour::Track(lines) => Ok(Some(CaptionDocument {
                video_id: "dQw4w9WgXcQ".to_string(),
                video_title: Some("Weekly update".to_string()),
                track_title: Some("English".to_string()),
                language: Some("en".to_string()),
                cues: lines
                    .iter()
                    .enumerate()
                    .map(|(i, text)| Cue {
                        start: Duration::from_secs(2 * i as u64),
                        end: Duration::from_secs(2 * i as u64 + 2),
                        text: text.to_string(),
                    })
                    .collect(),
            })),
            CaptionBehaviour::NoTrack => Ok(None),
            CaptionBehaviour::Fail => Err(CaptionError::CommandFailed("HTTP 429".to_string())),
        }
    }
}

/// Text value of the only entry of `field`.
pub fn text_field<'a>(doc: &'a IndexDocument, field: &str) -> Option<&'a str> {
    doc.first_value(field).and_then(|v| v.as_text())
}

pub fn cc_fields(doc: &IndexDocument) -> Vec<&str> {
    doc.field_names().filter(|n| n.starts_with("CC-")).collect()
}

pub fn inputs(text: &str) -> (Parse, CrawlDatum, Inlinks) {
    (Parse::new(text), CrawlDatum::default(), Inlinks::default())
}
