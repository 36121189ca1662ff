//! Closed-caption retrieval for YouTube videos.
//!
//! A [`CaptionSource`] knows how to obtain the default caption track for a
//! video URL. [`CaptionRetriever`] binds a source to one URL and one set of
//! [`CaptionOptions`] and turns every failure into "no captions", which is all
//! the indexing filter needs to know.

mod document;
mod retriever;
mod vtt;
mod ytdlp;

pub use document::{format_timestamp, CaptionDocument, CaptionOptions, Cue};
pub use retriever::{CaptionRetriever, CaptionSource};
pub use vtt::{parse_timestamp, parse_vtt};
pub use ytdlp::{YtDlpCaptionSource, DEFAULT_YTDLP_BINARY};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption tool not found: {0}")]
    ToolMissing(String),

    #[error("caption download failed: {0}")]
    CommandFailed(String),

    #[error("failed to parse video metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("failed to parse caption track: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
