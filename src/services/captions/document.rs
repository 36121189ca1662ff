//! Structured caption track and its plain-text rendering.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{keys, Configuration};

/// Toggles that shape retrieval and rendering of a caption track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionOptions {
    /// Verbose downloader logging; intermediate files are kept.
    pub debug: bool,
    /// Prepend the video title.
    pub include_title: bool,
    /// Prepend the caption track title.
    pub include_track_title: bool,
    /// Omit per-cue timestamps.
    pub remove_timing: bool,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            debug: false,
            include_title: false,
            include_track_title: false,
            remove_timing: true,
        }
    }
}

impl CaptionOptions {
    /// Read the `indexer.setting.*.option` toggles, defaulting missing keys.
    pub fn from_conf(conf: &Configuration) -> Self {
        let defaults = Self::default();
        Self {
            debug: conf.get_bool(keys::DEBUG, defaults.debug),
            include_title: conf.get_bool(keys::INCLUDE_TITLE, defaults.include_title),
            include_track_title: conf
                .get_bool(keys::INCLUDE_TRACK_TITLE, defaults.include_track_title),
            remove_timing: conf.get_bool(keys::REMOVE_TIMING_SUBTITLE, defaults.remove_timing),
        }
    }
}

/// A single timed caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// A downloaded caption track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionDocument {
    pub video_id: String,
    pub video_title: Option<String>,
    pub track_title: Option<String>,
    pub language: Option<String>,
    pub cues: Vec<Cue>,
}

impl CaptionDocument {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Render to plain text, one line per element, cues in temporal order.
    pub fn render(&self, options: &CaptionOptions) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.cues.len() * 2 + 2);

        if options.include_title {
            if let Some(title) = self.video_title.as_deref().filter(|t| !t.is_empty()) {
                lines.push(title.to_string());
            }
        }
        if options.include_track_title {
            if let Some(title) = self.track_title.as_deref().filter(|t| !t.is_empty()) {
                lines.push(title.to_string());
            }
        }

        let mut cues: Vec<&Cue> = self.cues.iter().collect();
        cues.sort_by_key(|c| c.start);

        for cue in cues {
            if !options.remove_timing {
                lines.push(format!(
                    "{} --> {}",
                    format_timestamp(cue.start),
                    format_timestamp(cue.end)
                ));
            }
            lines.push(cue.text.clone());
        }

        lines.join("\n")
    }
}

/// `HH:MM:SS.mmm`
pub fn format_timestamp(at: Duration) -> String {
    let millis = at.as_millis();
    let hours = millis / 3_600_000;
    let minutes = (millis / 60_000) % 60;
    let seconds = (millis / 1000) % 60;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start_ms: u64, end_ms: u64, text: &str) -> Cue {
        Cue {
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: text.to_string(),
        }
    }

    fn sample() -> CaptionDocument {
        CaptionDocument {
            video_id: "dQw4w9WgXcQ".to_string(),
            video_title: Some("Weekly update".to_string()),
            track_title: Some("English".to_string()),
            language: Some("en".to_string()),
            cues: vec![cue(2_500, 4_000, "see you soon"), cue(0, 2_500, "we meet Bob today")],
        }
    }

    #[test]
    fn test_default_render_is_plain_text_in_order() {
        let text = sample().render(&CaptionOptions::default());
        assert_eq!(text, "we meet Bob today\nsee you soon");
    }

    #[test]
    fn test_render_with_titles_and_timing() {
        let options = CaptionOptions {
            debug: false,
            include_title: true,
            include_track_title: true,
            remove_timing: false,
        };
        let text = sample().render(&options);

        assert_eq!(
            text,
            "Weekly update\nEnglish\n\
             00:00:00.000 --> 00:00:02.500\nwe meet Bob today\n\
             00:00:02.500 --> 00:00:04.000\nsee you soon"
        );
    }

    #[test]
    fn test_missing_titles_are_skipped() {
        let mut doc = sample();
        doc.video_title = None;
        doc.track_title = Some(String::new());
        let options = CaptionOptions {
            include_title: true,
            include_track_title: true,
            ..CaptionOptions::default()
        };

        assert_eq!(doc.render(&options), "we meet Bob today\nsee you soon");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::from_millis(3_723_045)), "01:02:03.045");
    }
}
