//! Caption download via yt-dlp.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{parse_vtt, CaptionDocument, CaptionError, CaptionOptions, CaptionSource};
use crate::config::{keys, Configuration};

pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Metadata returned by `yt-dlp --dump-json` (only the parts used here).
#[derive(Debug, Clone, Deserialize)]
struct VideoMetadata {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    language: Option<String>,
    /// Manually authored tracks keyed by language code.
    #[serde(default)]
    subtitles: Option<BTreeMap<String, Vec<SubtitleFormat>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubtitleFormat {
    ext: String,
    #[serde(default)]
    name: Option<String>,
}

/// The track chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackChoice {
    language: String,
    name: Option<String>,
}

impl VideoMetadata {
    /// Pick the default track: the video's own language, then English, then
    /// any regional English, then the first available language.
    fn default_track(&self) -> Option<TrackChoice> {
        let subtitles = self.subtitles.as_ref()?;
        let candidates: BTreeMap<&str, &SubtitleFormat> = subtitles
            .iter()
            .filter(|(lang, _)| lang.as_str() != "live_chat")
            .filter_map(|(lang, formats)| {
                formats
                    .iter()
                    .find(|f| f.ext == "vtt")
                    .map(|f| (lang.as_str(), f))
            })
            .collect();

        let language = self
            .language
            .as_deref()
            .filter(|lang| candidates.contains_key(lang))
            .or_else(|| candidates.contains_key("en").then_some("en"))
            .or_else(|| candidates.keys().copied().find(|lang| lang.starts_with("en-")))
            .or_else(|| candidates.keys().next().copied())?;

        Some(TrackChoice {
            language: language.to_string(),
            name: candidates[language].name.clone(),
        })
    }
}

/// Runs the yt-dlp executable to fetch captions.
#[derive(Debug, Clone)]
pub struct YtDlpCaptionSource {
    binary: String,
    proxy: Option<String>,
}

impl YtDlpCaptionSource {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            proxy: None,
        }
    }

    /// Forward `--proxy` to every yt-dlp invocation.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn from_conf(conf: &Configuration) -> Self {
        let source = Self::new(conf.get_or(keys::YTDLP_PATH, DEFAULT_YTDLP_BINARY));
        match conf.get(keys::YTDLP_PROXY).filter(|p| !p.trim().is_empty()) {
            Some(proxy) => source.with_proxy(proxy.trim()),
            None => source,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn check_tool(&self) -> Result<PathBuf, CaptionError> {
        which::which(&self.binary).map_err(|_| CaptionError::ToolMissing(self.binary.clone()))
    }

    async fn run(&self, tool: &Path, args: &[&str], verbose: bool) -> Result<Vec<u8>, CaptionError> {
        let mut cmd = Command::new(tool);
        cmd.args(args);

        if let Some(proxy) = &self.proxy {
            debug!("Using proxy for yt-dlp: {}", proxy);
            cmd.args(["--proxy", proxy.as_str()]);
        }

        if verbose {
            info!("Running {} {}", self.binary, args.join(" "));
        }

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if verbose && !stderr.trim().is_empty() {
            info!("yt-dlp stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            return Err(CaptionError::CommandFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    async fn fetch_metadata(
        &self,
        tool: &Path,
        url: &str,
        verbose: bool,
    ) -> Result<VideoMetadata, CaptionError> {
        let stdout = self
            .run(tool, &["--dump-json", "--no-playlist", url], verbose)
            .await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn download_track(
        &self,
        tool: &Path,
        url: &str,
        metadata: &VideoMetadata,
        language: &str,
        output_dir: &Path,
        verbose: bool,
    ) -> Result<PathBuf, CaptionError> {
        let template = output_template(output_dir, &metadata.id);

        let mut args = vec![
            "--skip-download",
            "--write-subs",
            "--no-playlist",
            "--sub-langs",
            language,
            "--sub-format",
            "vtt",
            "--output",
            template.as_str(),
        ];
        if verbose {
            args.push("--verbose");
        } else {
            args.push("--no-progress");
        }
        args.push(url);

        self.run(tool, &args, verbose).await?;

        let expected = output_dir.join(format!("{}.{}.vtt", metadata.id, language));
        if tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            return Ok(expected);
        }

        // yt-dlp may normalise the language suffix; take any track for this id.
        let mut entries = tokio::fs::read_dir(output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&metadata.id) && name.ends_with(".vtt") {
                return Ok(entry.path());
            }
        }

        Err(CaptionError::CommandFailed(format!(
            "caption file not found for video {}",
            metadata.id
        )))
    }
}

/// yt-dlp `--output` template for `<dir>/<id>.<ext>`, with `%` escaped
/// everywhere but the extension field.
fn output_template(dir: &Path, id: &str) -> String {
    format!(
        "{}{}{}.%(ext)s",
        dir.to_string_lossy().replace('%', "%%"),
        std::path::MAIN_SEPARATOR,
        id.replace('%', "%%")
    )
}

impl Default for YtDlpCaptionSource {
    fn default() -> Self {
        Self::new(DEFAULT_YTDLP_BINARY)
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionSource {
    fn source_id(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        options: &CaptionOptions,
    ) -> Result<Option<CaptionDocument>, CaptionError> {
        let tool = self.check_tool()?;
        let verbose = options.debug;

        let metadata = self.fetch_metadata(&tool, url, verbose).await?;
        let Some(track) = metadata.default_track() else {
            debug!("Video {} has no caption tracks", metadata.id);
            return Ok(None);
        };
        debug!("Selected caption track '{}' for {}", track.language, metadata.id);

        // One directory per call so concurrent fetches of a video never share files.
        let work_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", metadata.id))
            .keep(verbose)
            .tempdir_in(output_dir)?;

        let contents = async {
            let path = self
                .download_track(&tool, url, &metadata, &track.language, work_dir.path(), verbose)
                .await?;
            Ok::<_, CaptionError>(tokio::fs::read_to_string(&path).await?)
        }
        .await;

        if verbose {
            info!("Keeping caption files in {}", work_dir.path().display());
        } else {
            let dir = work_dir.path().to_path_buf();
            if let Err(e) = work_dir.close() {
                warn!("Failed to remove caption files in {}: {}", dir.display(), e);
            }
        }

        let cues = parse_vtt(&contents?)?;
        Ok(Some(CaptionDocument {
            video_id: metadata.id,
            video_title: metadata.title,
            track_title: track.name,
            language: Some(track.language),
            cues,
        }))
    }
}
