//! Audio extraction through yt-dlp

use crate::error::ExtractError;
use crate::progress::{parse_progress_line, ProgressSample, PROGRESS_TEMPLATE};
use crate::Config;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl VideoMetadata {
    /// Title if present and non-empty, otherwise the video id
    pub fn display_name(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.id,
        }
    }
}

/// Resolves metadata and transfers audio for a single URL
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, ExtractError>;

    /// Fetch the best audio stream for `url` and convert it into `destination`.
    ///
    /// Progress samples are pushed into `progress` without waiting; the
    /// channel closes when the transfer ends.
    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        progress: mpsc::Sender<ProgressSample>,
    ) -> Result<(), ExtractError>;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    yt_dlp_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    audio_format: String,
    audio_quality: String,
}

impl YtDlp {
    pub fn new(yt_dlp_path: PathBuf, ffmpeg_path: Option<PathBuf>) -> Self {
        Self {
            yt_dlp_path,
            ffmpeg_path,
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let mut yt_dlp = Self::new(config.yt_dlp_path()?, config.ffmpeg_path());
        yt_dlp.audio_format = config.output.audio_format.clone();
        yt_dlp.audio_quality = config.output.audio_quality.clone();
        Ok(yt_dlp)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(["--no-playlist", "--no-warnings"]);
        if let Some(ref ffmpeg) = self.ffmpeg_path {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }
        // Keep terminal Ctrl-C away from yt-dlp; an in-flight transfer finishes on its own
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.kill_on_drop(true);
        cmd
    }

    fn transfer_args(&self, destination: &Path) -> Vec<String> {
        vec![
            // Format selection: best audio-only stream, else best muxed
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", self.audio_quality),
            "-o".to_string(),
            output_template(destination),
            "--progress".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
        ]
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn resolve_metadata(&self, url: &str) -> Result<VideoMetadata, ExtractError> {
        debug!("Resolving metadata for: {}", url);

        let output = self
            .command()
            .args(["--dump-single-json", "--skip-download", "--"])
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, output.status.code(), &stderr));
        }

        let metadata: VideoMetadata = serde_json::from_slice(&output.stdout)
            .map_err(|e| ExtractError::MetadataParse(e.to_string()))?;

        debug!("Resolved: {} ({})", metadata.display_name(), metadata.id);
        Ok(metadata)
    }

    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        progress: mpsc::Sender<ProgressSample>,
    ) -> Result<(), ExtractError> {
        info!("Downloading audio from: {}", url);

        let mut child = self
            .command()
            .args(self.transfer_args(destination))
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child.stdout.take().ok_or_else(|| ExtractError::Failed {
            code: None,
            reason: "no stdout".to_string(),
        })?;
        let stderr_pipe = child.stderr.take().ok_or_else(|| ExtractError::Failed {
            code: None,
            reason: "no stderr".to_string(),
        })?;

        // Progress may land on either stream depending on yt-dlp's output mode
        let stderr_progress = progress.clone();
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let mut lines = BufReader::new(stderr_pipe).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_progress_line(&line) {
                    Some(sample) => {
                        let _ = stderr_progress.try_send(sample);
                    }
                    None => {
                        buf.push_str(&line);
                        buf.push('\n');
                    }
                }
            }
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_progress_line(&line) {
                // Renderer lagging behind; the next sample supersedes this one
                Some(sample) => {
                    let _ = progress.try_send(sample);
                }
                None => trace!("yt-dlp: {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, status.code(), &stderr));
        }

        if !destination.exists() {
            return Err(ExtractError::Postprocess(format!(
                "expected output {} was not produced",
                destination.display()
            )));
        }

        debug!("Saved: {}", destination.display());
        Ok(())
    }
}

/// yt-dlp output template writing to `destination` with whatever extension it downloads
fn output_template(destination: &Path) -> String {
    let escaped = destination.to_string_lossy().replace('%', "%%");
    PathBuf::from(escaped)
        .with_extension("%(ext)s")
        .to_string_lossy()
        .into_owned()
}

fn spawn_error(err: std::io::Error) -> ExtractError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ExtractError::ToolNotFound { tool: "yt-dlp" }
    } else {
        ExtractError::Io(err)
    }
}

/// Map a failed yt-dlp run onto the error taxonomy
fn classify_failure(url: &str, code: Option<i32>, stderr: &str) -> ExtractError {
    let error_line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("ERROR:"))
        .map(str::trim);

    match error_line {
        Some(reason)
            if reason.starts_with("Postprocessing:") || reason.contains("ffmpeg not found") =>
        {
            ExtractError::Postprocess(reason.to_string())
        }
        Some(reason) => ExtractError::InvalidSource {
            url: url.to_string(),
            reason: reason.to_string(),
        },
        None => ExtractError::Failed {
            code,
            reason: stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no output")
                .to_string(),
        },
    }
}
