//! Configuration management for mp3batch

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output folder used instead of prompting at start
    pub default_directory: Option<PathBuf>,
    /// Target codec handed to the extractor, also the file extension
    pub audio_format: String,
    /// Target bitrate in kbit/s
    pub audio_quality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Capacity of the worker to renderer event channel
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            output: OutputConfig {
                default_directory: None,
                audio_format: "mp3".to_string(),
                audio_quality: "192".to_string(),
            },
            progress: ProgressConfig {
                channel_capacity: 64,
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = Self::default_path() {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
            }
        }

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("MP3BATCH_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the per-user config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mp3batch/config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let format = &self.output.audio_format;
        if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidValue(format!(
                "output.audio_format must be a bare extension, got {:?}",
                format
            )));
        }
        if self.output.audio_quality.parse::<u32>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "output.audio_quality must be a bitrate in kbit/s, got {:?}",
                self.output.audio_quality
            )));
        }
        if self.progress.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "progress.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path if configured or on PATH; yt-dlp falls back to its own lookup otherwise
    pub fn ffmpeg_path(&self) -> Option<PathBuf> {
        self.paths
            .ffmpeg
            .clone()
            .or_else(|| which::which("ffmpeg").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.audio_format, "mp3");
        assert_eq!(config.output.audio_quality, "192");
        assert!(config.output.default_directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[output]\naudio_quality = \"320\"\ndefault_directory = \"/tmp/music\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output.audio_quality, "320");
        assert_eq!(config.output.audio_format, "mp3");
        assert_eq!(
            config.output.default_directory,
            Some(PathBuf::from("/tmp/music"))
        );
    }

    #[test]
    fn test_rejects_bad_quality() {
        let mut config = Config::default();
        config.output.audio_quality = "high".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_rejects_format_with_separator() {
        let mut config = Config::default();
        config.output.audio_format = "../mp3".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serializes_to_toml() {
        let rendered = toml::to_string(&Config::default()).unwrap();
        assert!(rendered.contains("audio_format = \"mp3\""));
    }
}
