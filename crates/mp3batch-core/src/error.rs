//! Error types for mp3batch-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons a batch run never leaves the idle state
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Please select a text file containing links.")]
    NoLinkFile,

    #[error("No output folder was chosen.")]
    NoOutputDirectory,

    #[error("Failed to read link file {path}: {source}")]
    ReadLinks {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No links found in the selected file.")]
    NoLinks,

    #[error("Failed to create output folder {path}: {source}")]
    CreateOutputDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{tool} not found in PATH; set its location under [paths] in the config")]
    ToolNotFound { tool: &'static str },

    #[error("Invalid or unreachable source {url}: {reason}")]
    InvalidSource { url: String, reason: String },

    #[error("yt-dlp failed with exit code {code:?}: {reason}")]
    Failed { code: Option<i32>, reason: String },

    #[error("Audio conversion failed: {0}")]
    Postprocess(String),

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether the failure is attributed to the link itself rather than the transfer
    pub fn is_source_error(&self) -> bool {
        matches!(self, ExtractError::InvalidSource { .. })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: BatchError = ConfigError::InvalidValue("yt-dlp not found in PATH".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid config value: yt-dlp not found in PATH"
        );
    }
}
