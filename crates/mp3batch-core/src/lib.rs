//! mp3batch-core: batch audio downloads from a list of video links

pub mod batch;
pub mod config;
pub mod error;
pub mod extractor;
pub mod links;
pub mod paths;
pub mod progress;
pub mod sanitize;

pub use batch::{BatchController, BatchEvent, BatchPlan, BatchReport, BatchState, ItemOutcome};
pub use config::Config;
pub use error::{BatchError, Result};
pub use extractor::{Extractor, VideoMetadata, YtDlp};
