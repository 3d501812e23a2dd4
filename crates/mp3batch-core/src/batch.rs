//! Batch download controller
//!
//! Walks the link list one item at a time: resolve the title, pick a free
//! destination, hand the URL to the extractor. Per-item failures are recorded
//! and the batch moves on; only cancellation stops it early. Cancellation is
//! observed at two checkpoints per item, before resolving and right before the
//! transfer starts. A transfer that is already running is never interrupted.

use crate::error::{ExtractError, SetupError};
use crate::extractor::Extractor;
use crate::links::read_links;
use crate::paths::unique_destination;
use crate::progress::ProgressSample;
use crate::sanitize::sanitize_filename;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-transfer buffer between the extractor and the event forwarder
const PROGRESS_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Completed | BatchState::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid, unreachable or unavailable link
    Source,
    /// Anything else that went wrong while fetching or converting
    Transfer,
}

impl From<&ExtractError> for FailureKind {
    fn from(err: &ExtractError) -> Self {
        if err.is_source_error() {
            FailureKind::Source
        } else {
            FailureKind::Transfer
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Succeeded { path: PathBuf },
    Failed { kind: FailureKind, message: String },
    /// Not attempted because the batch was cancelled first
    Skipped,
}

impl ItemOutcome {
    fn failed(err: &ExtractError) -> Self {
        ItemOutcome::Failed {
            kind: err.into(),
            message: err.to_string(),
        }
    }
}

/// Progress and status updates from a running batch
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    ItemStarted { index: usize, total: usize, title: String },
    Progress { index: usize, sample: ProgressSample },
    ItemFinished { index: usize, total: usize, outcome: ItemOutcome },
    /// Cancellation observed at a checkpoint of item `index`
    CancelledAt { index: usize, total: usize },
    Finished(BatchReport),
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub state: BatchState,
    /// One entry per link, in list order
    pub items: Vec<(String, ItemOutcome)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn attempted(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, o)| !matches!(o, ItemOutcome::Skipped))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, o)| matches!(o, ItemOutcome::Succeeded { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, FailureKind, &str)> {
        self.items.iter().filter_map(|(url, outcome)| match outcome {
            ItemOutcome::Failed { kind, message } => {
                Some((url.as_str(), *kind, message.as_str()))
            }
            _ => None,
        })
    }
}

/// Everything a run needs, validated up front
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub links: Vec<String>,
    pub output_dir: PathBuf,
    /// Extension of the produced files, without the dot
    pub extension: String,
}

impl BatchPlan {
    /// Check the start conditions and read the link list
    pub async fn prepare(
        link_file: Option<&Path>,
        output_dir: Option<&Path>,
        extension: &str,
    ) -> Result<Self, SetupError> {
        let link_file = link_file.ok_or(SetupError::NoLinkFile)?;
        let output_dir = output_dir.ok_or(SetupError::NoOutputDirectory)?;

        let links = read_links(link_file)
            .await
            .map_err(|source| SetupError::ReadLinks {
                path: link_file.display().to_string(),
                source,
            })?;
        if links.is_empty() {
            return Err(SetupError::NoLinks);
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| SetupError::CreateOutputDirectory {
                path: output_dir.display().to_string(),
                source,
            })?;

        Ok(Self {
            links,
            output_dir: output_dir.to_path_buf(),
            extension: extension.to_string(),
        })
    }
}

pub struct BatchController<E> {
    extractor: E,
    state: BatchState,
}

impl<E: Extractor> BatchController<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Process every link in `plan` until done or cancelled
    ///
    /// Events are best-effort: a dropped receiver does not stop the run.
    pub async fn run(
        &mut self,
        plan: &BatchPlan,
        cancel: &CancellationToken,
        events: &mpsc::Sender<BatchEvent>,
    ) -> BatchReport {
        let start_time = Instant::now();
        let total = plan.links.len();
        self.state = BatchState::Running;

        info!(
            "Starting batch of {} links into {}",
            total,
            plan.output_dir.display()
        );
        let _ = events.send(BatchEvent::Started { total }).await;

        let mut items: Vec<(String, ItemOutcome)> = plan
            .links
            .iter()
            .map(|url| (url.clone(), ItemOutcome::Skipped))
            .collect();

        for (i, url) in plan.links.iter().enumerate() {
            let index = i + 1;

            if cancel.is_cancelled() {
                self.state = BatchState::Cancelled;
                break;
            }

            let metadata = match self.extractor.resolve_metadata(url).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Error on video {} of {}: {}", index, total, e);
                    items[i].1 = ItemOutcome::failed(&e);
                    self.finish_item(events, index, total, &items[i].1).await;
                    continue;
                }
            };
            let title = sanitize_filename(metadata.display_name());
            let destination = unique_destination(&plan.output_dir, &title, &plan.extension);
            debug!("Item {} -> {}", index, destination.display());

            if cancel.is_cancelled() {
                self.state = BatchState::Cancelled;
                break;
            }

            info!("Downloading {} of {}: {}", index, total, title);
            let _ = events
                .send(BatchEvent::ItemStarted {
                    index,
                    total,
                    title: title.clone(),
                })
                .await;
            let _ = events
                .send(BatchEvent::Progress {
                    index,
                    sample: ProgressSample::default(),
                })
                .await;

            let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);
            let (result, ()) = tokio::join!(
                self.extractor.transfer(url, &destination, progress_tx),
                forward_progress(progress_rx, events, index),
            );

            items[i].1 = match result {
                Ok(()) => ItemOutcome::Succeeded { path: destination },
                Err(e) => {
                    warn!("Error on video {} of {}: {}", index, total, e);
                    ItemOutcome::failed(&e)
                }
            };
            self.finish_item(events, index, total, &items[i].1).await;
        }

        if self.state == BatchState::Cancelled {
            let index = items
                .iter()
                .position(|(_, o)| matches!(o, ItemOutcome::Skipped))
                .map_or(total, |p| p + 1);
            info!("Download canceled at video {} of {}", index, total);
            let _ = events.send(BatchEvent::CancelledAt { index, total }).await;
        } else {
            self.state = BatchState::Completed;
        }

        let report = BatchReport {
            state: self.state,
            items,
            elapsed: start_time.elapsed(),
        };
        info!(
            "Batch {:?}: {} of {} succeeded ({:.1}s)",
            report.state,
            report.succeeded(),
            total,
            report.elapsed.as_secs_f32()
        );

        let _ = events.send(BatchEvent::Finished(report.clone())).await;
        report
    }

    async fn finish_item(
        &self,
        events: &mpsc::Sender<BatchEvent>,
        index: usize,
        total: usize,
        outcome: &ItemOutcome,
    ) {
        let _ = events
            .send(BatchEvent::ItemFinished {
                index,
                total,
                outcome: outcome.clone(),
            })
            .await;
    }
}

/// Relay samples of one transfer; ends when the extractor drops its sender
async fn forward_progress(
    mut rx: mpsc::Receiver<ProgressSample>,
    events: &mpsc::Sender<BatchEvent>,
    index: usize,
) {
    while let Some(sample) = rx.recv().await {
        // Never make the transfer wait on the renderer
        let _ = events.try_send(BatchEvent::Progress { index, sample });
    }
}
