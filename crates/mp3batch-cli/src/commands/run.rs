use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::args::RunOptions;
use mp3batch_core::{
    batch::FailureKind,
    config::Config,
    error::SetupError,
    BatchController, BatchEvent, BatchPlan, BatchReport, BatchState, ItemOutcome, YtDlp,
};

pub async fn run(options: &RunOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    // Nothing to do until a link file is selected
    if options.input.is_none() {
        return Err(SetupError::NoLinkFile.into());
    }

    let output_dir = match options
        .output
        .clone()
        .or_else(|| config.output.default_directory.clone())
    {
        Some(dir) => dir,
        None => match prompt_output_dir(&config.output.audio_format)? {
            Some(dir) => dir,
            None => {
                println!("{} No folder chosen, nothing downloaded", style("!").yellow());
                return Ok(());
            }
        },
    };

    let plan = match BatchPlan::prepare(
        options.input.as_deref(),
        Some(output_dir.as_path()),
        &config.output.audio_format,
    )
    .await
    {
        Ok(plan) => plan,
        Err(SetupError::NoLinks) => {
            println!("{} {}", style("i").cyan(), SetupError::NoLinks);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let extractor =
        YtDlp::from_config(&config).context("yt-dlp is required, run `mp3batch doctor`")?;

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(config.progress.channel_capacity);

    // The batch runs on its own task; this task only renders and listens for Ctrl-C
    let worker_cancel = cancel.clone();
    let worker = tokio::spawn(async move {
        let mut controller = BatchController::new(extractor);
        controller.run(&plan, &worker_cancel, &tx).await
    });

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {prefix} {bar:40.cyan/blue} {msg}",
        )?
        .progress_chars("=>-"),
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut listening = true;

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => render(&pb, event),
                None => break,
            },
            signal = &mut ctrl_c, if listening => {
                listening = false;
                match signal {
                    Ok(()) => {
                        cancel.cancel();
                        pb.set_message("Cancelling download...");
                    }
                    Err(e) => debug!("Ctrl-C handler unavailable: {}", e),
                }
            }
        }
    }

    let report = worker.await.context("Batch worker panicked")?;
    print_summary(&report);
    Ok(())
}

fn render(pb: &ProgressBar, event: BatchEvent) {
    match event {
        BatchEvent::Started { total } => {
            pb.set_prefix(format!("[0/{}]", total));
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
        }
        BatchEvent::ItemStarted { index, total, title } => {
            pb.set_prefix(format!("[{}/{}]", index, total));
            pb.set_message(format!("Downloading {} of {}: {}", index, total, truncate(&title, 40)));
        }
        BatchEvent::Progress { sample, .. } => {
            pb.set_position(sample.percent() as u64);
            // The reset sample keeps the "Downloading i of N" status visible
            if sample.downloaded > 0 {
                pb.set_message(sample.to_string());
            }
        }
        BatchEvent::ItemFinished { index, total, outcome } => match outcome {
            ItemOutcome::Succeeded { path } => {
                pb.set_position(100);
                pb.println(format!(
                    "{} [{}/{}] {}",
                    style("✓").green(),
                    index,
                    total,
                    path.file_name().unwrap_or_default().to_string_lossy()
                ));
            }
            ItemOutcome::Failed { kind: FailureKind::Source, message } => {
                pb.println(format!(
                    "{} Invalid URL: error on video {} of {}:\n    {}",
                    style("✗").red(),
                    index,
                    total,
                    message
                ));
            }
            ItemOutcome::Failed { kind: FailureKind::Transfer, message } => {
                pb.set_message(format!("Error on video {} of {}: {}", index, total, message));
            }
            ItemOutcome::Skipped => {}
        },
        BatchEvent::CancelledAt { index, total } => {
            pb.set_message(format!("Download canceled at video {} of {}", index, total));
        }
        BatchEvent::Finished(report) => match report.state {
            BatchState::Cancelled => pb.abandon(),
            _ => pb.finish_with_message("All downloads completed successfully."),
        },
    }
}

fn print_summary(report: &BatchReport) {
    println!();
    if report.state == BatchState::Cancelled {
        println!(
            "{} The download was canceled by the user ({} of {} attempted).",
            style("!").yellow(),
            report.attempted(),
            report.total()
        );
    } else {
        println!(
            "{} All files have been downloaded ({:.1}s).",
            style("✓").green(),
            report.elapsed.as_secs_f32()
        );
    }

    let failures: Vec<_> = report.failures().collect();
    println!("Succeeded: {}", report.succeeded());
    println!("Failed: {}", failures.len());

    if !failures.is_empty() {
        println!("\nFailed URLs:");
        for (url, _, message) in failures {
            println!("  {} - {}", url, message);
        }
    }
}

/// Ask for the output folder; an empty answer means the user backed out
fn prompt_output_dir(audio_format: &str) -> Result<Option<PathBuf>> {
    print!(
        "Select folder to save {} files: ",
        audio_format.to_uppercase()
    );
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_dir_answer(&input))
}

fn parse_dir_answer(input: &str) -> Option<PathBuf> {
    let answer = input.trim();
    if answer.is_empty() {
        return None;
    }
    match answer.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if answer == "~" => dirs::home_dir(),
        None => Some(PathBuf::from(answer)),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dir_answer() {
        assert_eq!(parse_dir_answer("  \n"), None);
        assert_eq!(parse_dir_answer("/tmp/music\n"), Some(PathBuf::from("/tmp/music")));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(parse_dir_answer("~/Music"), Some(home.join("Music")));
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("ééééééééééé", 8), "ééééé...");
    }
}
