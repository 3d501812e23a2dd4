use anyhow::Result;
use console::style;
use std::path::{Path, PathBuf};
use std::process::Command;
use mp3batch_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("mp3batch dependency check\n");

    let yt_dlp = config.yt_dlp_path().ok();
    let yt_dlp_ok = check(
        "yt-dlp:",
        yt_dlp.as_deref(),
        &["--version"],
        |out| out.trim().to_string(),
    );

    let ffmpeg = config.ffmpeg_path();
    let ffmpeg_ok = check("ffmpeg:", ffmpeg.as_deref(), &["-version"], |out| {
        // "ffmpeg version 6.1.1 Copyright ..." -> "6.1.1"
        out.lines()
            .next()
            .and_then(|l| l.split_whitespace().nth(2))
            .unwrap_or("unknown")
            .to_string()
    });

    println!();
    if yt_dlp_ok && ffmpeg_ok {
        println!("{} All dependencies OK!", style("✓").green());
    } else {
        println!(
            "{} Some dependencies are missing. See above for installation instructions.",
            style("!").yellow()
        );
    }

    Ok(())
}

fn check(
    label: &str,
    path: Option<&Path>,
    version_args: &[&str],
    version: impl Fn(&str) -> String,
) -> bool {
    print!("{:<8} ", label);
    let Some(path) = path else {
        let tool = label.trim_end_matches(':');
        println!("{}", style("NOT FOUND").red());
        println!("         {}", install_hint(tool));
        return false;
    };

    match Command::new(path).args(version_args).output() {
        Ok(out) if out.status.success() => {
            let v = version(&String::from_utf8_lossy(&out.stdout));
            println!("{} ({}, {})", style("OK").green(), v, display(path));
            true
        }
        _ => {
            println!("{} but failed to get version", style("FOUND").yellow());
            false
        }
    }
}

fn install_hint(tool: &str) -> String {
    format!(
        "Install {} and put it on PATH, or set paths.{} in the config",
        tool,
        tool.replace('-', "_")
    )
}

fn display(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => PathBuf::from("~").join(rest).display().to_string(),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
