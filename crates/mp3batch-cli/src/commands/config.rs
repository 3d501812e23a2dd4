use anyhow::{Context, Result};
use std::path::Path;
use mp3batch_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("mp3batch configuration\n");
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());

    if config.paths.yt_dlp.is_none() {
        println!("# paths.yt_dlp: auto-detect");
    }
    if config.paths.ffmpeg.is_none() {
        println!("# paths.ffmpeg: auto-detect");
    }
    if config.output.default_directory.is_none() {
        println!("# output.default_directory: prompt at start");
    }

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(default_path) = Config::default_path() {
        println!("  2. {}", default_path.display());
    }
    println!("  3. Environment variables (MP3BATCH_<SECTION>__<KEY>)");

    Ok(())
}
