mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Per-item status goes through the progress bar; logs stay quiet unless asked for
    let filter = match cli.verbose {
        0 => "mp3batch=warn",
        1 => "mp3batch=info",
        2 => "mp3batch=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Some(Commands::Run { options }) => {
            commands::run::run(&options, cli.config.as_deref()).await
        }
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await,
        None => {
            if cli.run.input.is_some() {
                commands::run::run(&cli.run, cli.config.as_deref()).await
            } else {
                // No link file, print help
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
