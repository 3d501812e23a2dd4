use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mp3batch")]
#[command(author, version, about = "Download the audio of every link in a text file as MP3")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunOptions,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every link in a text file
    Run {
        #[command(flatten)]
        options: RunOptions,
    },

    /// Check that yt-dlp and ffmpeg are available
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct RunOptions {
    /// Text file with one link per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Folder for the downloaded files (prompted for when omitted)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_subcommand() {
        let cli = Cli::try_parse_from(["mp3batch", "run", "-i", "links.txt", "-o", "out"]).unwrap();
        match cli.command {
            Some(Commands::Run { options }) => {
                assert_eq!(options.input, Some(PathBuf::from("links.txt")));
                assert_eq!(options.output, Some(PathBuf::from("out")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_bare_input_shorthand() {
        let cli = Cli::try_parse_from(["mp3batch", "--input", "links.txt", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.input, Some(PathBuf::from("links.txt")));
        assert!(cli.run.output.is_none());
        assert_eq!(cli.verbose, 2);
    }
}
