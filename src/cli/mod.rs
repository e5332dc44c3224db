// Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
pub mod render;

pub use commands::{principles_command, read_prompt, run_command, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "covenant")]
#[command(about = "Critique and revise model answers against a list of principles", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.covenant/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a prompt through the critique/revision loop
    Run {
        /// Prompt text; read from --file or stdin when omitted
        prompt: Option<String>,

        /// Read the prompt from a file
        #[arg(short, long, conflicts_with = "prompt")]
        file: Option<PathBuf>,

        /// Request whole responses instead of streaming
        #[arg(long)]
        no_stream: bool,

        /// Print the run trail as JSON instead of progressive text
        #[arg(long)]
        json: bool,

        /// Skip writing the run to the transcript log
        #[arg(long)]
        no_transcript: bool,
    },

    /// List the principles a run would evaluate, in order
    Principles,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::parse_from([
            "covenant",
            "--verbose",
            "run",
            "What is 2+2?",
            "--json",
            "--no-stream",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Run {
                prompt,
                json,
                no_stream,
                no_transcript,
                file,
            } => {
                assert_eq!(prompt.as_deref(), Some("What is 2+2?"));
                assert!(json);
                assert!(no_stream);
                assert!(!no_transcript);
                assert!(file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_prompt_and_file_conflict() {
        let result = Cli::try_parse_from(["covenant", "run", "hi", "--file", "p.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["covenant", "principles", "--config", "/tmp/c.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Principles));
    }
}
