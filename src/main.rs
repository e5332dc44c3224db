// Covenant - constitutional critique and revision for model answers
// Main entry point

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use covenant::cli::{principles_command, run_command, Cli, Command, RunOptions};
use covenant::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.log_json, level);

    match cli.command {
        Command::Run {
            prompt,
            file,
            no_stream,
            json,
            no_transcript,
        } => {
            run_command(
                cli.config.as_deref(),
                RunOptions {
                    prompt,
                    file,
                    no_stream,
                    json,
                    no_transcript,
                },
            )
            .await
        }
        Command::Principles => principles_command(cli.config.as_deref()),
    }
}
