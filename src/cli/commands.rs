// Subcommand handlers

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::render;
use crate::config::{load_config, Config};
use crate::constitution::{CritiqueEngine, ModelInvoker, RunTrail, TrailRecorder};
use crate::invoker::ProviderInvoker;
use crate::logging::TranscriptLogger;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub prompt: Option<String>,
    pub file: Option<PathBuf>,
    pub no_stream: bool,
    pub json: bool,
    pub no_transcript: bool,
}

/// Prompt from the argument, else the file, else stdin. Blank is an error.
pub fn read_prompt(prompt: Option<String>, file: Option<&Path>) -> Result<String> {
    let text = match (prompt, file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read prompt from stdin")?;
            buf
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        bail!("Prompt is empty");
    }
    Ok(text)
}

pub async fn run_command(config_path: Option<&Path>, options: RunOptions) -> Result<()> {
    let config = load_config(config_path)?;
    let prompt = read_prompt(options.prompt.clone(), options.file.as_deref())?;

    let mut invoker = ProviderInvoker::from_config(&config)?;
    if options.no_stream {
        invoker = invoker.with_streaming(false);
    }
    let model_label = invoker.model_label();
    info!(model = %model_label, "Starting constitutional run");

    let invoker: Arc<dyn ModelInvoker> = Arc::new(invoker);
    let trail = execute_run(&config, &prompt, invoker, options.json).await?;

    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&trail).context("Failed to serialize run trail")?
        );
    } else {
        render::render_summary(&trail);
    }

    if config.logging.transcripts_enabled && !options.no_transcript {
        if let Err(e) = write_transcript(&config, &trail, &model_label) {
            warn!("Failed to write transcript: {:#}", e);
        }
    }

    Ok(())
}

/// Spawn the engine and drain its events, cancelling on Ctrl-C.
async fn execute_run(
    config: &Config,
    prompt: &str,
    invoker: Arc<dyn ModelInvoker>,
    quiet: bool,
) -> Result<RunTrail> {
    let registry = Arc::new(config.registry()?);
    let engine = CritiqueEngine::new(config.prompts.clone());
    let mut handle = engine.spawn(prompt, registry, invoker);
    let cancel = handle.cancellation_token();

    let mut recorder = TrailRecorder::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelling = false;

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(event) => {
                    recorder.observe(&event);
                    if !quiet {
                        render::render_event(&event);
                    }
                }
                None => break,
            },
            _ = &mut ctrl_c, if !cancelling => {
                eprintln!("Cancelling after the current model call...");
                cancel.cancel();
                cancelling = true;
            }
        }
    }

    let trail = handle.join().await?;
    debug!("{}", recorder.diagnostic_log());
    Ok(trail)
}

fn write_transcript(config: &Config, trail: &RunTrail, model: &str) -> Result<()> {
    let path = config.logging.resolved_transcript_path()?;
    let mut logger = TranscriptLogger::new(path)?;
    let id = logger.log_run(trail, model)?;
    logger.flush()?;
    debug!(%id, path = %logger.path().display(), "Transcript written");
    Ok(())
}

pub fn principles_command(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = config.registry()?;
    print!("{}", render::format_registry(&registry));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_prompt_prefers_argument() {
        let prompt = read_prompt(Some("  hello \n".to_string()), None).unwrap();
        assert_eq!(prompt, "hello");
    }

    #[test]
    fn test_read_prompt_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "What is 2+2?").unwrap();

        let prompt = read_prompt(None, Some(file.path())).unwrap();
        assert_eq!(prompt, "What is 2+2?");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert!(read_prompt(Some("   ".to_string()), None).is_err());
    }

    #[test]
    fn test_missing_prompt_file() {
        assert!(read_prompt(None, Some(Path::new("/nonexistent/prompt.txt"))).is_err());
    }
}
