// Integration tests for config loading and transcript persistence

use anyhow::Result;
use std::fs;
use tempfile::TempDir;

use covenant::config::load_config;
use covenant::constitution::{CritiqueOutcome, CritiqueVerdict, RunTrail};
use covenant::logging::{read_transcripts, TranscriptLogger};

fn sample_trail() -> RunTrail {
    RunTrail {
        prompt: "Summarize: patient has X".to_string(),
        initial_answer: "The patient has X.".to_string(),
        outcomes: vec![CritiqueOutcome {
            principle_name: "Honesty Principle 01".to_string(),
            critique_text: "Overstated. Critique needed.".to_string(),
            verdict: CritiqueVerdict::Needed,
            needs_revision: true,
            revision_text: Some("The patient may have X.".to_string()),
            answer_after: "The patient may have X.".to_string(),
            error: None,
        }],
        final_answer: "The patient may have X.".to_string(),
        cancelled: false,
    }
}

#[test]
fn test_load_config_from_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [[providers]]
        type = "claude"
        api_key = "sk-ant-test"
        model = "claude-3-5-sonnet-latest"

        [prompts]
        critique = "Q: {input_prompt}\nA: {output_from_model}\nCritique: {critique_request}"

        [[principles]]
        name = "Plain language"
        critique_request = "Is it free of jargon?"
        revision_request = "Rewrite without jargon."

        [[principles]]
        name = "Cites sources"
        critique_request = "Does it cite sources?"
        "#,
    )?;

    let config = load_config(Some(&path))?;
    let registry = config.registry()?;

    assert_eq!(registry.names(), vec!["Plain language", "Cites sources"]);
    assert!(registry.get("Plain language").unwrap().can_revise());
    assert!(!registry.get("Cites sources").unwrap().can_revise());
    assert!(config.prompts.critique.starts_with("Q: {input_prompt}"));
    assert_eq!(config.primary_provider().unwrap().model(), Some("claude-3-5-sonnet-latest"));
    Ok(())
}

#[test]
fn test_template_missing_placeholder_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [[providers]]
        type = "openai"
        api_key = "sk-test"

        [prompts]
        critique = "No placeholders at all"
        "#,
    )?;

    assert!(load_config(Some(&path)).is_err());
    Ok(())
}

#[test]
fn test_duplicate_principles_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [[providers]]
        type = "claude"
        api_key = "sk-ant-test"

        [[principles]]
        name = "Same"
        critique_request = "one"

        [[principles]]
        name = "Same"
        critique_request = "two"
        "#,
    )?;

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{:#}", err).contains("Same"));
    Ok(())
}

#[test]
fn test_transcripts_round_trip_through_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("transcripts.jsonl");

    let mut logger = TranscriptLogger::new(path.clone())?;
    let first = logger.log_run(&sample_trail(), "claude (test)")?;
    let second = logger.log_run(&sample_trail(), "claude (test)")?;
    drop(logger);

    let entries = read_transcripts(&path)?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, first);
    assert_eq!(entries[1].id, second);
    assert_eq!(entries[0].trail, sample_trail());
    assert_eq!(entries[0].model, "claude (test)");
    Ok(())
}
