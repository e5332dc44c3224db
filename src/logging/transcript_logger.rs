// Transcript logger: one JSON line per constitutional run

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constitution::RunTrail;

/// A single logged run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unique ID for this entry
    pub id: String,

    /// When the run finished
    pub timestamp: DateTime<Utc>,

    /// Which model produced the answers (e.g. "claude (claude-3-5-haiku-latest)")
    pub model: String,

    pub trail: RunTrail,
}

impl TranscriptEntry {
    pub fn new(trail: RunTrail, model: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model: model.into(),
            trail,
        }
    }
}

/// Buffered JSONL writer
pub struct TranscriptLogger {
    log_path: PathBuf,
    buffer: Vec<TranscriptEntry>,
    flush_threshold: usize,
}

impl TranscriptLogger {
    /// Create a new logger, creating the parent directory if needed
    pub fn new(log_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create transcript directory")?;
        }

        Ok(Self {
            log_path,
            buffer: Vec::new(),
            flush_threshold: 10,
        })
    }

    /// Flush after every `threshold` entries (minimum 1)
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold.max(1);
        self
    }

    /// Buffer a completed run; returns the entry id
    pub fn log_run(&mut self, trail: &RunTrail, model: &str) -> Result<String> {
        let entry = TranscriptEntry::new(trail.clone(), model);
        let id = entry.id.clone();
        self.buffer.push(entry);

        if self.buffer.len() >= self.flush_threshold {
            self.flush()?;
        }

        Ok(id)
    }

    /// Write buffered entries to disk
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!("Flushing {} transcript entries to disk", self.buffer.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open {}", self.log_path.display()))?;

        for entry in &self.buffer {
            let json = serde_json::to_string(entry).context("Failed to serialize transcript entry")?;
            writeln!(file, "{}", json).context("Failed to write transcript entry")?;
        }

        self.buffer.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl Drop for TranscriptLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush transcripts on drop: {:#}", e);
        }
    }
}

/// Read every entry from a transcript file, skipping blank lines
pub fn read_transcripts(path: &Path) -> Result<Vec<TranscriptEntry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str::<TranscriptEntry>(line)
                .with_context(|| format!("Failed to parse transcript entry {}", idx + 1))
        })
        .collect()
}
