// Project-wide constants
//
// Import via `use crate::config::constants::*;`.

/// Directory under `$HOME` holding config and transcripts.
pub const CONFIG_DIR_NAME: &str = ".covenant";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const TRANSCRIPT_FILE_NAME: &str = "transcripts.jsonl";

/// Low-variance sampling so critiques stay on-marker.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_P: f32 = 0.2;
pub const DEFAULT_TOP_K: u32 = 100;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Stops the model from writing the next human turn itself.
pub const DEFAULT_STOP_SEQUENCE: &str = "\n\nHuman:";

/// Per-call timeout for one model invocation, including stream reassembly.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
