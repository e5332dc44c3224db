// Transcript logging
//
// Appends each completed run trail to a JSONL file so critique/revision
// history can be reviewed after the session ends.

pub mod transcript_logger;

pub use transcript_logger::{read_transcripts, TranscriptEntry, TranscriptLogger};
