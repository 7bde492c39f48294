//! Batch output storage.
//!
//! Batch runs write one ingest result per line to a JSONL file; the reader
//! half loads such files back, skipping lines that fail to parse.

mod jsonl;

pub use jsonl::{JsonlReader, JsonlWriter};

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
