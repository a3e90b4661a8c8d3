//! # Mimetic IO
//!
//! I/O and persistence layer for Mimetic runs.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - Serialization helpers for JSON files
//! - A JSONL history of run events and a compressed run archive
//! - rkyv checkpoints of program populations

/// Error types and result aliases for I/O operations
pub mod error;
/// Event history logging and compressed run archives
pub mod history;
/// rkyv population checkpoints
pub mod persistence;
/// Validated serialization helpers for JSON
pub mod serialization;

pub use error::{IoError, Result};
pub use history::{read_history, HistoryLogger, HistoryRecord, RunArchive, LIVE_FILE};
pub use persistence::{load_checkpoint, save_checkpoint, save_checkpoints};
pub use serialization::{from_json, read_json_file, to_json, to_json_pretty, write_json_file};
