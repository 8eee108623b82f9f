//! Error types for the statistics store.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::dtype::DType;

/// Violations of the frame's own shape invariants (equal column lengths,
/// unique names, known columns).
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("column {name:?} has {len} values, expected {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("duplicate column name: {0:?}")]
    DuplicateColumn(String),

    #[error("no column named {0:?}")]
    UnknownColumn(String),

    #[error("row has {len} values, expected {expected}")]
    RowArity { len: usize, expected: usize },
}

/// Stats error type.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("data has unexpected columns (missing: {missing:?}, extra: {extra:?})")]
    ColumnMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("column {column:?} must contain {expected} data (narrowed to: {found}, head: {head:?})")]
    ColumnType {
        column: String,
        expected: DType,
        found: DType,
        head: Vec<String>,
    },

    #[error("bad video id: {0:?}")]
    BadVideoId(String),

    #[error("timestamp is in the future: {timestamp} > {now}")]
    FutureTimestamp { timestamp: String, now: String },

    #[error("duplicate row (video_id: {video_id:?}, timestamp: {timestamp})")]
    DuplicateRow {
        video_id: String,
        timestamp: String,
    },

    #[error("`{field}` {expected} (received: {received})")]
    Value {
        field: &'static str,
        expected: &'static str,
        received: String,
    },

    #[error("coerce_dtypes requires at least one column spec (supported dtypes: {supported})")]
    EmptySpec { supported: String },

    #[error("dtype not recognized: {received:?} (supported: {supported})")]
    UnknownDType { received: String, supported: String },

    #[error("column {column:?}: cannot cast {value} to {target}")]
    Cast {
        column: String,
        value: String,
        target: DType,
    },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("bad path {path:?}: {detail}")]
    BadPath { path: PathBuf, detail: String },

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, StatsError>;
