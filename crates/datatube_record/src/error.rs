//! Error types for the record model.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Record error type.
///
/// Every validation failure is raised synchronously at the call that
/// introduced the bad value; a rejected setter or constructor leaves no
/// partially-updated record behind.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("cannot reassign `{field}`: {record} instance is immutable")]
    Immutable {
        record: &'static str,
        field: &'static str,
    },

    #[error("`{field}` {expected} (received value of type: {received})")]
    Type {
        field: &'static str,
        expected: &'static str,
        received: &'static str,
    },

    #[error("`{field}` {expected} (received: {received})")]
    Value {
        field: &'static str,
        expected: &'static str,
        received: String,
    },

    #[error("record has no field named {0:?}")]
    UnknownField(String),

    #[error("record cannot be hashed: instance must be immutable")]
    NotHashable,

    #[error("bad path {path:?}: {detail}")]
    BadPath { path: PathBuf, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, RecordError>;
