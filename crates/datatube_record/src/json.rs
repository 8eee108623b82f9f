//! Path and timestamp plumbing for the JSON record format.

use std::path::Path;

use chrono::{DateTime, FixedOffset};

use crate::error::RecordError;

/// A path being read must exist and carry a `.json` extension.
pub(crate) fn check_json_source(path: &Path) -> Result<(), RecordError> {
    if !path.exists() {
        return Err(RecordError::BadPath {
            path: path.to_path_buf(),
            detail: "path does not exist".to_string(),
        });
    }
    check_json_target(path)
}

/// A path being written only needs the `.json` extension.
pub(crate) fn check_json_target(path: &Path) -> Result<(), RecordError> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return Err(RecordError::BadPath {
            path: path.to_path_buf(),
            detail: "path does not point to a .json file".to_string(),
        });
    }
    Ok(())
}

/// Timestamps persist as RFC 3339 text with an explicit offset; anything
/// else (including naive date-times) is rejected.
pub(crate) fn parse_timestamp(
    field: &'static str,
    text: &str,
) -> Result<DateTime<FixedOffset>, RecordError> {
    DateTime::parse_from_rfc3339(text).map_err(|err| RecordError::Value {
        field,
        expected: "must be an RFC 3339 timestamp with a timezone offset",
        received: format!("{:?} ({})", text, err),
    })
}
