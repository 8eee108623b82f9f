//! Field validators shared by the concrete record types.
//!
//! Each validator enforces the format/range guard only; the immutability
//! and type guards run before these in every setter.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::RecordError;

pub(crate) fn validate_channel_id(value: &str) -> Result<(), RecordError> {
    if !datatube_check::is_channel_id(value) {
        return Err(RecordError::Value {
            field: "channel_id",
            expected: "must be a 24-character external id string starting with 'UC'",
            received: format!("{:?}", value),
        });
    }
    Ok(())
}

pub(crate) fn validate_nonempty(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.is_empty() {
        return Err(RecordError::Value {
            field,
            expected: "must be a non-empty string",
            received: format!("{:?}", value),
        });
    }
    Ok(())
}

/// Timestamps recording an observation must not be in the future.
/// Comparison is made in UTC regardless of the value's own offset.
pub(crate) fn validate_not_future(
    field: &'static str,
    value: DateTime<FixedOffset>,
) -> Result<(), RecordError> {
    let now = Utc::now();
    if value > now {
        return Err(RecordError::Value {
            field,
            expected: "must not be in the future",
            received: format!("{} > {}", value.to_rfc3339(), now.to_rfc3339()),
        });
    }
    Ok(())
}
