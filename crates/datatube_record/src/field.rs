//! Generic mapping view over validated records.
//!
//! Each record type declares its fields as an explicit, ordered
//! `&'static [&'static str]` list and answers string-keyed reads and
//! writes through [`FieldValue`]. Everything else (iteration, equality,
//! hashing, rendering) is derived from that declared list, so there is
//! exactly one source of truth per type.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Duration, FixedOffset};

use crate::channel::HtmlBundle;
use crate::error::RecordError;

/// Strings longer than this are elided when rendering a record.
const ELIDE_AT: usize = 30;

/// Value union crossing the record boundary.
///
/// The set of variants is closed: every field of every record type maps to
/// exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Timestamp(DateTime<FixedOffset>),
    Duration(Duration),
    Keywords(Vec<String>),
    Html(HtmlBundle),
}

impl FieldValue {
    /// Human-readable variant name, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Duration(_) => "duration",
            FieldValue::Keywords(_) => "keyword list",
            FieldValue::Html(_) => "html bundle",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "'{}'", elide(s)),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            FieldValue::Duration(d) => {
                write!(f, "{}s", d.num_milliseconds() as f64 / 1000.0)
            }
            FieldValue::Keywords(words) => {
                write!(f, "[")?;
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}'", elide(word))?;
                }
                write!(f, "]")
            }
            // Nested records render recursively
            FieldValue::Html(bundle) => write!(f, "{}", bundle),
        }
    }
}

/// Elide long strings for display.
pub(crate) fn elide(s: &str) -> String {
    if s.chars().count() <= ELIDE_AT {
        return s.to_string();
    }
    let head: String = s.chars().take(ELIDE_AT).collect();
    format!("{}...", head)
}

/// Dictionary-like view over a fixed, ordered set of validated fields.
pub trait Record {
    /// Field names in declaration order. Excludes the immutability flag.
    fn field_names(&self) -> &'static [&'static str];

    /// Whether the record is locked against reassignment.
    fn immutable(&self) -> bool;

    /// Read a field by name. Unknown keys fail with
    /// [`RecordError::UnknownField`].
    fn get(&self, key: &str) -> Result<FieldValue, RecordError>;

    /// Write a field by name. Runs the same guards as the typed setter:
    /// immutability first, then type, then format/range.
    fn set(&mut self, key: &str, value: FieldValue) -> Result<(), RecordError>;

    /// Number of declared fields.
    fn len(&self) -> usize {
        self.field_names().len()
    }

    fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    fn contains(&self, key: &str) -> bool {
        self.field_names().contains(&key)
    }

    /// Field values in declaration order.
    fn values(&self) -> Vec<FieldValue> {
        self.field_names()
            .iter()
            .filter_map(|key| self.get(key).ok())
            .collect()
    }

    /// `(name, value)` pairs in declaration order.
    fn items(&self) -> Vec<(&'static str, FieldValue)> {
        self.field_names()
            .iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }

    /// Content equality against another record, independent of concrete
    /// type and lock state. Length mismatch short-circuits to false.
    fn content_eq(&self, other: &dyn Record) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.items().into_iter().all(|(key, value)| {
            other.get(key).map(|theirs| theirs == value).unwrap_or(false)
        })
    }

    /// Content equality against an equivalent plain mapping.
    fn map_eq(&self, other: &BTreeMap<String, FieldValue>) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.items()
            .into_iter()
            .all(|(key, value)| other.get(key) == Some(&value))
    }

    /// Hash of the ordered `(name, value)` sequence.
    ///
    /// Only defined for locked records; a mutable record fails with
    /// [`RecordError::NotHashable`].
    fn content_hash(&self) -> Result<u64, RecordError> {
        if !self.immutable() {
            return Err(RecordError::NotHashable);
        }
        let mut hasher = DefaultHasher::new();
        for (key, value) in self.items() {
            key.hash(&mut hasher);
            format!("{:?}", value).hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}

/// Render a record as `{'key': value, ...}` over its declared fields.
pub(crate) fn fmt_record(record: &dyn Record, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in record.items().into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "'{}': {}", key, value)?;
    }
    write!(f, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elide_short_string_unchanged() {
        assert_eq!(elide("hello"), "hello");
    }

    #[test]
    fn test_elide_long_string_truncated() {
        let long = "x".repeat(100);
        let shown = elide(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), ELIDE_AT + 3);
    }

    #[test]
    fn test_field_value_display() {
        let value = FieldValue::Str("short".into());
        assert_eq!(value.to_string(), "'short'");

        let keywords = FieldValue::Keywords(vec!["a".into(), "b".into()]);
        assert_eq!(keywords.to_string(), "['a', 'b']");
    }
}
