//! Semantic dtype tags, cell values, narrowing and coercion.
//!
//! Columns carry one of eight semantic tags. `Object` is the escape
//! hatch: a column whose cells are not uniformly one variant. Narrowing
//! looks at the actual cells and reports the most specific tag; coercion
//! casts cells to the canonical representation for a target tag. Both are
//! table-driven by the tag: there is exactly one narrowing rule and one
//! cast rule per tag, no runtime type dispatch.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset};

use crate::error::StatsError;

/// Semantic column types, in narrowing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Mixed/untyped cells (fallback)
    Object,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Complex number (pair of 64-bit floats)
    Complex,
    /// UTF-8 string
    Str,
    /// Boolean
    Bool,
    /// Timezone-aware instant
    DateTime,
    /// Signed time span
    Duration,
}

impl DType {
    /// All tags, in narrowing priority order.
    pub fn all() -> [DType; 8] {
        [
            DType::Object,
            DType::Int,
            DType::Float,
            DType::Complex,
            DType::Str,
            DType::Bool,
            DType::DateTime,
            DType::Duration,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Object => "object",
            DType::Int => "int",
            DType::Float => "float",
            DType::Complex => "complex",
            DType::Str => "str",
            DType::Bool => "bool",
            DType::DateTime => "datetime",
            DType::Duration => "duration",
        }
    }

    /// Comma-separated supported set, for lookup errors.
    pub fn supported() -> String {
        DType::all()
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "object" => Ok(DType::Object),
            "int" | "integer" => Ok(DType::Int),
            "float" => Ok(DType::Float),
            "complex" => Ok(DType::Complex),
            "str" | "string" => Ok(DType::Str),
            "bool" | "boolean" => Ok(DType::Bool),
            "datetime" => Ok(DType::DateTime),
            "duration" | "timedelta" => Ok(DType::Duration),
            _ => Err(StatsError::UnknownDType {
                received: s.to_string(),
                supported: DType::supported(),
            }),
        }
    }
}

/// A single cell. `Null` is a member of every column dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Str(String),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    Duration(Duration),
}

impl Value {
    /// The tag this cell belongs to; `None` for nulls.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(DType::Int),
            Value::Float(_) => Some(DType::Float),
            Value::Complex { .. } => Some(DType::Complex),
            Value::Str(_) => Some(DType::Str),
            Value::Bool(_) => Some(DType::Bool),
            Value::DateTime(_) => Some(DType::DateTime),
            Value::Duration(_) => Some(DType::Duration),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::DateTime(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Complex { re, im } => {
                if *im < 0.0 {
                    write!(f, "{}{}i", re, im)
                } else {
                    write!(f, "{}+{}i", re, im)
                }
            }
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(v) => write!(f, "{}", v),
            Value::DateTime(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Duration(d) => write!(f, "{}", d.num_milliseconds() as f64 / 1000.0),
        }
    }
}

/// Total ordering over cells, used for row sorting. Nulls sort first;
/// cells of different tags fall back to tag order.
pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.total_cmp(&(*y as f64)),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Duration(x), Value::Duration(y)) => x.cmp(y),
        _ => dtype_rank(a).cmp(&dtype_rank(b)),
    }
}

fn dtype_rank(value: &Value) -> usize {
    match value.dtype() {
        None => 0,
        Some(tag) => 1 + DType::all().iter().position(|d| *d == tag).unwrap_or(0),
    }
}

/// Cast one cell to the canonical representation of `target`.
///
/// Nulls always pass. A cell already carrying the target tag is returned
/// unchanged, so casting is idempotent.
pub fn cast_value(value: &Value, target: DType, column: &str) -> Result<Value, StatsError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.dtype() == Some(target) {
        return Ok(value.clone());
    }
    let fail = || StatsError::Cast {
        column: column.to_string(),
        value: format!("{:?}", value),
        target,
    };
    match target {
        // Casting to object is a declaration change, not a cell change
        DType::Object => Ok(value.clone()),
        DType::Int => match value {
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(v) if v.fract() == 0.0 => Ok(Value::Int(*v as i64)),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
            _ => Err(fail()),
        },
        DType::Float => match value {
            Value::Int(v) => Ok(Value::Float(*v as f64)),
            Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        DType::Complex => match value {
            Value::Int(v) => Ok(Value::Complex {
                re: *v as f64,
                im: 0.0,
            }),
            Value::Float(v) => Ok(Value::Complex { re: *v, im: 0.0 }),
            _ => Err(fail()),
        },
        DType::Str => Ok(Value::Str(value.to_string())),
        DType::Bool => match value {
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Str(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::Str(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(fail()),
        },
        DType::DateTime => match value {
            Value::Str(s) => parse_datetime(s).ok_or_else(fail).map(Value::DateTime),
            _ => Err(fail()),
        },
        DType::Duration => match value {
            Value::Int(secs) => Ok(Value::Duration(Duration::seconds(*secs))),
            Value::Float(secs) => Ok(Value::Duration(Duration::milliseconds(
                (secs * 1000.0).round() as i64,
            ))),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .map(|secs| Value::Duration(Duration::milliseconds((secs * 1000.0).round() as i64)))
                .ok_or_else(fail),
            _ => Err(fail()),
        },
    }
}

/// Parse an offset-carrying datetime from text. RFC 3339 first, then the
/// space-separated form common in exported CSVs.
pub fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%z"))
        .ok()
}
