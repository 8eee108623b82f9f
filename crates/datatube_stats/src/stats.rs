//! Schema-locked per-video statistics store.
//!
//! `Stats` keeps one row per (`video_id`, `timestamp`) observation with a
//! fixed six-column schema. Data enters through three doors (the empty
//! constructor, a bulk frame, or a CSV file) and every door ends in the
//! same validation pipeline: exact column set, dtype narrowing, coercion
//! to canonical dtypes, canonical column order, dropped incomplete rows,
//! deduplication, and a (`video_id`, `timestamp`) sort.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use datatube_check::is_video_id;

use crate::dtype::{parse_datetime, DType, Value};
use crate::error::{Result, StatsError};
use crate::frame::{check_dtype, coerce_dtypes, Column, Frame};

/// Canonical schema: column names and dtypes, in canonical order.
pub const STATS_COLUMNS: &[(&str, DType)] = &[
    ("video_id", DType::Str),
    ("timestamp", DType::DateTime),
    ("views", DType::Int),
    ("rating", DType::Float),
    ("likes", DType::Int),
    ("dislikes", DType::Int),
];

const SORT_KEYS: &[&str] = &["video_id", "timestamp"];

/// Options for bulk construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsOptions {
    /// Time-based interpolation of missing values. Unimplemented;
    /// requesting it fails fast.
    pub interpolate: bool,
    /// Reject bulk rows whose timestamp is in the future. Off by
    /// default: the bulk path historically only logs these, while
    /// `add_row` always rejects them.
    pub reject_future_timestamps: bool,
}

/// The most recent observation for one video.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<FixedOffset>,
    /// Bulk-loaded data may lack a view count for a row.
    pub views: Option<i64>,
    pub rating: Option<f64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
}

/// Time-series view/rating/like/dislike samples, one row per
/// (`video_id`, `timestamp`), kept sorted by that pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    data: Frame,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// An empty store with the canonical columns at canonical dtypes.
    pub fn new() -> Self {
        Self {
            data: Frame::empty(STATS_COLUMNS),
        }
    }

    /// Build a store from an existing frame, running the full validation
    /// pipeline.
    pub fn from_frame(frame: Frame, options: StatsOptions) -> Result<Self> {
        let expected: BTreeSet<&str> = STATS_COLUMNS.iter().map(|(name, _)| *name).collect();
        let got: BTreeSet<&str> = frame.column_names().into_iter().collect();
        if expected != got {
            return Err(StatsError::ColumnMismatch {
                missing: expected.difference(&got).map(|s| s.to_string()).collect(),
                extra: got.difference(&expected).map(|s| s.to_string()).collect(),
            });
        }

        for (name, dtype) in STATS_COLUMNS {
            if !check_dtype(&frame, name, &[*dtype])? {
                let column = frame.column(name)?;
                return Err(StatsError::ColumnType {
                    column: name.to_string(),
                    expected: *dtype,
                    found: column.narrow(),
                    head: column.values.iter().take(5).map(|v| format!("{:?}", v)).collect(),
                });
            }
        }

        let coerced = coerce_dtypes(&frame, STATS_COLUMNS)?;
        let order: Vec<&str> = STATS_COLUMNS.iter().map(|(name, _)| *name).collect();
        let mut data = coerced.select(&order)?;

        // Rows without an id or timestamp carry no usable observation
        let keep = {
            let ids = &data.column("video_id")?.values;
            let stamps = &data.column("timestamp")?.values;
            let mut keep: Vec<bool> = Vec::with_capacity(data.num_rows());
            for row in 0..data.num_rows() {
                keep.push(!ids[row].is_null() && !stamps[row].is_null());
            }
            keep
        };
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            debug!(dropped, "dropping rows missing video_id or timestamp");
        }
        data.retain_rows(|row| keep[row]);

        // First occurrence of each (video_id, timestamp) pair wins
        let keep = {
            let ids = &data.column("video_id")?.values;
            let stamps = &data.column("timestamp")?.values;
            let mut seen: HashSet<(String, Option<DateTime<FixedOffset>>)> = HashSet::new();
            let mut keep: Vec<bool> = Vec::with_capacity(data.num_rows());
            for row in 0..data.num_rows() {
                let id = ids[row].as_str().unwrap_or_default().to_string();
                keep.push(seen.insert((id, stamps[row].as_datetime())));
            }
            keep
        };
        data.retain_rows(|row| keep[row]);

        let now = Utc::now();
        for row in 0..data.num_rows() {
            if let Some(id) = data.cell("video_id", row)?.as_str() {
                if !is_video_id(id) {
                    return Err(StatsError::BadVideoId(id.to_string()));
                }
            }
            if let Some(ts) = data.cell("timestamp", row)?.as_datetime() {
                if ts > now {
                    if options.reject_future_timestamps {
                        return Err(StatsError::FutureTimestamp {
                            timestamp: ts.to_rfc3339(),
                            now: now.to_rfc3339(),
                        });
                    }
                    warn!(timestamp = %ts.to_rfc3339(), "timestamp is in the future");
                }
            }
        }

        if options.interpolate {
            return Err(StatsError::NotImplemented(
                "time-based interpolation of missing values",
            ));
        }

        data.sort_rows(SORT_KEYS)?;
        debug!(rows = data.num_rows(), "built stats store from frame");
        Ok(Self { data })
    }

    /// Load a store from a `.csv` file written by [`Self::to_csv`],
    /// routing through [`Self::from_frame`] so every construction
    /// invariant applies.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StatsError::BadPath {
                path: path.to_path_buf(),
                detail: "path does not exist".to_string(),
            });
        }
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(StatsError::BadPath {
                path: path.to_path_buf(),
                detail: "path does not point to a .csv file".to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let dtypes: Vec<DType> = headers
            .iter()
            .map(|name| {
                STATS_COLUMNS
                    .iter()
                    .find(|(col, _)| col == name)
                    .map(|(_, dtype)| *dtype)
                    // Unknown columns are parsed as text; from_frame
                    // reports them in its column-set error
                    .unwrap_or(DType::Str)
            })
            .collect();

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (idx, field) in record.iter().enumerate() {
                if idx >= columns.len() {
                    continue;
                }
                columns[idx].push(parse_csv_field(&headers[idx], dtypes[idx], field)?);
            }
        }

        let frame = Frame::new(
            headers
                .into_iter()
                .zip(dtypes)
                .zip(columns)
                .map(|((name, dtype), values)| Column::new(name, dtype, values))
                .collect(),
        )?;
        debug!(path = %path.display(), rows = frame.num_rows(), "loaded stats csv");
        Self::from_frame(frame, StatsOptions::default())
    }

    /// Defensive copy of the underlying frame.
    pub fn data(&self) -> Frame {
        self.data.clone()
    }

    pub fn len(&self) -> usize {
        self.data.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The latest observation per video: for each `video_id`, the row
    /// with the maximum `timestamp`.
    pub fn most_recent(&self) -> Result<BTreeMap<String, Sample>> {
        let mut winners: BTreeMap<String, (DateTime<FixedOffset>, usize)> = BTreeMap::new();
        for row in 0..self.data.num_rows() {
            let Some(id) = self.data.cell("video_id", row)?.as_str() else {
                continue;
            };
            let Some(ts) = self.data.cell("timestamp", row)?.as_datetime() else {
                continue;
            };
            match winners.get(id) {
                Some((best, _)) if *best >= ts => {}
                _ => {
                    winners.insert(id.to_string(), (ts, row));
                }
            }
        }

        let mut result = BTreeMap::new();
        for (id, (ts, row)) in winners {
            result.insert(
                id,
                Sample {
                    timestamp: ts,
                    views: self.data.cell("views", row)?.as_int(),
                    rating: self.data.cell("rating", row)?.as_float(),
                    likes: self.data.cell("likes", row)?.as_int(),
                    dislikes: self.data.cell("dislikes", row)?.as_int(),
                },
            );
        }
        Ok(result)
    }

    /// Append one observation.
    ///
    /// Every argument is validated before the store is touched; a
    /// rejected call leaves the row set unchanged. When `rating` is
    /// omitted but both `likes` and `dislikes` are present (and not both
    /// zero), it is derived as `5 * likes / (likes + dislikes)`.
    pub fn add_row(
        &mut self,
        video_id: &str,
        timestamp: DateTime<FixedOffset>,
        views: i64,
        rating: Option<f64>,
        likes: Option<i64>,
        dislikes: Option<i64>,
    ) -> Result<()> {
        if !is_video_id(video_id) {
            return Err(StatsError::BadVideoId(video_id.to_string()));
        }
        let now = Utc::now();
        if timestamp > now {
            return Err(StatsError::FutureTimestamp {
                timestamp: timestamp.to_rfc3339(),
                now: now.to_rfc3339(),
            });
        }
        if views < 0 {
            return Err(StatsError::Value {
                field: "views",
                expected: "must be a non-negative integer",
                received: views.to_string(),
            });
        }
        if let Some(rating) = rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(StatsError::Value {
                    field: "rating",
                    expected: "must be a numeric between 0 and 5",
                    received: rating.to_string(),
                });
            }
        }
        for (field, count) in [("likes", likes), ("dislikes", dislikes)] {
            if let Some(count) = count {
                if count < 0 {
                    return Err(StatsError::Value {
                        field,
                        expected: "must be a non-negative integer",
                        received: count.to_string(),
                    });
                }
            }
        }

        let ids = &self.data.column("video_id")?.values;
        let stamps = &self.data.column("timestamp")?.values;
        for row in 0..self.data.num_rows() {
            if ids[row].as_str() == Some(video_id)
                && stamps[row].as_datetime() == Some(timestamp)
            {
                return Err(StatsError::DuplicateRow {
                    video_id: video_id.to_string(),
                    timestamp: timestamp.to_rfc3339(),
                });
            }
        }

        let rating = match (rating, likes, dislikes) {
            (None, Some(likes), Some(dislikes)) if likes + dislikes > 0 => {
                Some(5.0 * likes as f64 / (likes + dislikes) as f64)
            }
            (rating, _, _) => rating,
        };

        self.data.push_row(vec![
            Value::Str(video_id.to_string()),
            Value::DateTime(timestamp),
            Value::Int(views),
            rating.map(Value::Float).unwrap_or(Value::Null),
            likes.map(Value::Int).unwrap_or(Value::Null),
            dislikes.map(Value::Int).unwrap_or(Value::Null),
        ])?;
        self.data.sort_rows(SORT_KEYS)?;
        debug!(video_id, rows = self.data.num_rows(), "added stats row");
        Ok(())
    }

    /// Write the store (or the subset matching `video_ids`) as CSV:
    /// canonical header order, RFC 3339 timestamps, no index column.
    pub fn to_csv(&self, path: &Path, video_ids: &[&str]) -> Result<()> {
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(StatsError::BadPath {
                path: path.to_path_buf(),
                detail: "path does not end with .csv extension".to_string(),
            });
        }
        let present = &self.data.column("video_id")?.values;
        for id in video_ids {
            if !is_video_id(id) {
                return Err(StatsError::BadVideoId(id.to_string()));
            }
            if !present.iter().any(|v| v.as_str() == Some(*id)) {
                return Err(StatsError::Value {
                    field: "video_ids",
                    expected: "must name a video id present in the store",
                    received: format!("{:?}", id),
                });
            }
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(STATS_COLUMNS.iter().map(|(name, _)| *name))?;
        let mut written = 0usize;
        for row in 0..self.data.num_rows() {
            if !video_ids.is_empty() {
                let id = self.data.cell("video_id", row)?.as_str().unwrap_or_default();
                if !video_ids.contains(&id) {
                    continue;
                }
            }
            let record: Vec<String> = self
                .data
                .columns()
                .iter()
                .map(|column| column.values[row].to_string())
                .collect();
            writer.write_record(&record)?;
            written += 1;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = written, "wrote stats csv");
        Ok(())
    }

    /// Load per-video stats from the SQL backend. Unimplemented.
    pub fn from_sql(_video_ids: &[&str]) -> Result<Self> {
        Err(StatsError::NotImplemented("SQL backend"))
    }

    /// Flush new rows to the SQL backend. Unimplemented.
    pub fn to_sql(&self) -> Result<()> {
        Err(StatsError::NotImplemented("SQL backend"))
    }

    /// Merge another store's rows into a new store. Unimplemented.
    pub fn merge(&self, _other: &Stats) -> Result<Stats> {
        Err(StatsError::NotImplemented("store merge"))
    }
}

fn parse_csv_field(column: &str, dtype: DType, field: &str) -> Result<Value> {
    if field.is_empty() {
        return Ok(Value::Null);
    }
    let fail = || StatsError::Cast {
        column: column.to_string(),
        value: field.to_string(),
        target: dtype,
    };
    match dtype {
        DType::Str | DType::Object => Ok(Value::Str(field.to_string())),
        DType::Int => field.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
        DType::Float => field.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
        DType::DateTime => parse_datetime(field).map(Value::DateTime).ok_or_else(fail),
        // Bool/Complex/Duration never appear in the canonical schema
        _ => Ok(Value::Str(field.to_string())),
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}
