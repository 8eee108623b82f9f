//! Video metadata record.
//!
//! A [`VideoInfo`] is the full per-video snapshot the crawler persists:
//! identity, timing, duration, descriptive text, keywords, and the
//! thumbnail URL. The one cross-field invariant, `publish_date` never
//! exceeding `last_updated`, is enforced symmetrically from both setters,
//! so it holds after construction and after every successful update.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::RecordError;
use crate::field::{fmt_record, FieldValue, Record};
use crate::json::{check_json_source, check_json_target, parse_timestamp};
use crate::validate::{validate_channel_id, validate_nonempty, validate_not_future};

fn validate_video_id(value: &str) -> Result<(), RecordError> {
    if value.chars().count() != 11 {
        return Err(RecordError::Value {
            field: "video_id",
            expected: "must be an 11-character video id string",
            received: format!("{:?}", value),
        });
    }
    Ok(())
}

fn validate_duration(value: Duration) -> Result<(), RecordError> {
    if value < Duration::zero() {
        return Err(RecordError::Value {
            field: "duration",
            expected: "cannot be negative",
            received: format!("{:?}", value),
        });
    }
    Ok(())
}

fn validate_keywords(words: &[String]) -> Result<(), RecordError> {
    for (index, word) in words.iter().enumerate() {
        if word.is_empty() {
            return Err(RecordError::Value {
                field: "keywords",
                expected: "must contain only non-empty keyword strings",
                received: format!("empty keyword at index {}", index),
            });
        }
    }
    Ok(())
}

fn validate_thumbnail_url(value: &str) -> Result<(), RecordError> {
    if !datatube_check::is_url(value) {
        return Err(RecordError::Value {
            field: "thumbnail_url",
            expected: "must be a valid url string",
            received: format!("{:?}", value),
        });
    }
    Ok(())
}

/// On-disk shape of a persisted video record. `duration` is a plain
/// floating-point seconds count.
#[derive(Serialize, Deserialize)]
struct VideoDoc {
    channel_id: String,
    channel_name: String,
    video_id: String,
    video_title: String,
    publish_date: String,
    last_updated: String,
    duration: f64,
    description: String,
    keywords: Vec<String>,
    thumbnail_url: String,
}

/// Per-video metadata snapshot.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    channel_id: String,
    channel_name: String,
    video_id: String,
    video_title: String,
    publish_date: DateTime<FixedOffset>,
    last_updated: DateTime<FixedOffset>,
    duration: Duration,
    description: String,
    keywords: Vec<String>,
    thumbnail_url: String,
    immutable: bool,
}

/// All construction arguments for a [`VideoInfo`], by name.
///
/// Ten required fields is past the point where a positional constructor
/// stays readable, so construction goes through this struct.
#[derive(Debug, Clone)]
pub struct VideoInfoArgs {
    pub channel_id: String,
    pub channel_name: String,
    pub video_id: String,
    pub video_title: String,
    pub publish_date: DateTime<FixedOffset>,
    pub last_updated: DateTime<FixedOffset>,
    pub duration: Duration,
    pub description: String,
    pub keywords: Vec<String>,
    pub thumbnail_url: String,
}

impl VideoInfo {
    pub const FIELDS: &'static [&'static str] = &[
        "channel_id",
        "channel_name",
        "video_id",
        "video_title",
        "publish_date",
        "last_updated",
        "duration",
        "description",
        "keywords",
        "thumbnail_url",
    ];

    /// Build a fully-formed record, validating every field and the
    /// `publish_date <= last_updated` invariant.
    pub fn new(args: VideoInfoArgs, immutable: bool) -> Result<Self, RecordError> {
        validate_channel_id(&args.channel_id)?;
        validate_nonempty("channel_name", &args.channel_name)?;
        validate_video_id(&args.video_id)?;
        validate_nonempty("video_title", &args.video_title)?;
        validate_not_future("last_updated", args.last_updated)?;
        if args.publish_date > args.last_updated {
            return Err(RecordError::Value {
                field: "publish_date",
                expected: "cannot be greater than `last_updated`",
                received: format!(
                    "{} > {}",
                    args.publish_date.to_rfc3339(),
                    args.last_updated.to_rfc3339()
                ),
            });
        }
        validate_duration(args.duration)?;
        validate_keywords(&args.keywords)?;
        validate_thumbnail_url(&args.thumbnail_url)?;
        Ok(Self {
            channel_id: args.channel_id,
            channel_name: args.channel_name,
            video_id: args.video_id,
            video_title: args.video_title,
            publish_date: args.publish_date,
            last_updated: args.last_updated,
            duration: args.duration,
            description: args.description,
            keywords: args.keywords,
            thumbnail_url: args.thumbnail_url,
            immutable,
        })
    }

    /// Load a record from a `.json` document written by [`Self::save_json`].
    pub fn from_json(path: &Path, immutable: bool) -> Result<Self, RecordError> {
        check_json_source(path)?;
        let doc: VideoDoc = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded video record");
        if doc.duration < 0.0 {
            return Err(RecordError::Value {
                field: "duration",
                expected: "cannot be negative",
                received: doc.duration.to_string(),
            });
        }
        Self::new(
            VideoInfoArgs {
                channel_id: doc.channel_id,
                channel_name: doc.channel_name,
                video_id: doc.video_id,
                video_title: doc.video_title,
                publish_date: parse_timestamp("publish_date", &doc.publish_date)?,
                last_updated: parse_timestamp("last_updated", &doc.last_updated)?,
                duration: Duration::milliseconds((doc.duration * 1000.0).round() as i64),
                description: doc.description,
                keywords: doc.keywords,
                thumbnail_url: doc.thumbnail_url,
            },
            immutable,
        )
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn video_title(&self) -> &str {
        &self.video_title
    }

    pub fn publish_date(&self) -> DateTime<FixedOffset> {
        self.publish_date
    }

    pub fn last_updated(&self) -> DateTime<FixedOffset> {
        self.last_updated
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn set_channel_id(&mut self, channel_id: impl Into<String>) -> Result<(), RecordError> {
        self.guard("channel_id")?;
        let channel_id = channel_id.into();
        validate_channel_id(&channel_id)?;
        self.channel_id = channel_id;
        Ok(())
    }

    pub fn set_channel_name(&mut self, channel_name: impl Into<String>) -> Result<(), RecordError> {
        self.guard("channel_name")?;
        let channel_name = channel_name.into();
        validate_nonempty("channel_name", &channel_name)?;
        self.channel_name = channel_name;
        Ok(())
    }

    pub fn set_video_id(&mut self, video_id: impl Into<String>) -> Result<(), RecordError> {
        self.guard("video_id")?;
        let video_id = video_id.into();
        validate_video_id(&video_id)?;
        self.video_id = video_id;
        Ok(())
    }

    pub fn set_video_title(&mut self, video_title: impl Into<String>) -> Result<(), RecordError> {
        self.guard("video_title")?;
        let video_title = video_title.into();
        validate_nonempty("video_title", &video_title)?;
        self.video_title = video_title;
        Ok(())
    }

    pub fn set_publish_date(
        &mut self,
        publish_date: DateTime<FixedOffset>,
    ) -> Result<(), RecordError> {
        self.guard("publish_date")?;
        if publish_date > self.last_updated {
            return Err(RecordError::Value {
                field: "publish_date",
                expected: "cannot be greater than `last_updated`",
                received: format!(
                    "{} > {}",
                    publish_date.to_rfc3339(),
                    self.last_updated.to_rfc3339()
                ),
            });
        }
        self.publish_date = publish_date;
        Ok(())
    }

    pub fn set_last_updated(
        &mut self,
        last_updated: DateTime<FixedOffset>,
    ) -> Result<(), RecordError> {
        self.guard("last_updated")?;
        validate_not_future("last_updated", last_updated)?;
        if last_updated < self.publish_date {
            return Err(RecordError::Value {
                field: "last_updated",
                expected: "cannot be less than `publish_date`",
                received: format!(
                    "{} < {}",
                    last_updated.to_rfc3339(),
                    self.publish_date.to_rfc3339()
                ),
            });
        }
        self.last_updated = last_updated;
        Ok(())
    }

    pub fn set_duration(&mut self, duration: Duration) -> Result<(), RecordError> {
        self.guard("duration")?;
        validate_duration(duration)?;
        self.duration = duration;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), RecordError> {
        self.guard("description")?;
        self.description = description.into();
        Ok(())
    }

    pub fn set_keywords(&mut self, keywords: Vec<String>) -> Result<(), RecordError> {
        self.guard("keywords")?;
        validate_keywords(&keywords)?;
        self.keywords = keywords;
        Ok(())
    }

    pub fn set_thumbnail_url(&mut self, thumbnail_url: impl Into<String>) -> Result<(), RecordError> {
        self.guard("thumbnail_url")?;
        let thumbnail_url = thumbnail_url.into();
        validate_thumbnail_url(&thumbnail_url)?;
        self.thumbnail_url = thumbnail_url;
        Ok(())
    }

    fn guard(&self, field: &'static str) -> Result<(), RecordError> {
        if self.immutable {
            return Err(RecordError::Immutable {
                record: "VideoInfo",
                field,
            });
        }
        Ok(())
    }

    /// Structural JSON form: flat keys matching the field names,
    /// timestamps as RFC 3339 text, `duration` as seconds.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "channel_id": self.channel_id,
            "channel_name": self.channel_name,
            "video_id": self.video_id,
            "video_title": self.video_title,
            "publish_date": self.publish_date.to_rfc3339(),
            "last_updated": self.last_updated.to_rfc3339(),
            "duration": self.duration.num_milliseconds() as f64 / 1000.0,
            "description": self.description,
            "keywords": self.keywords,
            "thumbnail_url": self.thumbnail_url,
        })
    }

    /// Persist the record as one JSON document, creating parent
    /// directories as needed. The path must end in `.json`.
    pub fn save_json(&self, path: &Path) -> Result<(), RecordError> {
        check_json_target(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&self.to_json())?)?;
        debug!(path = %path.display(), video_id = %self.video_id, "saved video record");
        Ok(())
    }
}

impl Record for VideoInfo {
    fn field_names(&self) -> &'static [&'static str] {
        Self::FIELDS
    }

    fn immutable(&self) -> bool {
        self.immutable
    }

    fn get(&self, key: &str) -> Result<FieldValue, RecordError> {
        match key {
            "channel_id" => Ok(FieldValue::Str(self.channel_id.clone())),
            "channel_name" => Ok(FieldValue::Str(self.channel_name.clone())),
            "video_id" => Ok(FieldValue::Str(self.video_id.clone())),
            "video_title" => Ok(FieldValue::Str(self.video_title.clone())),
            "publish_date" => Ok(FieldValue::Timestamp(self.publish_date)),
            "last_updated" => Ok(FieldValue::Timestamp(self.last_updated)),
            "duration" => Ok(FieldValue::Duration(self.duration)),
            "description" => Ok(FieldValue::Str(self.description.clone())),
            "keywords" => Ok(FieldValue::Keywords(self.keywords.clone())),
            "thumbnail_url" => Ok(FieldValue::Str(self.thumbnail_url.clone())),
            other => Err(RecordError::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: FieldValue) -> Result<(), RecordError> {
        match (key, value) {
            ("channel_id", FieldValue::Str(v)) => self.set_channel_id(v),
            ("channel_name", FieldValue::Str(v)) => self.set_channel_name(v),
            ("video_id", FieldValue::Str(v)) => self.set_video_id(v),
            ("video_title", FieldValue::Str(v)) => self.set_video_title(v),
            ("publish_date", FieldValue::Timestamp(v)) => self.set_publish_date(v),
            ("last_updated", FieldValue::Timestamp(v)) => self.set_last_updated(v),
            ("duration", FieldValue::Duration(v)) => self.set_duration(v),
            ("description", FieldValue::Str(v)) => self.set_description(v),
            ("keywords", FieldValue::Keywords(v)) => self.set_keywords(v),
            ("thumbnail_url", FieldValue::Str(v)) => self.set_thumbnail_url(v),
            (key, value) => match Self::FIELDS.iter().copied().find(|f| *f == key) {
                Some(field) => Err(RecordError::Type {
                    field,
                    expected: expected_kind(field),
                    received: value.type_name(),
                }),
                None => Err(RecordError::UnknownField(key.to_string())),
            },
        }
    }
}

fn expected_kind(field: &'static str) -> &'static str {
    match field {
        "publish_date" | "last_updated" => "must be a timezone-aware timestamp",
        "duration" => "must be a duration",
        "keywords" => "must be a keyword list",
        _ => "must be a string",
    }
}

// Equality is content equality; the lock flag does not participate.
impl PartialEq for VideoInfo {
    fn eq(&self, other: &Self) -> bool {
        self.channel_id == other.channel_id
            && self.channel_name == other.channel_name
            && self.video_id == other.video_id
            && self.video_title == other.video_title
            && self.publish_date == other.publish_date
            && self.last_updated == other.last_updated
            && self.duration == other.duration
            && self.description == other.description
            && self.keywords == other.keywords
            && self.thumbnail_url == other.thumbnail_url
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_args() -> VideoInfoArgs {
        let now = Utc::now().fixed_offset();
        VideoInfoArgs {
            channel_id: "UCuAXFkgsw1L7xaCfnd5JJOw".into(),
            channel_name: "Rick Astley".into(),
            video_id: "dQw4w9WgXcQ".into(),
            video_title: "Never Gonna Give You Up".into(),
            publish_date: now - Duration::days(365),
            last_updated: now - Duration::minutes(1),
            duration: Duration::seconds(212),
            description: String::new(),
            keywords: vec!["rick".into(), "astley".into()],
            thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg".into(),
        }
    }

    #[test]
    fn test_construction_validates_every_field() {
        assert!(VideoInfo::new(sample_args(), false).is_ok());

        let mut bad = sample_args();
        bad.video_id = "short".into();
        assert!(matches!(
            VideoInfo::new(bad, false),
            Err(RecordError::Value { field: "video_id", .. })
        ));

        let mut bad = sample_args();
        bad.duration = Duration::seconds(-1);
        assert!(matches!(
            VideoInfo::new(bad, false),
            Err(RecordError::Value { field: "duration", .. })
        ));

        let mut bad = sample_args();
        bad.thumbnail_url = "not a url".into();
        assert!(matches!(
            VideoInfo::new(bad, false),
            Err(RecordError::Value { field: "thumbnail_url", .. })
        ));
    }

    #[test]
    fn test_empty_keyword_names_offending_index() {
        let mut bad = sample_args();
        bad.keywords = vec!["ok".into(), String::new()];
        let err = VideoInfo::new(bad, false).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_publish_date_never_exceeds_last_updated() {
        let mut bad = sample_args();
        bad.publish_date = bad.last_updated + Duration::seconds(1);
        assert!(VideoInfo::new(bad, false).is_err());

        let mut video = VideoInfo::new(sample_args(), false).unwrap();

        // Moving publish_date past last_updated is rejected from either side
        let too_late = video.last_updated() + Duration::seconds(1);
        assert!(video.set_publish_date(too_late).is_err());

        let too_early = video.publish_date() - Duration::seconds(1);
        assert!(video.set_last_updated(too_early).is_err());

        // A consistent pair of updates goes through
        let new_publish = video.publish_date() + Duration::days(1);
        video.set_publish_date(new_publish).unwrap();
        assert!(video.publish_date() <= video.last_updated());
    }

    #[test]
    fn test_immutable_reassignment_rejected() {
        let mut locked = VideoInfo::new(sample_args(), true).unwrap();
        assert!(matches!(
            locked.set_video_title("Other"),
            Err(RecordError::Immutable { record: "VideoInfo", field: "video_title" })
        ));

        let mut open = VideoInfo::new(sample_args(), false).unwrap();
        open.set_video_title("Other").unwrap();
        assert_eq!(open.video_title(), "Other");
    }

    #[test]
    fn test_mapping_view() {
        let video = VideoInfo::new(sample_args(), false).unwrap();
        assert_eq!(video.len(), 10);
        assert!(video.contains("keywords"));
        assert!(!video.contains("immutable"));
        assert_eq!(
            video.get("video_id").unwrap(),
            FieldValue::Str("dQw4w9WgXcQ".into())
        );

        let names: Vec<_> = video.items().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, VideoInfo::FIELDS);
    }

    #[test]
    fn test_cross_type_content_equality() {
        let args = sample_args();
        let a = VideoInfo::new(args.clone(), false).unwrap();
        let b = VideoInfo::new(args, true).unwrap();
        assert!(a.content_eq(&b));
        assert_eq!(a, b);

        let mut map = std::collections::BTreeMap::new();
        for (key, value) in a.items() {
            map.insert(key.to_string(), value);
        }
        assert!(a.map_eq(&map));

        map.remove("keywords");
        assert!(!a.map_eq(&map));
    }
}
