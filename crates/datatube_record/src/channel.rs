//! Channel metadata record.
//!
//! A [`ChannelInfo`] holds the channel's identity, the time it was last
//! checked for updates, and the raw HTML captured for each of its tabs
//! (an owned [`HtmlBundle`]). Both types validate on construction and on
//! every setter; a locked record refuses reassignment outright.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::RecordError;
use crate::field::{fmt_record, FieldValue, Record};
use crate::json::{check_json_source, check_json_target, parse_timestamp};
use crate::validate::{validate_channel_id, validate_nonempty, validate_not_future};

/// Raw HTML captured from the four public tabs of a channel page.
///
/// Every field accepts any string, including empty (a tab may simply not
/// exist for a given channel). The bundle carries its own lock flag, but
/// when assigned into a [`ChannelInfo`] the flag is overwritten to match
/// the owner's.
#[derive(Debug, Clone)]
pub struct HtmlBundle {
    about: String,
    community: String,
    featured_channels: String,
    videos: String,
    immutable: bool,
}

impl HtmlBundle {
    pub const FIELDS: &'static [&'static str] =
        &["about", "community", "featured_channels", "videos"];

    pub fn new(
        about: impl Into<String>,
        community: impl Into<String>,
        featured_channels: impl Into<String>,
        videos: impl Into<String>,
        immutable: bool,
    ) -> Self {
        Self {
            about: about.into(),
            community: community.into(),
            featured_channels: featured_channels.into(),
            videos: videos.into(),
            immutable,
        }
    }

    pub fn about(&self) -> &str {
        &self.about
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn featured_channels(&self) -> &str {
        &self.featured_channels
    }

    pub fn videos(&self) -> &str {
        &self.videos
    }

    pub fn set_about(&mut self, html: impl Into<String>) -> Result<(), RecordError> {
        self.guard("about")?;
        self.about = html.into();
        Ok(())
    }

    pub fn set_community(&mut self, html: impl Into<String>) -> Result<(), RecordError> {
        self.guard("community")?;
        self.community = html.into();
        Ok(())
    }

    pub fn set_featured_channels(&mut self, html: impl Into<String>) -> Result<(), RecordError> {
        self.guard("featured_channels")?;
        self.featured_channels = html.into();
        Ok(())
    }

    pub fn set_videos(&mut self, html: impl Into<String>) -> Result<(), RecordError> {
        self.guard("videos")?;
        self.videos = html.into();
        Ok(())
    }

    fn guard(&self, field: &'static str) -> Result<(), RecordError> {
        if self.immutable {
            return Err(RecordError::Immutable {
                record: "HtmlBundle",
                field,
            });
        }
        Ok(())
    }

    /// Owner records force the bundle's lock state to match their own.
    pub(crate) fn force_immutable(&mut self, immutable: bool) {
        self.immutable = immutable;
    }
}

impl Record for HtmlBundle {
    fn field_names(&self) -> &'static [&'static str] {
        Self::FIELDS
    }

    fn immutable(&self) -> bool {
        self.immutable
    }

    fn get(&self, key: &str) -> Result<FieldValue, RecordError> {
        match key {
            "about" => Ok(FieldValue::Str(self.about.clone())),
            "community" => Ok(FieldValue::Str(self.community.clone())),
            "featured_channels" => Ok(FieldValue::Str(self.featured_channels.clone())),
            "videos" => Ok(FieldValue::Str(self.videos.clone())),
            other => Err(RecordError::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: FieldValue) -> Result<(), RecordError> {
        let Some(field) = Self::FIELDS.iter().copied().find(|f| *f == key) else {
            return Err(RecordError::UnknownField(key.to_string()));
        };
        let FieldValue::Str(html) = value else {
            return Err(RecordError::Type {
                field,
                expected: "must be a string",
                received: value.type_name(),
            });
        };
        match field {
            "about" => self.set_about(html),
            "community" => self.set_community(html),
            "featured_channels" => self.set_featured_channels(html),
            _ => self.set_videos(html),
        }
    }
}

// Equality is content equality; the lock flag does not participate.
impl PartialEq for HtmlBundle {
    fn eq(&self, other: &Self) -> bool {
        self.about == other.about
            && self.community == other.community
            && self.featured_channels == other.featured_channels
            && self.videos == other.videos
    }
}

impl TryFrom<BTreeMap<String, String>> for HtmlBundle {
    type Error = RecordError;

    /// Convert an equivalent plain mapping. The key set must be exactly
    /// the bundle's four field names.
    fn try_from(mut map: BTreeMap<String, String>) -> Result<Self, RecordError> {
        let mut take = |key: &'static str| {
            map.remove(key).ok_or(RecordError::Value {
                field: "html",
                expected: "must be an HtmlBundle or an equivalent plain mapping",
                received: format!("mapping missing key {:?}", key),
            })
        };
        let bundle = Self::new(take("about")?, take("community")?, take("featured_channels")?, take("videos")?, false);
        if let Some(extra) = map.into_keys().next() {
            return Err(RecordError::Value {
                field: "html",
                expected: "must be an HtmlBundle or an equivalent plain mapping",
                received: format!("mapping has extra key {:?}", extra),
            });
        }
        Ok(bundle)
    }
}

impl fmt::Display for HtmlBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(self, f)
    }
}

/// On-disk shape of a persisted channel record.
#[derive(Serialize, Deserialize)]
struct ChannelDoc {
    channel_id: String,
    channel_name: String,
    last_updated: String,
    html: HtmlDoc,
}

#[derive(Serialize, Deserialize)]
struct HtmlDoc {
    about: String,
    community: String,
    featured_channels: String,
    videos: String,
}

/// Channel identity plus the raw HTML snapshot taken at `last_updated`.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    channel_id: String,
    channel_name: String,
    last_updated: DateTime<FixedOffset>,
    html: HtmlBundle,
    immutable: bool,
}

impl ChannelInfo {
    pub const FIELDS: &'static [&'static str] =
        &["channel_id", "channel_name", "last_updated", "html"];

    /// Build a fully-formed record. Every field is validated; the html
    /// bundle's lock flag is overwritten to match `immutable`.
    pub fn new(
        channel_id: impl Into<String>,
        channel_name: impl Into<String>,
        last_updated: DateTime<FixedOffset>,
        html: HtmlBundle,
        immutable: bool,
    ) -> Result<Self, RecordError> {
        let channel_id = channel_id.into();
        let channel_name = channel_name.into();
        validate_channel_id(&channel_id)?;
        validate_nonempty("channel_name", &channel_name)?;
        validate_not_future("last_updated", last_updated)?;
        let mut html = html;
        html.force_immutable(immutable);
        Ok(Self {
            channel_id,
            channel_name,
            last_updated,
            html,
            immutable,
        })
    }

    /// Load a record from a `.json` document written by [`Self::save_json`].
    pub fn from_json(path: &Path, immutable: bool) -> Result<Self, RecordError> {
        check_json_source(path)?;
        let doc: ChannelDoc = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded channel record");
        Self::new(
            doc.channel_id,
            doc.channel_name,
            parse_timestamp("last_updated", &doc.last_updated)?,
            HtmlBundle::new(
                doc.html.about,
                doc.html.community,
                doc.html.featured_channels,
                doc.html.videos,
                immutable,
            ),
            immutable,
        )
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn last_updated(&self) -> DateTime<FixedOffset> {
        self.last_updated
    }

    pub fn html(&self) -> &HtmlBundle {
        &self.html
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

    pub fn set_last_updated(
        &mut self,
        last_updated: DateTime<FixedOffset>,
    ) -> Result<(), RecordError> {
        self.guard("last_updated")?;
        validate_not_future("last_updated", last_updated)?;
        self.last_updated = last_updated;
        Ok(())
    }

    /// Replace the html bundle. The accepted bundle's lock flag is
    /// overwritten to match this record's.
    pub fn set_html(&mut self, html: HtmlBundle) -> Result<(), RecordError> {
        self.guard("html")?;
        let mut html = html;
        html.force_immutable(self.immutable);
        self.html = html;
        Ok(())
    }

    fn guard(&self, field: &'static str) -> Result<(), RecordError> {
        if self.immutable {
            return Err(RecordError::Immutable {
                record: "ChannelInfo",
                field,
            });
        }
        Ok(())
    }

    /// Structural JSON form: flat keys matching the field names, the
    /// timestamp as RFC 3339 text, the html bundle as a nested object.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "channel_id": self.channel_id,
            "channel_name": self.channel_name,
            "last_updated": self.last_updated.to_rfc3339(),
            "html": {
                "about": self.html.about(),
                "community": self.html.community(),
                "featured_channels": self.html.featured_channels(),
                "videos": self.html.videos(),
            },
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
        debug!(path = %path.display(), channel_id = %self.channel_id, "saved channel record");
        Ok(())
    }
}

impl Record for ChannelInfo {
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
            "last_updated" => Ok(FieldValue::Timestamp(self.last_updated)),
            "html" => Ok(FieldValue::Html(self.html.clone())),
            other => Err(RecordError::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: FieldValue) -> Result<(), RecordError> {
        match (key, value) {
            ("channel_id", FieldValue::Str(v)) => self.set_channel_id(v),
            ("channel_id", v) => Err(RecordError::Type {
                field: "channel_id",
                expected: "must be a string",
                received: v.type_name(),
            }),
            ("channel_name", FieldValue::Str(v)) => self.set_channel_name(v),
            ("channel_name", v) => Err(RecordError::Type {
                field: "channel_name",
                expected: "must be a string",
                received: v.type_name(),
            }),
            ("last_updated", FieldValue::Timestamp(v)) => self.set_last_updated(v),
            ("last_updated", v) => Err(RecordError::Type {
                field: "last_updated",
                expected: "must be a timezone-aware timestamp",
                received: v.type_name(),
            }),
            ("html", FieldValue::Html(v)) => self.set_html(v),
            ("html", v) => Err(RecordError::Type {
                field: "html",
                expected: "must be an HtmlBundle",
                received: v.type_name(),
            }),
            (other, _) => Err(RecordError::UnknownField(other.to_string())),
        }
    }
}

// Equality is content equality; the lock flag does not participate.
impl PartialEq for ChannelInfo {
    fn eq(&self, other: &Self) -> bool {
        self.channel_id == other.channel_id
            && self.channel_name == other.channel_name
            && self.last_updated == other.last_updated
            && self.html == other.html
    }
}

impl fmt::Display for ChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_record(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_bundle() -> HtmlBundle {
        HtmlBundle::new("<p>about</p>", "", "<div/>", "<ul/>", false)
    }

    fn sample_channel(immutable: bool) -> ChannelInfo {
        ChannelInfo::new(
            "UCuAXFkgsw1L7xaCfnd5JJOw",
            "Rick Astley",
            Utc::now().fixed_offset() - Duration::minutes(5),
            sample_bundle(),
            immutable,
        )
        .unwrap()
    }

    #[test]
    fn test_bad_channel_id_rejected() {
        let err = ChannelInfo::new(
            "not_an_id",
            "name",
            Utc::now().fixed_offset(),
            sample_bundle(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::Value { field: "channel_id", .. }));
    }

    #[test]
    fn test_future_last_updated_rejected() {
        let err = ChannelInfo::new(
            "UCuAXFkgsw1L7xaCfnd5JJOw",
            "name",
            (Utc::now() + Duration::hours(2)).fixed_offset(),
            sample_bundle(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::Value { field: "last_updated", .. }));
    }

    #[test]
    fn test_immutable_setter_rejected_mutable_allowed() {
        let mut locked = sample_channel(true);
        let err = locked.set_channel_name("New Name").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Immutable { record: "ChannelInfo", field: "channel_name" }
        ));

        let mut open = sample_channel(false);
        open.set_channel_name("New Name").unwrap();
        assert_eq!(open.channel_name(), "New Name");
    }

    #[test]
    fn test_owner_lock_propagates_to_bundle() {
        let channel = sample_channel(true);
        assert!(channel.html().immutable());

        let mut open = sample_channel(false);
        let locked_bundle = HtmlBundle::new("a", "b", "c", "d", true);
        open.set_html(locked_bundle).unwrap();
        // Flag is forced to the owner's, not kept from the argument
        assert!(!open.html().immutable());
    }

    #[test]
    fn test_mapping_view_round_trip() {
        let mut channel = sample_channel(false);
        let got = channel.get("channel_id").unwrap();
        assert_eq!(got, FieldValue::Str("UCuAXFkgsw1L7xaCfnd5JJOw".into()));

        channel
            .set("channel_name", FieldValue::Str("Other".into()))
            .unwrap();
        assert_eq!(channel.channel_name(), "Other");

        let err = channel.get("nope").unwrap_err();
        assert!(matches!(err, RecordError::UnknownField(_)));

        let err = channel
            .set("channel_name", FieldValue::Keywords(vec![]))
            .unwrap_err();
        assert!(matches!(err, RecordError::Type { field: "channel_name", .. }));
    }

    #[test]
    fn test_hash_requires_lock() {
        let locked = sample_channel(true);
        let open = sample_channel(false);
        assert!(locked.content_hash().is_ok());
        assert!(matches!(open.content_hash(), Err(RecordError::NotHashable)));
    }

    #[test]
    fn test_equality_ignores_lock_state() {
        let locked = sample_channel(true);
        let open = ChannelInfo::new(
            locked.channel_id(),
            locked.channel_name(),
            locked.last_updated(),
            sample_bundle(),
            false,
        )
        .unwrap();
        assert_eq!(locked, open);
        assert!(locked.content_eq(&open));
    }

    #[test]
    fn test_bundle_from_mapping() {
        let mut map = BTreeMap::new();
        map.insert("about".to_string(), "a".to_string());
        map.insert("community".to_string(), "b".to_string());
        map.insert("featured_channels".to_string(), "c".to_string());
        map.insert("videos".to_string(), "d".to_string());
        let bundle = HtmlBundle::try_from(map).unwrap();
        assert_eq!(bundle.about(), "a");

        let mut short = BTreeMap::new();
        short.insert("about".to_string(), "a".to_string());
        assert!(HtmlBundle::try_from(short).is_err());
    }

    #[test]
    fn test_display_elides_long_html() {
        let mut channel = sample_channel(false);
        let long = format!("<p>{}</p>", "x".repeat(200));
        channel.html = HtmlBundle::new(long, "", "", "", false);
        let rendered = channel.to_string();
        assert!(rendered.contains("..."));
        assert!(rendered.contains("'channel_id'"));
    }
}
