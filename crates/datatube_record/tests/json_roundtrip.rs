//! End-to-end tests for record JSON persistence.
//!
//! Exercises the full save/load cycle against real files, no mocks.

use anyhow::Result;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use tempfile::tempdir;

use datatube_record::{ChannelInfo, HtmlBundle, Record, RecordError, VideoInfo, VideoInfoArgs};

fn sample_channel(immutable: bool) -> ChannelInfo {
    ChannelInfo::new(
        "UCuAXFkgsw1L7xaCfnd5JJOw",
        "Rick Astley",
        (Utc::now() - Duration::minutes(10)).fixed_offset(),
        HtmlBundle::new("<p>about</p>", "", "<div>featured</div>", "<ul>videos</ul>", false),
        immutable,
    )
    .unwrap()
}

fn sample_video_args() -> VideoInfoArgs {
    let now = Utc::now().fixed_offset();
    VideoInfoArgs {
        channel_id: "UCuAXFkgsw1L7xaCfnd5JJOw".into(),
        channel_name: "Rick Astley".into(),
        video_id: "dQw4w9WgXcQ".into(),
        video_title: "Never Gonna Give You Up".into(),
        publish_date: now - Duration::days(4000),
        last_updated: now - Duration::minutes(2),
        duration: Duration::seconds(212),
        description: "The official video.".into(),
        keywords: vec!["rick".into(), "roll".into()],
        thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg".into(),
    }
}

// =============================================================================
// ROUND-TRIP LAW
// =============================================================================

#[test]
fn test_channel_round_trip_mutable_and_immutable() -> Result<()> {
    let dir = tempdir()?;
    for immutable in [false, true] {
        let channel = sample_channel(immutable);
        let path = dir.path().join(format!("channel_{}.json", immutable));
        channel.save_json(&path)?;

        let loaded = ChannelInfo::from_json(&path, immutable)?;
        assert_eq!(loaded, channel);
        assert_eq!(loaded.immutable(), immutable);
        assert_eq!(loaded.html().immutable(), immutable);
    }
    Ok(())
}

#[test]
fn test_video_round_trip_mutable_and_immutable() -> Result<()> {
    let dir = tempdir()?;
    for immutable in [false, true] {
        let video = VideoInfo::new(sample_video_args(), immutable)?;
        let path = dir.path().join(format!("video_{}.json", immutable));
        video.save_json(&path)?;

        let loaded = VideoInfo::from_json(&path, immutable)?;
        assert_eq!(loaded, video);
        assert_eq!(loaded.immutable(), immutable);
    }
    Ok(())
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b").join("channel.json");
    sample_channel(false).save_json(&nested).unwrap();
    assert!(nested.exists());
}

#[test]
fn test_json_document_shape() {
    let video = VideoInfo::new(sample_video_args(), false).unwrap();
    let doc = video.to_json();
    assert_eq!(doc["video_id"], "dQw4w9WgXcQ");
    assert_eq!(doc["duration"], 212.0);
    assert!(doc["publish_date"].as_str().unwrap().contains('T'));

    let channel = sample_channel(false);
    let doc = channel.to_json();
    assert_eq!(doc["html"]["about"], "<p>about</p>");
    assert_eq!(doc["html"]["community"], "");
}

// =============================================================================
// PATH VALIDATION
// =============================================================================

#[test]
fn test_save_rejects_non_json_extension() {
    let dir = tempdir().unwrap();
    let err = sample_channel(false)
        .save_json(&dir.path().join("channel.csv"))
        .unwrap_err();
    assert!(matches!(err, RecordError::BadPath { .. }));
}

#[test]
fn test_load_rejects_missing_path() {
    let dir = tempdir().unwrap();
    let err = ChannelInfo::from_json(&dir.path().join("absent.json"), false).unwrap_err();
    assert!(matches!(err, RecordError::BadPath { .. }));
}

#[test]
fn test_load_validates_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("video.json");

    // A valid document with a corrupted video id must fail construction
    let video = VideoInfo::new(sample_video_args(), false).unwrap();
    let mut doc = video.to_json();
    doc["video_id"] = serde_json::json!("short");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let err = VideoInfo::from_json(&path, false).unwrap_err();
    assert!(matches!(err, RecordError::Value { field: "video_id", .. }));
}

#[test]
fn test_load_rejects_naive_timestamp() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("channel.json");
    let mut doc = sample_channel(false).to_json();
    doc["last_updated"] = serde_json::json!("2021-01-01T00:00:00");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let err = ChannelInfo::from_json(&path, false).unwrap_err();
    assert!(matches!(err, RecordError::Value { field: "last_updated", .. }));
}

// =============================================================================
// PROPERTY: ROUND TRIP OVER GENERATED RECORDS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_video_round_trip(
        video_id in "[0-9A-Za-z_-]{11}",
        channel_tail in "[0-9A-Za-z_-]{22}",
        title in "[ -~]{1,40}",
        description in "[ -~]{0,80}",
        keywords in proptest::collection::vec("[a-z]{1,12}", 0..6),
        age_minutes in 1i64..1_000_000,
        duration_secs in 0i64..20_000,
    ) {
        let now = Utc::now().fixed_offset();
        let last_updated = now - Duration::minutes(1);
        let args = VideoInfoArgs {
            channel_id: format!("UC{}", channel_tail),
            channel_name: "channel".into(),
            video_id,
            video_title: title,
            publish_date: last_updated - Duration::minutes(age_minutes),
            last_updated,
            duration: Duration::seconds(duration_secs),
            description,
            keywords,
            thumbnail_url: "https://i.ytimg.com/vi/x/default.jpg".into(),
        };
        let video = VideoInfo::new(args, true).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("video.json");
        video.save_json(&path).unwrap();
        let loaded = VideoInfo::from_json(&path, true).unwrap();
        prop_assert_eq!(loaded, video);
    }
}
