//! Shared format checks for datatube identifiers and URLs.
//!
//! These are leaf predicates: they never allocate on the happy path and
//! return plain booleans so callers can attach their own error context.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// YouTube video ids are exactly 11 characters from the URL-safe base64
/// alphabet.
static VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("static regex"));

/// Returns true if `value` is a well-formed 11-character video id.
pub fn is_video_id(value: &str) -> bool {
    VIDEO_ID.is_match(value)
}

/// Returns true if `value` is a well-formed 24-character channel id.
///
/// Channel ids carry a `UC` prefix; the remaining 22 characters are not
/// alphabet-checked because scraped ids occasionally contain legacy forms.
pub fn is_channel_id(value: &str) -> bool {
    value.len() == 24 && value.starts_with("UC")
}

/// Returns true if `value` parses as an absolute http(s) URL with a host.
pub fn is_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
