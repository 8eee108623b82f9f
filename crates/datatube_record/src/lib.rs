//! Validated metadata records for the datatube archiver.
//!
//! The record model in datatube:
//!
//! 1. **Declared fields**: each record type lists its fields once, in order
//! 2. **Validation on every write**: constructors and setters run the same
//!    guards: immutability, then type, then format/range
//! 3. **Lockable**: a record built with `immutable = true` refuses every
//!    reassignment and becomes hashable
//! 4. **Mapping view**: string-keyed get/set, iteration, and content
//!    equality are derived from the declared field list via [`Record`]
//!
//! A rejected write is a failure, not a fallback: nothing is coerced,
//! nothing is partially applied, and the record is left exactly as it was.
//!
//! # Modules
//!
//! - [`field`]: the [`Record`] trait and [`FieldValue`] union
//! - [`channel`]: [`ChannelInfo`] and its owned [`HtmlBundle`]
//! - [`video`]: [`VideoInfo`]

pub mod channel;
pub mod error;
pub mod field;
mod json;
mod validate;
pub mod video;

pub use channel::{ChannelInfo, HtmlBundle};
pub use error::RecordError;
pub use field::{FieldValue, Record};
pub use video::{VideoInfo, VideoInfoArgs};
