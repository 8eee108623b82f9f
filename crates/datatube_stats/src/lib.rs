//! Schema-locked statistics store for the datatube archiver.
//!
//! # Philosophy: the schema is a contract
//!
//! The six stats columns and their dtypes are fixed at the type level.
//! Data that does not conform is rejected at the door; there are no
//! silent fallbacks and no guessing. What coercion exists is explicit:
//! one narrowing rule and one cast rule per semantic dtype tag, applied
//! only where a caller asked for it.
//!
//! # Modules
//!
//! - [`dtype`]: semantic dtype tags, cell values, narrowing, casting
//! - [`frame`]: the small named-column table the store is built on
//! - [`stats`]: the [`Stats`] store itself, with CSV round-trips

pub mod dtype;
pub mod error;
pub mod frame;
pub mod stats;

pub use dtype::{DType, Value};
pub use error::{FrameError, StatsError};
pub use frame::{check_dtype, coerce_dtypes, infer_dtypes, Column, Frame};
pub use stats::{Sample, Stats, StatsOptions, STATS_COLUMNS};
