//! Error types for mooda-core.

use thiserror::Error;

/// Result type alias for `WaterFrame` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `WaterFrame` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A referenced column does not exist (anymore).
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// A column with this name already exists.
    #[error("key already exists: {0}")]
    DuplicateKey(String),

    /// Column length does not match the time index.
    #[error("column {key} has {found} values, index has {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    /// QC flags are limited to 0..=9.
    #[error("invalid QC flag: {0}")]
    InvalidFlag(u8),

    /// Slice bounds are reversed.
    #[error("invalid time range: {start} > {end}")]
    InvalidRange { start: String, end: String },

    /// Unknown resample rule code.
    #[error("unknown resample rule: {0}")]
    InvalidRule(String),

    /// The frame holds no acoustic columns.
    #[error("no acoustic data in frame")]
    NoAcousticData,

    /// Operation needs at least one row.
    #[error("frame is empty")]
    EmptyFrame,
}
