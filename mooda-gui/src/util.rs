//! Numeric and time conversion utilities for mooda-gui.
//!
//! These functions handle conversions between numeric types with explicit
//! handling of precision loss, plus the timestamp formatting shared by the
//! plot axes and the panels.

use chrono::{DateTime, NaiveDateTime};

/// Layout used by every editable timestamp field.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert usize to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Convert f32 to u8 with clamping to [0, 255].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f32_to_u8(value: f32) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    clamped.round() as u8
}

/// Convert f64 to f32 for colormap lookups.
#[allow(clippy::cast_possible_truncation)]
pub fn f64_to_f32(value: f64) -> f32 {
    value as f32
}

/// Convert f64 to usize with bounds checking.
///
/// Returns `None` if the value is not finite, negative, or >= `max_exclusive`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_usize_bounded(value: f64, max_exclusive: usize) -> Option<usize> {
    if !value.is_finite() || value < 0.0 || value >= usize_to_f64(max_exclusive) {
        return None;
    }
    Some(value as usize)
}

/// Format a unix timestamp (seconds) for a plot axis.
///
/// Spans under two days show the time of day, longer spans only the date.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_unix_seconds(seconds: f64, span_seconds: f64) -> String {
    if !seconds.is_finite() {
        return String::new();
    }
    let Some(time) = DateTime::from_timestamp(seconds.round() as i64, 0) else {
        return String::new();
    };
    if span_seconds < 2.0 * 86_400.0 {
        time.format("%m-%d %H:%M").to_string()
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}

/// Parse a timestamp typed in a panel field.
#[must_use]
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).ok()
}

/// Format a number with comma separators for readability.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_number(12345678), "12,345,678");
/// assert_eq!(format_number(42), "42");
/// ```
#[must_use]
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
