//! Quality-control flag vocabulary.
//!
//! Flags follow the OceanSITES convention: 0 = no QC performed, 1 = good,
//! 2 = probably good, 3 = probably bad, 4 = bad, 5 = value changed,
//! 7 = nominal value, 8 = interpolated, 9 = missing value.

use std::fmt;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single QC flag in the range 0..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QcFlag(u8);

/// Flags kept by "use good data only" filtering.
pub const GOOD_FLAGS: [QcFlag; 2] = [QcFlag(0), QcFlag(1)];

/// Flags rejected by "use good data only" filtering.
pub const REJECTED_FLAGS: [QcFlag; 8] = [
    QcFlag(2),
    QcFlag(3),
    QcFlag(4),
    QcFlag(5),
    QcFlag(6),
    QcFlag(7),
    QcFlag(8),
    QcFlag(9),
];

impl QcFlag {
    /// No QC performed.
    pub const NO_QC: QcFlag = QcFlag(0);
    /// Good data.
    pub const GOOD: QcFlag = QcFlag(1);
    /// Bad data, the default flag assigned by failing tests.
    pub const BAD: QcFlag = QcFlag(4);
    /// Highest valid flag.
    pub const MAX: u8 = 9;

    /// Creates a flag, rejecting values above 9.
    ///
    /// # Errors
    /// Returns `Error::InvalidFlag` if `value > 9`.
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::InvalidFlag(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw flag value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Flag as stored in a QC column.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Decodes a QC column cell. Missing or out-of-range cells yield `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value > f64::from(Self::MAX) {
            return None;
        }
        if value.fract() != 0.0 {
            return None;
        }
        Some(Self(value as u8))
    }

    /// True if the flag belongs to `GOOD_FLAGS`.
    #[must_use]
    pub fn is_good(self) -> bool {
        GOOD_FLAGS.contains(&self)
    }
}

impl fmt::Display for QcFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for QcFlag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(QcFlag::new(9).is_ok());
        assert_eq!(QcFlag::new(10), Err(Error::InvalidFlag(10)));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(QcFlag::from_f64(4.0), Some(QcFlag::BAD));
        assert_eq!(QcFlag::from_f64(f64::NAN), None);
        assert_eq!(QcFlag::from_f64(1.5), None);
        assert_eq!(QcFlag::from_f64(-1.0), None);
        assert_eq!(QcFlag::from_f64(12.0), None);
    }

    #[test]
    fn test_good_and_rejected_partition() {
        for v in 0..=9 {
            let flag = QcFlag::new(v).unwrap();
            assert_ne!(flag.is_good(), REJECTED_FLAGS.contains(&flag));
        }
    }
}
