//! mooda-core: the `WaterFrame` data engine.
//!
//! A `WaterFrame` is a timestamp-indexed table of oceanographic parameters,
//! each paired with a `<PARAM>_QC` column of quality-control flags, plus a
//! metadata dictionary. This crate provides the structural operations
//! (concat, drop, rename, slice, resample), the QC tests, and the figure
//! data consumed by the plotting front-end.
//!

pub mod error;
pub mod figure;
pub mod flag;
pub mod frame;
pub mod qc;
pub mod resample;

pub use error::{Error, Result};
pub use figure::{
    AverageTime, FlagSeries, Histogram, QcBar, ScatterCell, ScatterMatrix, Series, Spectrogram,
};
pub use flag::{QcFlag, GOOD_FLAGS, REJECTED_FLAGS};
pub use frame::{is_acoustic_key, qc_key, Column, Meaning, MetaValue, WaterFrame, QC_SUFFIX};
pub use qc::{auto_window, range_limits, QcReport, QcSettings};
pub use resample::ResampleRule;
