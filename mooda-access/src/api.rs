//! EGIM API data types and the `EgimApi` trait.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use mooda_core::{MetaValue, WaterFrame};
use serde::Deserialize;

use crate::Result;

/// Instrument whose data are acoustic recordings indexed by date and time slot.
pub const ACOUSTIC_INSTRUMENT: &str = "icListen-1636";

/// Earliest date the EGIM observatories hold data for.
#[must_use]
pub fn first_observation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 27).unwrap_or(NaiveDate::MIN)
}

/// Login and in-memory password for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// An instrument of an observatory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub name: String,
    #[serde(default)]
    pub sensor_type: String,
    #[serde(default)]
    pub sensor_long_name: String,
    #[serde(default)]
    pub sn: String,
}

impl Instrument {
    /// Hover text for instrument lists.
    #[must_use]
    pub fn tooltip(&self) -> String {
        format!(
            "Sensor Type\n{}\n\nLong Name\n{}\n\nS/N\n{}",
            self.sensor_type, self.sensor_long_name, self.sn
        )
    }
}

/// A parameter measured by an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Unit of measure.
    #[serde(default)]
    pub uom: String,
}

/// One acoustic time slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourMinute {
    pub acoustic_observation_hour_minute: String,
}

/// Acoustic recordings available on one date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcousticDate {
    /// `YYYY-MM-DD`.
    pub acoustic_observation_date: String,
    #[serde(default)]
    pub observations_hour_minute_list: Vec<HourMinute>,
}

impl AcousticDate {
    /// Time slot labels of this date.
    #[must_use]
    pub fn times(&self) -> Vec<String> {
        self.observations_hour_minute_list
            .iter()
            .map(|t| t.acoustic_observation_hour_minute.clone())
            .collect()
    }
}

/// Time window of a parameter download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// Inclusive calendar range.
    Between { start: NaiveDate, end: NaiveDate },
    /// The most recent `n` values.
    Last(u32),
}

/// One parameter download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationQuery {
    pub observatory: String,
    pub instrument: String,
    pub parameter: String,
    pub range: DateRange,
}

/// One acoustic download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcousticQuery {
    pub observatory: String,
    pub instrument: String,
    /// `DD/MM/YYYY`.
    pub date: String,
    pub hour_minute: String,
}

/// The EGIM endpoints used by the downloader.
///
/// Implementations are shared with the download worker thread.
pub trait EgimApi: Send + Sync {
    /// Observatory names.
    fn observatories(&self, auth: &Auth) -> Result<Vec<String>>;

    /// Instruments of an observatory.
    fn instruments(&self, auth: &Auth, observatory: &str) -> Result<Vec<Instrument>>;

    /// Instrument metadata.
    fn metadata(
        &self,
        auth: &Auth,
        observatory: &str,
        instrument: &str,
    ) -> Result<BTreeMap<String, MetaValue>>;

    /// Parameters of an instrument.
    fn parameters(&self, auth: &Auth, observatory: &str, instrument: &str)
        -> Result<Vec<Parameter>>;

    /// Dates and time slots of an acoustic instrument.
    fn acoustic_dates(
        &self,
        auth: &Auth,
        observatory: &str,
        instrument: &str,
    ) -> Result<Vec<AcousticDate>>;

    /// Observations of one parameter as a frame with `<PARAM>` and
    /// `<PARAM>_QC` columns.
    fn observation(&self, auth: &Auth, query: &ObservationQuery) -> Result<WaterFrame>;

    /// One acoustic recording as a frame of frequency columns.
    fn acoustic_observation(&self, auth: &Auth, query: &AcousticQuery) -> Result<WaterFrame>;
}
