//! mooda-access: data access for the EMSODEV EGIM observatories.
//!
//! `EgimClient` talks to the DMP REST API over blocking HTTP,
//! `DownloadCoordinator` walks the observatory → instrument → parameter
//! hierarchy on behalf of the UI, and `run_download` fetches the selected
//! data on a worker thread, one request per parameter.
//!

pub mod api;
pub mod client;
pub mod config;
pub mod convert;
pub mod coordinator;
mod error;
pub mod worker;

pub use api::{
    first_observation_date, AcousticDate, AcousticQuery, Auth, DateRange, EgimApi, HourMinute,
    Instrument, ObservationQuery, Parameter, ACOUSTIC_INSTRUMENT,
};
pub use client::EgimClient;
pub use config::ApiConfig;
pub use coordinator::{CoordinatorEvent, DownloadCoordinator, DownloadRequest, DownloadState};
pub use error::{ApiStatus, Error, Result, CONNECTION_FAILED, PASSWORD_REQUIRED};
pub use worker::{run_download, DownloadJob, DownloadMessage};
