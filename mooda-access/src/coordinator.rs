//! Download coordinator: a cursor over observatory → instrument →
//! {parameters | acoustic dates → time slots}.
//!
//! List operations are synchronous. Each one either replaces the level it
//! fetched (clearing everything below it) and reports "Ready", or leaves all
//! state untouched and reports exactly one status line. A 401 at any level
//! clears the password and asks for a new one; entering it reloads the
//! observatories once.

use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use mooda_core::{Meaning, MetaValue};

use crate::api::{
    AcousticDate, AcousticQuery, Auth, DateRange, EgimApi, Instrument, ObservationQuery,
    Parameter, ACOUSTIC_INSTRUMENT,
};
use crate::convert::to_acoustic_date;
use crate::error::PASSWORD_REQUIRED;
use crate::worker::{run_download, DownloadJob, DownloadMessage};
use crate::{ApiStatus, Error, Result};

/// Notifications for the UI, drained with `DownloadCoordinator::drain_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// Status bar text.
    Status(String),
    /// The UI must prompt for the password and call `provide_password`.
    CredentialRequired,
}

/// Where the cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    ObservatorySelected,
    InstrumentSelected,
    ParametersReady,
    DatesReady,
    Downloading,
}

/// What the user asked to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadRequest {
    /// Selected parameters of the current instrument.
    Parameters {
        parameters: Vec<String>,
        range: DateRange,
    },
    /// One acoustic time slot; `date` is `YYYY-MM-DD`.
    Acoustic { date: String, hour_minute: String },
}

/// Walks the EGIM hierarchy and starts download workers.
pub struct DownloadCoordinator {
    api: Arc<dyn EgimApi>,
    login: String,
    password: Option<String>,
    awaiting_password: bool,

    observatories: Vec<String>,
    observatory: Option<String>,
    instruments: Vec<Instrument>,
    instrument: Option<String>,
    metadata: BTreeMap<String, MetaValue>,
    parameters: Vec<Parameter>,
    dates: Vec<AcousticDate>,
    date: Option<String>,

    downloading: bool,
    events: Vec<CoordinatorEvent>,
}

impl DownloadCoordinator {
    pub fn new(api: Arc<dyn EgimApi>, login: impl Into<String>) -> Self {
        Self {
            api,
            login: login.into(),
            password: None,
            awaiting_password: false,
            observatories: Vec::new(),
            observatory: None,
            instruments: Vec::new(),
            instrument: None,
            metadata: BTreeMap::new(),
            parameters: Vec::new(),
            dates: Vec::new(),
            date: None,
            downloading: false,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> DownloadState {
        if self.downloading {
            DownloadState::Downloading
        } else if let Some(instrument) = &self.instrument {
            if instrument == ACOUSTIC_INSTRUMENT {
                DownloadState::DatesReady
            } else if self.parameters.is_empty() {
                DownloadState::InstrumentSelected
            } else {
                DownloadState::ParametersReady
            }
        } else if self.observatory.is_some() {
            DownloadState::ObservatorySelected
        } else {
            DownloadState::Idle
        }
    }

    pub fn observatories(&self) -> &[String] {
        &self.observatories
    }

    pub fn selected_observatory(&self) -> Option<&str> {
        self.observatory.as_deref()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn selected_instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetaValue> {
        &self.metadata
    }

    /// Parameters of the selected instrument, sorted by name.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn dates(&self) -> &[AcousticDate] {
        &self.dates
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_awaiting_password(&self) -> bool {
        self.awaiting_password
    }

    /// Takes the pending UI notifications.
    pub fn drain_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }

    fn status(&mut self, message: impl Into<String>) {
        self.events.push(CoordinatorEvent::Status(message.into()));
    }

    fn auth(&self) -> Option<Auth> {
        self.password.as_ref().map(|password| Auth {
            login: self.login.clone(),
            password: password.clone(),
        })
    }

    fn fail(&mut self, error: &Error) {
        log::warn!("EMSODEV request failed: {error}");
        self.status(error.status_message());
        if error.is_unauthorized() {
            self.password = None;
            self.reload();
        }
    }

    fn clear_below_observatory(&mut self) {
        self.instruments.clear();
        self.instrument = None;
        self.clear_below_instrument();
    }

    fn clear_below_instrument(&mut self) {
        self.metadata.clear();
        self.parameters.clear();
        self.dates.clear();
        self.date = None;
    }

    /// Asks for the password if none is stored, otherwise reloads the
    /// observatory list.
    pub fn reload(&mut self) {
        if self.password.is_none() {
            self.status(PASSWORD_REQUIRED);
            self.awaiting_password = true;
            self.events.push(CoordinatorEvent::CredentialRequired);
            return;
        }
        self.list_observatories();
    }

    /// Answer to `CoordinatorEvent::CredentialRequired`; `None` means the
    /// prompt was cancelled.
    pub fn provide_password(&mut self, password: Option<String>) {
        self.awaiting_password = false;
        match password {
            Some(password) => {
                self.password = Some(password);
                self.list_observatories();
            }
            None => self.status(PASSWORD_REQUIRED),
        }
    }

    pub fn list_observatories(&mut self) {
        let Some(auth) = self.auth() else {
            self.reload();
            return;
        };
        log::info!("Loading observatories");
        match self.api.observatories(&auth) {
            Ok(observatories) => {
                self.observatories = observatories;
                self.observatory = None;
                self.clear_below_observatory();
                self.status("Ready");
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Selects an observatory and loads its instruments.
    pub fn select_observatory(&mut self, observatory: &str) {
        let Some(auth) = self.auth() else {
            self.reload();
            return;
        };
        log::info!("Loading instruments of {observatory}");
        match self.api.instruments(&auth, observatory) {
            Ok(instruments) => {
                self.observatory = Some(observatory.to_string());
                self.clear_below_observatory();
                self.instruments = instruments;
                self.status("Ready");
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Selects an instrument and loads its metadata and parameters, or its
    /// acoustic dates for the acoustic instrument.
    pub fn select_instrument(&mut self, instrument: &str) {
        let Some(observatory) = self.observatory.clone() else {
            self.status(Error::NoSelection("observatory").to_string());
            return;
        };
        let Some(auth) = self.auth() else {
            self.reload();
            return;
        };

        if instrument == ACOUSTIC_INSTRUMENT {
            log::info!("Loading acoustic dates of {instrument}");
            match self.api.acoustic_dates(&auth, &observatory, instrument) {
                Ok(dates) => {
                    self.instrument = Some(instrument.to_string());
                    self.clear_below_instrument();
                    self.dates = dates;
                    self.status("Ready");
                }
                Err(e) => self.fail(&e),
            }
            return;
        }

        log::info!("Loading parameters of {instrument}");
        let fetched = self
            .api
            .metadata(&auth, &observatory, instrument)
            .and_then(|metadata| {
                let parameters = self.api.parameters(&auth, &observatory, instrument)?;
                Ok((metadata, parameters))
            });
        match fetched {
            Ok((metadata, mut parameters)) => {
                parameters.sort_by(|a, b| a.name.cmp(&b.name));
                self.instrument = Some(instrument.to_string());
                self.clear_below_instrument();
                self.metadata = metadata;
                self.parameters = parameters;
                self.status("Ready");
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Time slots of an already fetched acoustic date. Unknown dates yield
    /// an empty list.
    pub fn list_times(&mut self, date: &str) -> Vec<String> {
        match self
            .dates
            .iter()
            .find(|d| d.acoustic_observation_date == date)
        {
            Some(found) => {
                let times = found.times();
                self.date = Some(date.to_string());
                times
            }
            None => Vec::new(),
        }
    }

    /// Called by a 401 reported from the download worker.
    pub fn handle_unauthorized(&mut self) {
        self.fail(&Error::Status(ApiStatus::Unauthorized));
    }

    /// Marks the running worker as finished.
    pub fn finish_download(&mut self) {
        self.downloading = false;
    }

    fn build_job(&self, request: DownloadRequest) -> Result<DownloadJob> {
        let observatory = self
            .observatory
            .clone()
            .ok_or(Error::NoSelection("observatory"))?;
        let instrument = self
            .instrument
            .clone()
            .ok_or(Error::NoSelection("instrument"))?;

        match request {
            DownloadRequest::Parameters { parameters, range } => {
                if parameters.is_empty() {
                    return Err(Error::NoSelection("parameter"));
                }
                let meaning = self
                    .parameters
                    .iter()
                    .filter(|p| parameters.contains(&p.name))
                    .map(|p| {
                        (
                            p.name.clone(),
                            Meaning {
                                long_name: p.name.clone(),
                                units: p.uom.clone(),
                            },
                        )
                    })
                    .collect();
                let queries = parameters
                    .into_iter()
                    .map(|parameter| ObservationQuery {
                        observatory: observatory.clone(),
                        instrument: instrument.clone(),
                        parameter,
                        range,
                    })
                    .collect();
                Ok(DownloadJob::Parameters {
                    queries,
                    metadata: self.metadata.clone(),
                    meaning,
                })
            }
            DownloadRequest::Acoustic { date, hour_minute } => {
                if instrument != ACOUSTIC_INSTRUMENT {
                    return Err(Error::NoSelection("acoustic instrument"));
                }
                Ok(DownloadJob::Acoustic(AcousticQuery {
                    observatory,
                    instrument,
                    date: to_acoustic_date(&date)?,
                    hour_minute,
                }))
            }
        }
    }

    /// Starts a download worker reporting through `tx`.
    ///
    /// # Errors
    /// Returns `Error::DownloadInProgress` while a worker is running,
    /// `Error::PasswordRequired` without a password, and
    /// `Error::NoSelection`/`Error::InvalidDate` for incomplete requests.
    pub fn start_download<M>(&mut self, request: DownloadRequest, tx: Sender<M>) -> Result<()>
    where
        M: From<DownloadMessage> + Send + 'static,
    {
        if self.downloading {
            return Err(Error::DownloadInProgress);
        }
        let Some(auth) = self.auth() else {
            self.reload();
            return Err(Error::PasswordRequired);
        };
        let job = self.build_job(request)?;

        self.downloading = true;
        let api = Arc::clone(&self.api);
        thread::spawn(move || run_download(api.as_ref(), &auth, job, &tx));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{acoustic_to_frame, observations_to_frame, AcousticRecord, Observation};
    use crate::HourMinute;
    use mooda_core::WaterFrame;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::channel;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockApi {
        observatory_failures: Mutex<VecDeque<ApiStatus>>,
        instrument_failure: Mutex<Option<ApiStatus>>,
        parameter_failures: Mutex<HashMap<String, ApiStatus>>,
        observatory_calls: AtomicUsize,
        observation_calls: AtomicUsize,
    }

    impl EgimApi for MockApi {
        fn observatories(&self, _auth: &Auth) -> Result<Vec<String>> {
            self.observatory_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.observatory_failures.lock().unwrap().pop_front() {
                return Err(Error::Status(status));
            }
            Ok(vec!["node00001".into(), "node00002".into()])
        }

        fn instruments(&self, _auth: &Auth, _observatory: &str) -> Result<Vec<Instrument>> {
            if let Some(status) = *self.instrument_failure.lock().unwrap() {
                return Err(Error::Status(status));
            }
            Ok(vec![
                Instrument {
                    name: "SBE37".into(),
                    sensor_type: "CTD".into(),
                    sensor_long_name: "SeaBird 37".into(),
                    sn: "1234".into(),
                },
                Instrument {
                    name: ACOUSTIC_INSTRUMENT.into(),
                    sensor_type: "hydrophone".into(),
                    sensor_long_name: "icListen".into(),
                    sn: "1636".into(),
                },
            ])
        }

        fn metadata(
            &self,
            _auth: &Auth,
            _observatory: &str,
            _instrument: &str,
        ) -> Result<BTreeMap<String, MetaValue>> {
            Ok(BTreeMap::from([("site".to_string(), MetaValue::from("OBSEA"))]))
        }

        fn parameters(
            &self,
            _auth: &Auth,
            _observatory: &str,
            _instrument: &str,
        ) -> Result<Vec<Parameter>> {
            Ok(vec![
                Parameter {
                    name: "TEMP".into(),
                    uom: "degC".into(),
                },
                Parameter {
                    name: "CNDC".into(),
                    uom: "S/m".into(),
                },
            ])
        }

        fn acoustic_dates(
            &self,
            _auth: &Auth,
            _observatory: &str,
            _instrument: &str,
        ) -> Result<Vec<AcousticDate>> {
            Ok(vec![AcousticDate {
                acoustic_observation_date: "2017-02-01".into(),
                observations_hour_minute_list: vec![
                    HourMinute {
                        acoustic_observation_hour_minute: "10:00".into(),
                    },
                    HourMinute {
                        acoustic_observation_hour_minute: "10:10".into(),
                    },
                ],
            }])
        }

        fn observation(&self, _auth: &Auth, query: &ObservationQuery) -> Result<WaterFrame> {
            self.observation_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.parameter_failures.lock().unwrap().get(&query.parameter) {
                return Err(Error::Status(*status));
            }
            observations_to_frame(
                &query.parameter,
                &[Observation {
                    phenomenon_time: "2017-02-01T10:00:00".into(),
                    value: serde_json::json!(1.5),
                }],
            )
        }

        fn acoustic_observation(&self, _auth: &Auth, query: &AcousticQuery) -> Result<WaterFrame> {
            assert_eq!(query.date, "01/02/2017");
            acoustic_to_frame(&[AcousticRecord {
                time: "2017-02-01 10:00:00".into(),
                values: BTreeMap::from([("Sequence".to_string(), serde_json::json!(1))]),
            }])
        }
    }

    fn setup(api: MockApi) -> (Arc<MockApi>, DownloadCoordinator) {
        let api = Arc::new(api);
        let mut coordinator = DownloadCoordinator::new(api.clone(), "emsodev");
        coordinator.provide_password(Some("secret".into()));
        coordinator.drain_events();
        (api, coordinator)
    }

    fn status(text: &str) -> CoordinatorEvent {
        CoordinatorEvent::Status(text.to_string())
    }

    fn collect(rx: &std::sync::mpsc::Receiver<DownloadMessage>) -> Vec<DownloadMessage> {
        rx.iter().collect()
    }

    #[test]
    fn test_reload_without_password_prompts() {
        let api = Arc::new(MockApi::default());
        let mut coordinator = DownloadCoordinator::new(api.clone(), "emsodev");
        coordinator.reload();
        assert_eq!(
            coordinator.drain_events(),
            vec![status(PASSWORD_REQUIRED), CoordinatorEvent::CredentialRequired]
        );
        assert!(coordinator.is_awaiting_password());
        assert_eq!(api.observatory_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unauthorized_clears_password_and_retries_once() {
        let (api, mut coordinator) = setup(MockApi::default());
        api.observatory_failures
            .lock()
            .unwrap()
            .push_back(ApiStatus::Unauthorized);

        coordinator.list_observatories();
        assert!(!coordinator.has_password());
        assert_eq!(
            coordinator.drain_events(),
            vec![
                status("Unauthorized to use the EMSODEV DMP API"),
                status(PASSWORD_REQUIRED),
                CoordinatorEvent::CredentialRequired,
            ]
        );
        let calls = api.observatory_calls.load(Ordering::SeqCst);

        coordinator.provide_password(Some("new-secret".into()));
        assert_eq!(api.observatory_calls.load(Ordering::SeqCst), calls + 1);
        assert_eq!(coordinator.observatories().len(), 2);
        assert_eq!(coordinator.drain_events(), vec![status("Ready")]);
    }

    #[test]
    fn test_cancelled_prompt_does_not_retry() {
        let (api, mut coordinator) = setup(MockApi::default());
        api.observatory_failures
            .lock()
            .unwrap()
            .push_back(ApiStatus::Unauthorized);
        coordinator.list_observatories();
        coordinator.drain_events();
        let calls = api.observatory_calls.load(Ordering::SeqCst);

        coordinator.provide_password(None);
        assert_eq!(api.observatory_calls.load(Ordering::SeqCst), calls);
        assert_eq!(coordinator.drain_events(), vec![status(PASSWORD_REQUIRED)]);
    }

    #[test]
    fn test_non_success_status_keeps_state() {
        for (code, message) in [
            (ApiStatus::NotFound, "Not Found"),
            (ApiStatus::Forbidden, "Forbidden"),
            (ApiStatus::ServerError, "EMSODEV API internal error"),
            (ApiStatus::Unknown(418), "Unknown EMSODEV DMP API error"),
        ] {
            let (api, mut coordinator) = setup(MockApi::default());
            coordinator.select_observatory("node00001");
            coordinator.drain_events();
            *api.instrument_failure.lock().unwrap() = Some(code);

            coordinator.select_observatory("node00002");
            assert_eq!(coordinator.drain_events(), vec![status(message)]);
            assert_eq!(coordinator.selected_observatory(), Some("node00001"));
            assert_eq!(coordinator.instruments().len(), 2);
        }
    }

    #[test]
    fn test_navigation_resets_deeper_state() {
        let (_api, mut coordinator) = setup(MockApi::default());
        assert_eq!(coordinator.state(), DownloadState::Idle);
        coordinator.select_observatory("node00001");
        assert_eq!(coordinator.state(), DownloadState::ObservatorySelected);

        coordinator.select_instrument("SBE37");
        assert_eq!(coordinator.state(), DownloadState::ParametersReady);
        let names: Vec<&str> = coordinator
            .parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["CNDC", "TEMP"]);
        assert_eq!(coordinator.metadata()["site"], MetaValue::from("OBSEA"));

        coordinator.select_observatory("node00002");
        assert_eq!(coordinator.state(), DownloadState::ObservatorySelected);
        assert!(coordinator.parameters().is_empty());
        assert!(coordinator.selected_instrument().is_none());
    }

    #[test]
    fn test_acoustic_branch_and_times() {
        let (_api, mut coordinator) = setup(MockApi::default());
        coordinator.select_observatory("node00001");
        coordinator.select_instrument(ACOUSTIC_INSTRUMENT);
        assert_eq!(coordinator.state(), DownloadState::DatesReady);
        assert!(coordinator.parameters().is_empty());
        assert_eq!(coordinator.list_times("2017-02-01"), vec!["10:00", "10:10"]);
        assert_eq!(coordinator.selected_date(), Some("2017-02-01"));
        assert!(coordinator.list_times("2019-01-01").is_empty());
    }

    #[test]
    fn test_select_instrument_requires_observatory() {
        let (_api, mut coordinator) = setup(MockApi::default());
        coordinator.select_instrument("SBE37");
        assert_eq!(
            coordinator.drain_events(),
            vec![status("no observatory selected")]
        );
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let mock = MockApi::default();
        mock.parameter_failures
            .lock()
            .unwrap()
            .insert("CNDC".into(), ApiStatus::NotFound);
        let (api, mut coordinator) = setup(mock);
        coordinator.select_observatory("node00001");
        coordinator.select_instrument("SBE37");

        let (tx, rx) = channel();
        coordinator
            .start_download(
                DownloadRequest::Parameters {
                    parameters: vec!["CNDC".into(), "TEMP".into()],
                    range: DateRange::Last(10),
                },
                tx.clone(),
            )
            .unwrap();
        assert!(coordinator.is_downloading());
        assert!(matches!(
            coordinator.start_download(
                DownloadRequest::Parameters {
                    parameters: vec!["TEMP".into()],
                    range: DateRange::Last(10),
                },
                tx,
            ),
            Err(Error::DownloadInProgress)
        ));

        let messages = collect(&rx);
        assert_eq!(api.observation_calls.load(Ordering::SeqCst), 2);
        let fragments: Vec<&WaterFrame> = messages
            .iter()
            .filter_map(|m| match m {
                DownloadMessage::Fragment(f) => Some(f.as_ref()),
                _ => None,
            })
            .collect();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].meaning["TEMP"].units, "degC");
        assert_eq!(fragments[0].metadata["site"], MetaValue::from("OBSEA"));
        assert!(matches!(
            messages.last(),
            Some(DownloadMessage::Finished { failed: 1 })
        ));

        coordinator.finish_download();
        assert!(!coordinator.is_downloading());
    }

    #[test]
    fn test_batch_stops_on_unauthorized() {
        let mock = MockApi::default();
        mock.parameter_failures
            .lock()
            .unwrap()
            .insert("CNDC".into(), ApiStatus::Unauthorized);
        let (api, mut coordinator) = setup(mock);
        coordinator.select_observatory("node00001");
        coordinator.select_instrument("SBE37");

        let (tx, rx) = channel();
        coordinator
            .start_download(
                DownloadRequest::Parameters {
                    parameters: vec!["CNDC".into(), "TEMP".into()],
                    range: DateRange::Last(10),
                },
                tx,
            )
            .unwrap();
        let messages = collect(&rx);
        assert_eq!(api.observation_calls.load(Ordering::SeqCst), 1);
        assert!(messages
            .iter()
            .any(|m| matches!(m, DownloadMessage::Failed(e) if e.is_unauthorized())));

        coordinator.finish_download();
        coordinator.drain_events();
        coordinator.handle_unauthorized();
        assert!(!coordinator.has_password());
        assert!(coordinator
            .drain_events()
            .contains(&CoordinatorEvent::CredentialRequired));
    }

    #[test]
    fn test_acoustic_download_converts_date() {
        let (_api, mut coordinator) = setup(MockApi::default());
        coordinator.select_observatory("node00001");
        coordinator.select_instrument(ACOUSTIC_INSTRUMENT);

        let (tx, rx) = channel();
        coordinator
            .start_download(
                DownloadRequest::Acoustic {
                    date: "2017-02-01".into(),
                    hour_minute: "10:00".into(),
                },
                tx,
            )
            .unwrap();
        let messages = collect(&rx);
        assert!(messages
            .iter()
            .any(|m| matches!(m, DownloadMessage::Fragment(f) if f.has_acoustic_data())));
    }
}
