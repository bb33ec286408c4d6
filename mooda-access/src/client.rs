//! Blocking HTTP client for the EMSODEV DMP API.
//!
//! Endpoints (relative to `ApiConfig::base_url`):
//! - `observatories`
//! - `observatories/{obs}/instruments`
//! - `observatories/{obs}/instruments/{inst}/metadata`
//! - `observatories/{obs}/instruments/{inst}/parameters`
//! - `observatories/{obs}/instruments/{inst}/parameters/{param}?startDate=&endDate=` or `?limit=`
//! - `observatories/{obs}/instruments/{inst}/acousticfiles/dates`
//! - `observatories/{obs}/instruments/{inst}/acousticfiles?date=&hourMinute=`
//!
//! Every request uses HTTP basic auth. Anything but 200 becomes
//! `Error::Status`; a request that never gets a status becomes
//! `Error::Connection`.

use std::collections::BTreeMap;

use mooda_core::{MetaValue, WaterFrame};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{
    AcousticDate, AcousticQuery, Auth, DateRange, EgimApi, Instrument, ObservationQuery, Parameter,
};
use crate::convert::{acoustic_to_frame, meta_value, observations_to_frame, AcousticRecord, Observation};
use crate::{ApiConfig, ApiStatus, Error, Result};

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct ObservatoryList {
    observatories: Vec<Named>,
}

#[derive(Deserialize)]
struct InstrumentList {
    instruments: Vec<Instrument>,
}

#[derive(Deserialize)]
struct ParameterList {
    parameters: Vec<Parameter>,
}

#[derive(Deserialize)]
struct ObservationList {
    observations: Vec<Observation>,
}

#[derive(Deserialize)]
struct AcousticFile {
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    observations: Vec<AcousticRecord>,
}

/// `EgimApi` over HTTP.
pub struct EgimClient {
    base_url: Url,
    http: Client,
}

impl EgimClient {
    /// Creates a client for `config.base_url`.
    ///
    /// # Errors
    /// Returns `Error::Connection` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Connection(format!("{}: {e}", config.base_url)))?;
        let http = Client::builder()
            .user_agent(concat!("mooda-gui/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Connection(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(
        &self,
        auth: &Auth,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(segments)?;
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .basic_auth(&auth.login, Some(&auth.password))
            .query(query)
            .send()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            log::warn!("EMSODEV API answered {status}");
            return Err(Error::Status(ApiStatus::from_code(status.as_u16())));
        }
        response
            .json::<T>()
            .map_err(|e| Error::Decode(e.to_string()))
    }
}

impl EgimApi for EgimClient {
    fn observatories(&self, auth: &Auth) -> Result<Vec<String>> {
        let list: ObservatoryList = self.get(auth, &["observatories"], &[])?;
        Ok(list.observatories.into_iter().map(|o| o.name).collect())
    }

    fn instruments(&self, auth: &Auth, observatory: &str) -> Result<Vec<Instrument>> {
        let list: InstrumentList =
            self.get(auth, &["observatories", observatory, "instruments"], &[])?;
        Ok(list.instruments)
    }

    fn metadata(
        &self,
        auth: &Auth,
        observatory: &str,
        instrument: &str,
    ) -> Result<BTreeMap<String, MetaValue>> {
        let raw: BTreeMap<String, Value> = self.get(
            auth,
            &["observatories", observatory, "instruments", instrument, "metadata"],
            &[],
        )?;
        Ok(raw.iter().map(|(k, v)| (k.clone(), meta_value(v))).collect())
    }

    fn parameters(
        &self,
        auth: &Auth,
        observatory: &str,
        instrument: &str,
    ) -> Result<Vec<Parameter>> {
        let list: ParameterList = self.get(
            auth,
            &["observatories", observatory, "instruments", instrument, "parameters"],
            &[],
        )?;
        Ok(list.parameters)
    }

    fn acoustic_dates(
        &self,
        auth: &Auth,
        observatory: &str,
        instrument: &str,
    ) -> Result<Vec<AcousticDate>> {
        self.get(
            auth,
            &[
                "observatories",
                observatory,
                "instruments",
                instrument,
                "acousticfiles",
                "dates",
            ],
            &[],
        )
    }

    fn observation(&self, auth: &Auth, query: &ObservationQuery) -> Result<WaterFrame> {
        let params = match query.range {
            DateRange::Between { start, end } => vec![
                ("startDate", start.format(DATE_FORMAT).to_string()),
                ("endDate", end.format(DATE_FORMAT).to_string()),
            ],
            DateRange::Last(n) => vec![("limit", n.to_string())],
        };
        let list: ObservationList = self.get(
            auth,
            &[
                "observatories",
                &query.observatory,
                "instruments",
                &query.instrument,
                "parameters",
                &query.parameter,
            ],
            &params,
        )?;
        observations_to_frame(&query.parameter, &list.observations)
    }

    fn acoustic_observation(&self, auth: &Auth, query: &AcousticQuery) -> Result<WaterFrame> {
        let file: AcousticFile = self.get(
            auth,
            &[
                "observatories",
                &query.observatory,
                "instruments",
                &query.instrument,
                "acousticfiles",
            ],
            &[
                ("date", query.date.clone()),
                ("hourMinute", query.hour_minute.clone()),
            ],
        )?;
        let mut frame = acoustic_to_frame(&file.observations)?;
        frame.metadata = file
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), meta_value(v)))
            .collect();
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_are_escaped() {
        let client = EgimClient::new(&ApiConfig {
            base_url: "http://api.example.org/v1/".into(),
            login: "emsodev".into(),
        })
        .unwrap();
        let url = client
            .url(&["observatories", "EGIM node 1", "instruments"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.example.org/v1/observatories/EGIM%20node%201/instruments"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = EgimClient::new(&ApiConfig {
            base_url: "not a url".into(),
            login: "emsodev".into(),
        });
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_unreachable_host_is_connection_error() {
        let client = EgimClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            login: "emsodev".into(),
        })
        .unwrap();
        let auth = Auth {
            login: "emsodev".into(),
            password: "secret".into(),
        };
        assert!(matches!(
            client.observatories(&auth),
            Err(Error::Connection(_))
        ));
    }
}
