//! Download worker.
//!
//! Runs on its own thread and performs one blocking request per parameter,
//! strictly in sequence. Results travel back to the UI thread as
//! `DownloadMessage`s so each fragment can be merged as soon as it arrives.

use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

use mooda_core::{Meaning, MetaValue, WaterFrame};

use crate::api::{AcousticQuery, Auth, EgimApi, ObservationQuery};
use crate::Error;

/// Messages sent from the download worker to the UI thread.
#[derive(Debug)]
pub enum DownloadMessage {
    /// Progress text for the status bar.
    Status(String),
    /// One downloaded frame, ready to be merged.
    Fragment(Box<WaterFrame>),
    /// One request failed. A 401 ends the batch.
    Failed(Error),
    /// The worker is done.
    Finished {
        /// Number of failed requests.
        failed: usize,
    },
}

/// Work handed to the download thread.
#[derive(Debug, Clone)]
pub enum DownloadJob {
    /// One request per parameter.
    Parameters {
        queries: Vec<ObservationQuery>,
        /// Instrument metadata attached to every fragment.
        metadata: BTreeMap<String, MetaValue>,
        meaning: BTreeMap<String, Meaning>,
    },
    /// A single acoustic recording.
    Acoustic(AcousticQuery),
}

/// Worker entry point.
///
/// Messages are converted into the caller's channel type so the UI can
/// multiplex downloads with its other workers.
pub fn run_download<M>(api: &dyn EgimApi, auth: &Auth, job: DownloadJob, tx: &Sender<M>)
where
    M: From<DownloadMessage>,
{
    let send = |message: DownloadMessage| {
        // The receiver is gone when the window closed mid-download.
        let _ = tx.send(M::from(message));
    };
    let mut failed = 0;
    match job {
        DownloadJob::Parameters {
            queries,
            metadata,
            meaning,
        } => {
            for query in queries {
                send(DownloadMessage::Status(format!(
                    "Downloading {}",
                    query.parameter
                )));
                log::info!("Downloading {} from {}", query.parameter, query.instrument);
                match api.observation(auth, &query) {
                    Ok(mut frame) => {
                        frame.metadata.clone_from(&metadata);
                        if let Some(m) = meaning.get(&query.parameter) {
                            frame.meaning.insert(query.parameter.clone(), m.clone());
                        }
                        send(DownloadMessage::Fragment(Box::new(frame)));
                    }
                    Err(e) => {
                        log::warn!("Download of {} failed: {e}", query.parameter);
                        failed += 1;
                        let stop = e.is_unauthorized();
                        send(DownloadMessage::Failed(e));
                        if stop {
                            break;
                        }
                    }
                }
            }
        }
        DownloadJob::Acoustic(query) => {
            send(DownloadMessage::Status(format!(
                "Downloading acoustic file from {}, {}",
                query.date, query.hour_minute
            )));
            match api.acoustic_observation(auth, &query) {
                Ok(frame) => send(DownloadMessage::Fragment(Box::new(frame))),
                Err(e) => {
                    log::warn!("Acoustic download failed: {e}");
                    failed += 1;
                    send(DownloadMessage::Failed(e));
                }
            }
        }
    }
    send(DownloadMessage::Finished { failed });
}
