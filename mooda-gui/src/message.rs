//! Application message types for async communication.
//!
//! Messages are sent from background worker threads to the main UI thread
//! via channels and drained once per frame.

use std::path::PathBuf;

use mooda_access::DownloadMessage;
use mooda_core::WaterFrame;

/// Messages sent from background workers to the UI thread.
pub enum AppMessage {
    /// A file was read.
    LoadComplete {
        path: PathBuf,
        frame: Box<WaterFrame>,
        /// Append to the current dataset instead of replacing it.
        append: bool,
    },

    /// A file could not be read.
    LoadError { path: PathBuf, error: String },

    /// Progress of the EGIM download worker.
    Download(DownloadMessage),
}

impl From<DownloadMessage> for AppMessage {
    fn from(message: DownloadMessage) -> Self {
        AppMessage::Download(message)
    }
}
