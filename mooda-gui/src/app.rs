//! Main application state and logic.
//!
//! Contains the `MoodaApp` struct which owns the session, the downloader
//! and the worker channel, and routes worker messages back into the
//! session on the UI thread.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use eframe::egui;
use mooda_access::{
    CoordinatorEvent, DownloadCoordinator, DownloadMessage, DownloadRequest, EgimClient,
};

use crate::config::AppConfig;
use crate::message::AppMessage;
use crate::state::{DownloadForm, Session, UiState};

/// Main application state.
pub struct MoodaApp {
    /// Dataset, panels, plot views and logs.
    pub(crate) session: Session,
    /// UI display state.
    pub(crate) ui_state: UiState,
    /// EGIM hierarchy cursor.
    pub(crate) downloader: DownloadCoordinator,
    pub(crate) download_form: DownloadForm,
    pub(crate) config: AppConfig,

    /// Message receiver for async operations.
    pub(crate) rx: Receiver<AppMessage>,
    /// Message sender for async operations.
    pub(crate) tx: Sender<AppMessage>,

    /// Cached spectrogram texture, dropped whenever the dataset changes.
    pub(crate) spectrogram_texture: Option<egui::TextureHandle>,
}

impl MoodaApp {
    /// Creates the application with an HTTP client for `config.api`.
    ///
    /// # Errors
    /// Returns `mooda_access::Error::Connection` if the API URL is invalid.
    pub fn new(config: AppConfig) -> mooda_access::Result<Self> {
        let client = EgimClient::new(&config.api)?;
        let downloader = DownloadCoordinator::new(Arc::new(client), config.api.login.clone());
        let (tx, rx) = channel();
        Ok(Self {
            session: Session::default(),
            ui_state: UiState::default(),
            downloader,
            download_form: DownloadForm::default(),
            config,
            rx,
            tx,
            spectrogram_texture: None,
        })
    }

    /// Read a file asynchronously, replacing or extending the dataset.
    pub fn load_file(&mut self, path: PathBuf, append: bool) {
        self.ui_state.is_loading = true;
        self.session.set_status("Opening data");

        let tx = self.tx.clone();
        thread::spawn(move || {
            let message = match mooda_io::open(&path) {
                Ok(frame) => AppMessage::LoadComplete {
                    path,
                    frame: Box::new(frame),
                    append,
                },
                Err(e) => AppMessage::LoadError {
                    path,
                    error: e.to_string(),
                },
            };
            // The receiver is gone when the window closed mid-read.
            let _ = tx.send(message);
        });
    }

    /// Discards the dataset.
    pub fn new_project(&mut self) {
        self.session.new_project();
        self.ui_state.selected_keys.clear();
        self.spectrogram_texture = None;
    }

    /// Writes the dataset where the user chooses.
    pub fn save_as(&mut self) {
        let mut dialog = rfd::FileDialog::new();
        for format in mooda_io::SAVE_FORMATS {
            dialog = dialog.add_filter(format.to_string(), &[format.extension()]);
        }
        if let Some(path) = dialog.save_file() {
            self.session.save(&path);
        }
    }

    /// Asks for a file and reads it.
    pub fn open_dialog(&mut self, append: bool) {
        let mut dialog = rfd::FileDialog::new();
        for format in mooda_io::OPEN_FORMATS {
            dialog = dialog.add_filter(format.to_string(), &[format.extension()]);
        }
        if let Some(path) = dialog.pick_file() {
            self.load_file(path, append);
        }
    }

    /// Opens the downloader, asking for the password first if needed.
    pub fn open_downloader(&mut self) {
        self.ui_state.show_downloader = true;
        if self.downloader.observatories().is_empty() {
            self.downloader.reload();
        }
    }

    /// Starts a download for the downloader's current selection.
    pub fn start_download(&mut self, request: DownloadRequest) {
        self.session.set_status("Downloading data");
        if let Err(e) = self.downloader.start_download(request, self.tx.clone()) {
            log::warn!("Download not started: {e}");
            self.session.set_status(e.status_message());
        }
    }

    /// Opens the panes that display a freshly loaded dataset.
    fn show_dataset(&mut self) {
        self.ui_state.show_parameters = true;
        self.ui_state.show_metadata = true;
        self.ui_state.show_datalog = true;
    }

    /// Drops UI caches that depend on the dataset. Runs after every
    /// dataset change.
    pub(crate) fn dataset_changed(&mut self) {
        self.spectrogram_texture = None;
        let parameters = self.session.frame.parameters();
        self.ui_state.retain_keys(&parameters);
    }

    /// Handle pending messages from async workers.
    pub fn handle_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                AppMessage::LoadComplete {
                    path,
                    frame,
                    append,
                } => {
                    self.ui_state.is_loading = false;
                    self.session.load(*frame, &path, append);
                    self.show_dataset();
                    self.dataset_changed();
                }
                AppMessage::LoadError { path, error } => {
                    self.ui_state.is_loading = false;
                    log::warn!("Error opening {}: {error}", path.display());
                    self.session.log(format!("Error opening {}: {error}", path.display()));
                    self.session.set_status("Error opening data");
                }
                AppMessage::Download(message) => self.handle_download(message),
            }
        }

        for event in self.downloader.drain_events() {
            match event {
                CoordinatorEvent::Status(text) => self.session.set_status(text),
                CoordinatorEvent::CredentialRequired => {
                    self.ui_state.password_prompt = Some(String::new());
                }
            }
        }
    }

    fn handle_download(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::Status(text) => self.session.set_status(text),
            DownloadMessage::Fragment(frame) => {
                if self.session.merge(*frame) {
                    self.show_dataset();
                    self.dataset_changed();
                }
            }
            DownloadMessage::Failed(error) => {
                if error.is_unauthorized() {
                    self.downloader.handle_unauthorized();
                } else {
                    let text = error.status_message();
                    self.session.log(text.clone());
                    self.session.set_status(text);
                }
            }
            DownloadMessage::Finished { failed } => {
                self.downloader.finish_download();
                if failed == 0 {
                    self.session.set_status("Ready");
                } else {
                    self.session
                        .log(format!("Download finished with {failed} failed requests"));
                }
            }
        }
    }
}

impl eframe::App for MoodaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        crate::ui::theme::apply_system_theme(ctx);
        self.handle_messages();
        self.handle_shortcuts(ctx);

        self.render_menu_bar(ctx);
        self.render_bottom_panel(ctx);
        self.render_side_panel(ctx);
        self.render_central_panel(ctx);
        self.render_panel_windows(ctx);
        self.render_plot_windows(ctx);
        self.render_downloader(ctx);
        self.render_password_prompt(ctx);

        if self.ui_state.is_loading || self.downloader.is_downloading() {
            ctx.request_repaint();
        }
    }
}
