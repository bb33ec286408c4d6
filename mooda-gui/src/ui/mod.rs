//! UI rendering modules.
//!
//! Contains the UI rendering logic split into separate modules:
//! - `menu`: Menu bar and keyboard shortcuts
//! - `side_panel`: Left sidebar with data list and plot controls
//! - `main_view`: Central panel with metadata and the datalog
//! - `panels`: Drop, QC, rename, resample and slice windows
//! - `plot_window`: One window per plot view
//! - `downloader`: EGIM downloader and password prompt
//! - `status_bar`: Bottom status line

mod downloader;
mod main_view;
mod menu;
mod panels;
mod plot_window;
mod side_panel;
mod status_bar;
pub mod theme;
