//! Application state modules.

mod download;
mod panels;
mod plots;
mod session;
mod ui;

pub use download::DownloadForm;
pub use panels::{
    flag_choices, DropMode, DropOptions, PanelError, PanelOptions, QcOptions, RenameOptions,
    ResampleOptions, SelectorPanel, Selection, SliceOptions,
};
pub use plots::{rescale, value_range, Figure, PlotKind, PlotView, QC_BAR_NAME};
pub use session::{PanelRequest, Session};
pub use ui::{PlotMode, UiState};
