//! Raster rendering for plot views egui_plot cannot draw natively.

mod colormap;
mod texture;

pub use colormap::{flag_color, Colormap};
pub use texture::spectrogram_image;
