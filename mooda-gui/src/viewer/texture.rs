//! Spectrogram texture generation.

use egui::ColorImage;
use mooda_core::Spectrogram;

use crate::util::f64_to_f32;
use crate::viewer::Colormap;

/// Renders a spectrogram as an image with time along x and frequency
/// along y (lowest frequency at the bottom). Missing intensities are black.
#[must_use]
pub fn spectrogram_image(spectrogram: &Spectrogram, colormap: Colormap) -> ColorImage {
    let (n_times, n_freqs) = spectrogram.values.dim();
    let width = n_times.max(1);
    let height = n_freqs.max(1);
    let (min, max) = spectrogram.range().unwrap_or((0.0, 1.0));
    let span = if max > min { max - min } else { 1.0 };

    let mut pixels = vec![0u8; width * height * 4];
    for (t, row) in spectrogram.values.outer_iter().enumerate() {
        for (f, value) in row.iter().enumerate() {
            let y = height - 1 - f;
            let offset = (y * width + t) * 4;
            let rgba = if value.is_finite() {
                colormap.apply(f64_to_f32((value - min) / span))
            } else {
                [0, 0, 0, 255]
            };
            pixels[offset..offset + 4].copy_from_slice(&rgba);
        }
    }

    ColorImage::from_rgba_unmultiplied([width, height], &pixels)
}
