//! Colormaps for spectrograms and the QC flag palette.

use eframe::egui::Color32;

use crate::util::f32_to_u8;
use mooda_core::QcFlag;

/// Available colormaps for spectrogram intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Approximate Viridis, blue through green to yellow.
    #[default]
    Viridis,
    /// Black to red to yellow to white.
    Hot,
    /// Black to white.
    Grayscale,
}

impl Colormap {
    pub const ALL: [Colormap; 3] = [Colormap::Viridis, Colormap::Hot, Colormap::Grayscale];

    /// Apply the colormap to a normalized value [0, 1] and return RGBA bytes.
    #[must_use]
    pub fn apply(self, val: f32) -> [u8; 4] {
        let val = if val.is_finite() {
            val.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self {
            Colormap::Grayscale => {
                let v = f32_to_u8(val * 255.0);
                [v, v, v, 255]
            }
            Colormap::Hot => {
                if val < 0.5 {
                    [255, f32_to_u8(val * 2.0 * 255.0), 0, 255]
                } else {
                    [255, 255, f32_to_u8((val - 0.5) * 2.0 * 255.0), 255]
                }
            }
            Colormap::Viridis => {
                let r = f32_to_u8(255.0 * val.powf(2.0));
                let g = f32_to_u8(255.0 * val);
                let b = f32_to_u8(255.0 * (1.0 - val));
                [r, g, b, 255]
            }
        }
    }
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Viridis => write!(f, "Viridis"),
            Colormap::Hot => write!(f, "Hot"),
            Colormap::Grayscale => write!(f, "Grayscale"),
        }
    }
}

/// Marker color of a QC flag in QC plots and bars.
#[must_use]
pub fn flag_color(flag: QcFlag) -> Color32 {
    match flag.value() {
        0 => Color32::from_rgb(0x88, 0x88, 0x88),
        1 => Color32::from_rgb(0x10, 0xb9, 0x81),
        2 => Color32::from_rgb(0x4a, 0x9e, 0xff),
        3 => Color32::from_rgb(0xf5, 0x9e, 0x0b),
        4 => Color32::from_rgb(0xef, 0x44, 0x44),
        5 => Color32::from_rgb(0x8b, 0x5c, 0xf6),
        6 => Color32::from_rgb(0xec, 0x48, 0x99),
        7 => Color32::from_rgb(0x06, 0xb6, 0xd4),
        8 => Color32::from_rgb(0x84, 0xcc, 0x16),
        _ => Color32::from_rgb(0x6b, 0x72, 0x80),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Grayscale.apply(0.0), [0, 0, 0, 255]);
        assert_eq!(Colormap::Grayscale.apply(1.0), [255, 255, 255, 255]);
        assert_eq!(Colormap::Hot.apply(1.0), [255, 255, 255, 255]);
        assert_eq!(Colormap::Viridis.apply(2.0), Colormap::Viridis.apply(1.0));
        assert_eq!(Colormap::Viridis.apply(f32::NAN), Colormap::Viridis.apply(0.0));
    }

    #[test]
    fn test_flag_palette_is_distinct_for_good_and_bad() {
        assert_ne!(flag_color(QcFlag::GOOD), flag_color(QcFlag::BAD));
    }
}
