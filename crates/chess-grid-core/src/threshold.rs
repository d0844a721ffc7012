//! Intensity thresholding of captured board images.
//!
//! Masks are plain [`GrayImage`]s holding `0` (off) or [`MASK_ON`] (on), so a
//! mask can be fed back into anything that accepts a gray image and distances
//! between masks stay on the familiar 0..255 scale.

use crate::{to_grayscale, ColorImageView, GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Value written for "on" mask pixels.
pub const MASK_ON: u8 = 255;

/// Intensity cutoffs used to split a capture into light and dark masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityCutoffs {
    /// Pixels at or above this value count as light.
    pub light: u8,
    /// Pixels at or below this value count as dark.
    pub dark: u8,
}

impl Default for IntensityCutoffs {
    fn default() -> Self {
        Self {
            light: 150,
            dark: 80,
        }
    }
}

/// Grayscale capture plus its light and dark masks.
#[derive(Clone, Debug)]
pub struct ThresholdedImage {
    pub gray: GrayImage,
    pub light: GrayImage,
    pub dark: GrayImage,
}

/// Stateless converter from a captured region to light/dark masks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageThresholder {
    cutoffs: IntensityCutoffs,
}

impl ImageThresholder {
    pub fn new(cutoffs: IntensityCutoffs) -> Self {
        Self { cutoffs }
    }

    #[inline]
    pub fn cutoffs(&self) -> IntensityCutoffs {
        self.cutoffs
    }

    /// Convert a color capture to grayscale and threshold it.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, src), fields(width = src.width, height = src.height))
    )]
    pub fn apply(&self, src: &ColorImageView<'_>) -> ThresholdedImage {
        self.apply_gray(to_grayscale(src))
    }

    /// Threshold an already-grayscale capture.
    pub fn apply_gray(&self, gray: GrayImage) -> ThresholdedImage {
        let light = light_mask(&gray.view(), self.cutoffs.light);
        let dark = dark_mask(&gray.view(), self.cutoffs.dark);
        ThresholdedImage { gray, light, dark }
    }
}

/// Mark pixels `>= cutoff`.
pub fn light_mask(gray: &GrayImageView<'_>, cutoff: u8) -> GrayImage {
    map_mask(gray, |v| v >= cutoff)
}

/// Mark pixels `<= cutoff`.
pub fn dark_mask(gray: &GrayImageView<'_>, cutoff: u8) -> GrayImage {
    map_mask(gray, |v| v <= cutoff)
}

fn map_mask(gray: &GrayImageView<'_>, on: impl Fn(u8) -> bool) -> GrayImage {
    GrayImage {
        width: gray.width,
        height: gray.height,
        data: gray
            .data
            .iter()
            .map(|&v| if on(v) { MASK_ON } else { 0 })
            .collect(),
    }
}

/// Fraction of "on" pixels in a mask, `0.0` for an empty mask.
pub fn coverage(mask: &GrayImageView<'_>) -> f32 {
    let total = mask.pixel_count();
    if total == 0 {
        return 0.0;
    }
    let on = mask.data.iter().filter(|&&v| v != 0).count();
    on as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(values: &[u8]) -> GrayImage {
        GrayImage {
            width: values.len(),
            height: 1,
            data: values.to_vec(),
        }
    }

    #[test]
    fn cutoffs_are_inclusive() {
        let thresholder = ImageThresholder::new(IntensityCutoffs {
            light: 150,
            dark: 80,
        });
        let out = thresholder.apply_gray(gray(&[79, 80, 81, 149, 150, 151]));
        assert_eq!(out.dark.data, vec![255, 255, 0, 0, 0, 0]);
        assert_eq!(out.light.data, vec![0, 0, 0, 0, 255, 255]);
    }

    #[test]
    fn coverage_counts_on_pixels() {
        let m = gray(&[0, 255, 255, 0]);
        assert!((coverage(&m.view()) - 0.5).abs() < 1e-6);
        assert_eq!(coverage(&GrayImage::new(0, 0).view()), 0.0);
    }
}
