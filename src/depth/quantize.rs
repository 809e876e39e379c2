//! Quantization of float depth buffers into 8-bit depth images

use image::GrayImage;
use rayon::prelude::*;

use crate::core::error::Error;
use crate::core::grid::Grid;
use crate::core::types::Result;
use crate::depth::denoise::Denoise;

/// Normalized window depth per pixel, [`BACKGROUND_DEPTH`] where empty
pub type DepthBuffer = Grid<f32>;

/// Depth value of a pixel no point was rendered to
pub const BACKGROUND_DEPTH: f32 = 1.0;

/// Highest 8-bit level
const LEVELS: f32 = 255.0;

#[inline]
pub fn is_background(depth: f32) -> bool {
    depth >= BACKGROUND_DEPTH
}

/// Min/max over the valid (non-background) samples of a depth buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthRange {
    pub min: f32,
    pub max: f32,
}

impl DepthRange {
    /// Scan the buffer. Fails with [`Error::EmptyDepthRange`] when every
    /// pixel is background.
    pub fn of(buffer: &DepthBuffer) -> Result<Self> {
        buffer
            .as_slice()
            .iter()
            .copied()
            .filter(|&d| !is_background(d))
            .fold(None, |acc: Option<DepthRange>, d| {
                Some(match acc {
                    None => DepthRange { min: d, max: d },
                    Some(r) => DepthRange { min: r.min.min(d), max: r.max.max(d) },
                })
            })
            .ok_or(Error::EmptyDepthRange)
    }

    /// Range collapses to a single level
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Uniform step between consecutive 8-bit levels
    pub fn step(&self) -> f32 {
        (self.max - self.min) / LEVELS
    }

    /// Map one depth sample to its inverted 8-bit level (near = bright).
    /// Ties round to the even level.
    /// Background takes the code of `max`. Out-of-range values saturate.
    pub fn level(&self, depth: f32) -> u8 {
        let depth = if is_background(depth) { self.max } else { depth };
        let level = if self.is_degenerate() {
            0.0
        } else {
            ((depth - self.min) / self.step()).round_ties_even().clamp(0.0, LEVELS)
        };
        (LEVELS - level) as u8
    }
}

/// Quantize `buffer` over `range`
pub fn quantize(buffer: &DepthBuffer, range: DepthRange) -> Result<GrayImage> {
    let levels: Vec<u8> = buffer.as_slice().par_iter().map(|&d| range.level(d)).collect();
    GrayImage::from_raw(buffer.width(), buffer.height(), levels).ok_or_else(|| {
        Error::InvalidDimensions(format!(
            "cannot build {}x{} depth image",
            buffer.width(),
            buffer.height()
        ))
    })
}

/// Convert a depth buffer to an 8-bit depth image whose range is the
/// buffer's valid min/max. With `denoise`, the denoising passes run first
/// but the range still comes from the raw samples.
pub fn create_depth_image(buffer: &DepthBuffer, denoise: Option<&Denoise>) -> Result<GrayImage> {
    let range = DepthRange::of(buffer)?;
    log::debug!(
        "Depth range [{:.5}, {:.5}]{}",
        range.min,
        range.max,
        if range.is_degenerate() { " (single level)" } else { "" }
    );
    match denoise {
        Some(denoise) => quantize(&denoise.apply(buffer), range),
        None => quantize(buffer, range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_fails() {
        let buffer = Grid::new(4, 4, BACKGROUND_DEPTH);
        assert!(matches!(DepthRange::of(&buffer), Err(Error::EmptyDepthRange)));
        assert!(matches!(create_depth_image(&buffer, None), Err(Error::EmptyDepthRange)));
    }

    #[test]
    fn test_levels_are_inverted() {
        let buffer = Grid::from_vec(3, 1, vec![0.2, 0.8, BACKGROUND_DEPTH]).unwrap();
        let img = create_depth_image(&buffer, None).unwrap();
        // nearest is brightest, farthest and background share level 0
        assert_eq!(img.as_raw(), &vec![255, 0, 0]);
    }

    #[test]
    fn test_midpoint_rounds_to_nearest() {
        let buffer = Grid::from_vec(3, 1, vec![0.0, 0.5, 0.9]).unwrap();
        let range = DepthRange::of(&buffer).unwrap();
        assert_eq!(range, DepthRange { min: 0.0, max: 0.9 });
        let img = quantize(&buffer, range).unwrap();
        // 0.5 / (0.9 / 255) = 141.67 -> 142 -> 255 - 142
        assert_eq!(img.as_raw()[1], 113);
    }

    #[test]
    fn test_degenerate_range_single_level() {
        let mut buffer = Grid::new(3, 3, BACKGROUND_DEPTH);
        buffer.set(0, 0, 0.4);
        buffer.set(2, 1, 0.4);
        let range = DepthRange::of(&buffer).unwrap();
        assert!(range.is_degenerate());
        let img = create_depth_image(&buffer, None).unwrap();
        assert!(img.as_raw().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_ties_round_to_even() {
        let range = DepthRange { min: 0.0, max: 255.0 / 1024.0 };
        assert_eq!(range.level(0.5 / 1024.0), 255);
        assert_eq!(range.level(1.5 / 1024.0), 253);
        assert_eq!(range.level(2.5 / 1024.0), 253);
    }

    #[test]
    fn test_level_saturates() {
        let range = DepthRange { min: 0.2, max: 0.4 };
        assert_eq!(range.level(0.6), 0);
        assert_eq!(range.level(0.1), 255);
        assert_eq!(range.level(0.999), 0);
    }
}
