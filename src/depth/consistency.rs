//! Depth-consistency filter for picking buffers
//!
//! A picked id is trusted when the raw depth at its pixel stays within a
//! relative band around the denoised depth. Pixels outside the band are
//! typically points seen through gaps of a nearer surface, or antialiased
//! edges, and must not receive generated colors.

use image::GrayImage;
use rayon::prelude::*;

use crate::core::error::Error;
use crate::core::grid::Grid;
use crate::core::types::Result;
use crate::depth::denoise::Denoise;
use crate::depth::quantize::{DepthBuffer, DepthRange, quantize};
use crate::picking::{EMPTY, IdBuffer};

/// Default relative deviation θ
pub const DEFAULT_DEVIATION: f32 = 0.1;

/// Split `ids` into kept and removed buffers by comparing the denoised and
/// raw depth images.
///
/// Every non-EMPTY pixel ends up in exactly one of the two outputs; the
/// other output holds EMPTY there. EMPTY pixels stay EMPTY in both.
pub fn filter_ids(
    ids: &IdBuffer,
    filtered: &GrayImage,
    raw: &GrayImage,
    deviation: f32,
) -> Result<(IdBuffer, IdBuffer)> {
    let (w, h) = ids.dimensions();
    for (name, img) in [("filtered depth image", filtered), ("raw depth image", raw)] {
        if img.dimensions() != (w, h) {
            return Err(Error::InvalidDimensions(format!(
                "{} is {}x{}, id buffer is {}x{}",
                name, img.width(), img.height(), w, h
            )));
        }
    }

    let (kept, removed): (Vec<u32>, Vec<u32>) = ids
        .as_slice()
        .par_iter()
        .zip(filtered.as_raw().par_iter())
        .zip(raw.as_raw().par_iter())
        .map(|((&id, &f), &r)| {
            if id == EMPTY {
                return (EMPTY, EMPTY);
            }
            let f = f as f32;
            let r = r as f32;
            let upper = f * (1.0 + deviation);
            let lower = f * (1.0 - deviation);
            if r > upper || r < lower {
                (EMPTY, id)
            } else {
                (id, EMPTY)
            }
        })
        .unzip();

    Ok((Grid::from_vec(w, h, kept)?, Grid::from_vec(w, h, removed)?))
}

/// Result of a consistency pass, with the two depth images it compared
#[derive(Clone, Debug)]
pub struct IdPartition {
    /// Ids that passed the depth test
    pub kept: IdBuffer,
    /// Ids rejected as occluded or unreliable
    pub removed: IdBuffer,
    /// Denoised depth image (also the generation conditioning image)
    pub filtered_image: GrayImage,
    /// Depth image of the raw buffer
    pub raw_image: GrayImage,
}

impl IdPartition {
    pub fn kept_pixels(&self) -> usize {
        self.kept.as_slice().iter().filter(|&&id| id != EMPTY).count()
    }

    pub fn removed_pixels(&self) -> usize {
        self.removed.as_slice().iter().filter(|&&id| id != EMPTY).count()
    }

    /// 255 where a pixel was removed, 0 elsewhere
    pub fn removal_mask(&self) -> GrayImage {
        GrayImage::from_fn(self.removed.width(), self.removed.height(), |x, y| {
            let removed = self.removed.get(x, y).is_some_and(|&id| id != EMPTY);
            image::Luma([if removed { 255 } else { 0 }])
        })
    }
}

/// Denoise + quantize + compare, configured once per session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthConsistencyFilter {
    /// Relative band θ around the denoised depth
    pub deviation: f32,
    pub denoise: Denoise,
}

impl Default for DepthConsistencyFilter {
    fn default() -> Self {
        Self {
            deviation: DEFAULT_DEVIATION,
            denoise: Denoise::default(),
        }
    }
}

impl DepthConsistencyFilter {
    pub fn new(deviation: f32, denoise: Denoise) -> Self {
        Self { deviation, denoise }
    }

    /// Build the (filtered, raw) depth images of a buffer over its raw
    /// valid range
    pub fn depth_images(&self, depth: &DepthBuffer) -> Result<(GrayImage, GrayImage)> {
        let range = DepthRange::of(depth)?;
        let filtered = quantize(&self.denoise.apply(depth), range)?;
        let raw = quantize(depth, range)?;
        Ok((filtered, raw))
    }

    /// Partition a picking buffer using the depth buffer of the same view
    pub fn partition(&self, ids: &IdBuffer, depth: &DepthBuffer) -> Result<IdPartition> {
        if !ids.same_shape(depth) {
            return Err(Error::InvalidDimensions(format!(
                "id buffer is {}x{}, depth buffer is {}x{}",
                ids.width(), ids.height(), depth.width(), depth.height()
            )));
        }
        let (filtered_image, raw_image) = self.depth_images(depth)?;
        let (kept, removed) = filter_ids(ids, &filtered_image, &raw_image, self.deviation)?;
        let partition = IdPartition { kept, removed, filtered_image, raw_image };
        log::info!(
            "Depth consistency: kept {} px, removed {} px (deviation {})",
            partition.kept_pixels(),
            partition.removed_pixels(),
            self.deviation
        );
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::quantize::BACKGROUND_DEPTH;

    /// Deterministic pseudo-random sequence for property checks
    fn lcg(seed: &mut u64) -> u32 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (*seed >> 33) as u32
    }

    #[test]
    fn test_band_decision() {
        let ids = Grid::from_vec(4, 1, vec![0, 1, 2, EMPTY]).unwrap();
        let filtered = GrayImage::from_raw(4, 1, vec![100, 100, 100, 100]).unwrap();
        let raw = GrayImage::from_raw(4, 1, vec![110, 111, 89, 0]).unwrap();
        let (kept, removed) = filter_ids(&ids, &filtered, &raw, 0.1).unwrap();
        assert_eq!(kept.as_slice(), &[0, EMPTY, EMPTY, EMPTY]);
        assert_eq!(removed.as_slice(), &[EMPTY, 1, 2, EMPTY]);
    }

    #[test]
    fn test_partition_law() {
        let mut seed = 7u64;
        let (w, h) = (16, 12);
        let ids: Vec<u32> = (0..w * h)
            .map(|i| if lcg(&mut seed) % 5 == 0 { EMPTY } else { i })
            .collect();
        let ids = Grid::from_vec(w, h, ids).unwrap();
        let filtered = GrayImage::from_fn(w, h, |_, _| image::Luma([(lcg(&mut seed) % 256) as u8]));
        let raw = GrayImage::from_fn(w, h, |_, _| image::Luma([(lcg(&mut seed) % 256) as u8]));

        let (kept, removed) = filter_ids(&ids, &filtered, &raw, DEFAULT_DEVIATION).unwrap();
        for ((&src, &k), &r) in ids.as_slice().iter().zip(kept.as_slice()).zip(removed.as_slice()) {
            if src == EMPTY {
                assert_eq!((k, r), (EMPTY, EMPTY));
            } else {
                assert!((k != EMPTY) ^ (r != EMPTY));
                assert!(k == src || r == src);
            }
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let ids = Grid::new(2, 2, 0u32);
        let small = GrayImage::new(1, 2);
        let ok = GrayImage::new(2, 2);
        assert!(matches!(filter_ids(&ids, &small, &ok, 0.1), Err(Error::InvalidDimensions(_))));
        assert!(matches!(filter_ids(&ids, &ok, &small, 0.1), Err(Error::InvalidDimensions(_))));

        let depth = Grid::new(3, 2, 0.5f32);
        let filter = DepthConsistencyFilter::default();
        assert!(matches!(filter.partition(&ids, &depth), Err(Error::InvalidDimensions(_))));
    }

    #[test]
    fn test_outlier_pixel_is_removed() {
        // flat surface at 0.5 with one sample leaking through at 0.2
        let (w, h) = (8u32, 8u32);
        let mut depth = Grid::new(w, h, 0.5f32);
        depth.set(3, 3, 0.2);
        let ids = Grid::from_vec(w, h, (0..w * h).collect()).unwrap();

        let partition = DepthConsistencyFilter::default().partition(&ids, &depth).unwrap();
        assert_eq!(partition.removed_pixels(), 1);
        assert_eq!(partition.removed.get(3, 3), Some(&(3 * w + 3)));
        assert_eq!(partition.kept.get(3, 3), Some(&EMPTY));
        assert_eq!(partition.kept_pixels(), (w * h - 1) as usize);

        let mask = partition.removal_mask();
        assert_eq!(mask.get_pixel(3, 3).0, [255]);
        assert_eq!(mask.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn test_empty_view_propagates() {
        let depth = Grid::new(4, 4, BACKGROUND_DEPTH);
        let ids = Grid::new(4, 4, EMPTY);
        let err = DepthConsistencyFilter::default().partition(&ids, &depth).unwrap_err();
        assert!(matches!(err, Error::EmptyDepthRange));
    }

    #[test]
    fn test_empty_ids_stay_empty() {
        let mut depth = Grid::new(4, 4, BACKGROUND_DEPTH);
        depth.set(1, 1, 0.3);
        let mut ids = Grid::new(4, 4, EMPTY);
        ids.set(1, 1, 9);
        let partition = DepthConsistencyFilter::default().partition(&ids, &depth).unwrap();
        let total = partition.kept_pixels() + partition.removed_pixels();
        assert_eq!(total, 1);
        for (x, y, &id) in ids.enumerate() {
            if id == EMPTY {
                assert_eq!(partition.kept.get(x, y), Some(&EMPTY));
                assert_eq!(partition.removed.get(x, y), Some(&EMPTY));
            }
        }
    }
}
