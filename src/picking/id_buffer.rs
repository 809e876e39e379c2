//! Per-pixel point ids recovered from a picking render

use std::collections::HashSet;

use image::{Rgb, RgbImage};

use crate::core::grid::Grid;
use crate::picking::codec::EMPTY;

/// Point index per pixel, [`EMPTY`] where nothing was rendered
pub type IdBuffer = Grid<u32>;

/// Distinct point indices referenced by the buffer, EMPTY excluded.
///
/// A point covering many pixels appears once.
pub fn flatten_and_filter(ids: &IdBuffer) -> HashSet<u32> {
    ids.as_slice()
        .iter()
        .copied()
        .filter(|&id| id != EMPTY)
        .collect()
}

/// Same ids as [`flatten_and_filter`], sorted ascending
pub fn sorted_unique(ids: &IdBuffer) -> Vec<u32> {
    let mut unique: Vec<u32> = flatten_and_filter(ids).into_iter().collect();
    unique.sort_unstable();
    unique
}

/// Number of pixels with no point
pub fn count_empty(ids: &IdBuffer) -> usize {
    ids.as_slice().iter().filter(|&&id| id == EMPTY).count()
}

/// Visualize ids as the low three encoded channels, which is what an RGB
/// view of the picking framebuffer shows. EMPTY pixels come out white.
pub fn id_visualization(ids: &IdBuffer) -> RgbImage {
    RgbImage::from_fn(ids.width(), ids.height(), |x, y| {
        let id = ids.get(x, y).copied().unwrap_or(EMPTY);
        let [r, g, b, _] = id.to_le_bytes();
        Rgb([r, g, b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_dedupes_and_drops_empty() {
        let ids = Grid::from_vec(3, 2, vec![4, 4, EMPTY, 1, 4, EMPTY]).unwrap();
        let set = flatten_and_filter(&ids);
        assert_eq!(set, HashSet::from([1, 4]));
        assert_eq!(sorted_unique(&ids), vec![1, 4]);
        assert_eq!(count_empty(&ids), 2);
    }

    #[test]
    fn test_all_empty() {
        let ids = Grid::new(4, 4, EMPTY);
        assert!(flatten_and_filter(&ids).is_empty());
        assert_eq!(count_empty(&ids), 16);
    }

    #[test]
    fn test_id_visualization() {
        let ids = Grid::from_vec(2, 1, vec![0x0001_0203, EMPTY]).unwrap();
        let img = id_visualization(&ids);
        assert_eq!(img.get_pixel(0, 0), &Rgb([3, 2, 1]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }
}
