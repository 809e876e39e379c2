//! Row-major 2D buffers shared by id, depth and mask images
//!
//! Row 0 is the top of the screen. Offscreen readbacks that arrive
//! bottom-up (OpenGL origin) are normalized with [`Grid::flip_vertical`].

use crate::core::error::Error;
use crate::core::types::Result;

/// A `width x height` grid of cells stored row by row.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `fill`
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }

    /// Reverse the row order in place
    pub fn flip_vertical(&mut self) {
        let w = self.width as usize;
        let h = self.height as usize;
        for y in 0..h / 2 {
            let (top, bottom) = self.data.split_at_mut((h - 1 - y) * w);
            top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }
}

impl<T> Grid<T> {
    /// Wrap existing row-major data. Fails if the length does not match.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidDimensions(format!(
                "{}x{} grid needs {} cells, got {}",
                width, height, expected, data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Cell at column `x`, row `y` (row 0 = top)
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(self.offset(x, y))
        } else {
            None
        }
    }

    /// Overwrite a cell. Returns false if out of bounds.
    pub fn set(&mut self, x: u32, y: u32, value: T) -> bool {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.data[i] = value;
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Same width and height as `other`
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Error out unless this grid has the given dimensions
    pub fn expect_dimensions(&self, width: u32, height: u32, what: &str) -> Result<()> {
        if self.dimensions() != (width, height) {
            return Err(Error::InvalidDimensions(format!(
                "{} is {}x{}, expected {}x{}",
                what, self.width, self.height, width, height
            )));
        }
        Ok(())
    }

    /// Apply `f` to every cell, keeping the shape
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Iterate `(x, y, &cell)` in row-major order
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        let w = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| ((i as u32) % w, (i as u32) / w, v))
    }
}
