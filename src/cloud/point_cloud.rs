//! Point positions with a parallel color buffer

use crate::core::error::Error;
use crate::core::types::{Result, Rgb, Vec3};
use crate::math::Aabb;

/// Ordered point positions and their colors, 1:1 by index.
///
/// Index `i` denotes the same physical point until the owning store prunes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<Vec3>,
    colors: Vec<Rgb>,
}

impl PointCloud {
    /// Build a cloud from parallel arrays. Colors are clamped to [0, 1].
    pub fn new(positions: Vec<Vec3>, colors: Vec<Rgb>) -> Result<Self> {
        if positions.len() != colors.len() {
            return Err(Error::InvalidDimensions(format!(
                "{} positions but {} colors",
                positions.len(),
                colors.len()
            )));
        }
        let colors = colors.into_iter().map(clamp_color).collect();
        Ok(Self { positions, colors })
    }

    /// Cloud with every point set to the same color
    pub fn uniform(positions: Vec<Vec3>, color: Rgb) -> Self {
        let colors = vec![clamp_color(color); positions.len()];
        Self { positions, colors }
    }

    /// Build from 16-bit per channel colors (the LAS convention)
    pub fn from_rgb16(positions: Vec<Vec3>, colors: &[[u16; 3]]) -> Result<Self> {
        let colors = colors
            .iter()
            .map(|c| c.map(|v| v as f32 / u16::MAX as f32))
            .collect();
        Self::new(positions, colors)
    }

    /// Parallel arrays already known to be the same length with colors in range
    pub(crate) fn from_parts(positions: Vec<Vec3>, colors: Vec<Rgb>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self { positions, colors }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub(crate) fn colors_mut(&mut self) -> &mut [Rgb] {
        &mut self.colors
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Fit the cloud into the canonical cube [-1, 1]^3.
    ///
    /// All axes share one scale factor taken from the widest axis, so
    /// proportions are preserved. A cloud with zero extent is only centered.
    pub fn normalize(&mut self) {
        let Some(bounds) = self.bounds() else {
            return;
        };
        let center = bounds.center();
        let extent = bounds.largest_extent();
        let scale = if extent > 0.0 { 2.0 / extent } else { 1.0 };
        for p in &mut self.positions {
            *p = (*p - center) * scale;
        }
        log::debug!("Normalized {} points (extent {:.3}, scale {:.5})", self.len(), extent, scale);
    }

    /// New cloud holding the given indices in the given order.
    /// Out-of-range indices are an error.
    pub fn subset(&self, indices: &[u32]) -> Result<Self> {
        let mut positions = Vec::with_capacity(indices.len());
        let mut colors = Vec::with_capacity(indices.len());
        for &i in indices {
            let i = i as usize;
            if i >= self.len() {
                return Err(Error::StaleIndexReference(format!(
                    "point {} out of range for {} points",
                    i,
                    self.len()
                )));
            }
            positions.push(self.positions[i]);
            colors.push(self.colors[i]);
        }
        Ok(Self { positions, colors })
    }
}

fn clamp_color(c: Rgb) -> Rgb {
    c.map(|v| v.clamp(0.0, 1.0))
}
