//! Deterministic test clouds
//!
//! Used by tests, benchmarks and the demo binary in place of scanned data.

use crate::cloud::PointCloud;
use crate::core::types::{Quat, Vec3};

/// One point per pixel center of a `width x height` viewport on the z=0
/// plane, in NDC coordinates. Index `i` is row-major from the bottom-left,
/// so an identity MVP renders index `y * width + x` at OpenGL pixel (x, y).
pub fn pixel_grid(width: u32, height: u32) -> PointCloud {
    let mut positions = Vec::with_capacity(width as usize * height as usize);
    let mut colors = Vec::with_capacity(positions.capacity());
    for y in 0..height {
        for x in 0..width {
            let xn = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
            let yn = (y as f32 + 0.5) / height as f32 * 2.0 - 1.0;
            positions.push(Vec3::new(xn, yn, 0.0));
            colors.push([
                x as f32 / width.max(1) as f32,
                y as f32 / height.max(1) as f32,
                0.5,
            ]);
        }
    }
    PointCloud::from_parts(positions, colors)
}

/// [`pixel_grid`] rotated by `angle` radians around the X axis, giving a
/// plane whose depth varies linearly with screen row.
pub fn tilted_plane(width: u32, height: u32, angle: f32) -> PointCloud {
    let rotation = Quat::from_rotation_x(angle);
    let grid = pixel_grid(width, height);
    let positions = grid.positions().iter().map(|p| rotation * *p).collect();
    PointCloud::from_parts(positions, grid.colors().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_grid_layout() {
        let cloud = pixel_grid(4, 2);
        assert_eq!(cloud.len(), 8);
        assert_eq!(cloud.positions()[0], Vec3::new(-0.75, -0.5, 0.0));
        assert_eq!(cloud.positions()[5], Vec3::new(-0.25, 0.5, 0.0));
    }

    #[test]
    fn test_tilted_plane_depth_varies() {
        let cloud = tilted_plane(2, 2, std::f32::consts::FRAC_PI_4);
        let z_bottom = cloud.positions()[0].z;
        let z_top = cloud.positions()[2].z;
        assert!(z_bottom < 0.0);
        assert!(z_top > 0.0);
        assert_eq!(cloud.colors(), pixel_grid(2, 2).colors());
    }
}
