//! Explicit per-call render state

use crate::core::types::{Mat4, Rgb};

/// Point size used for captures
pub const CAPTURE_POINT_SIZE: f32 = 1.5;

/// Everything a backend needs for one render call. Nothing is carried
/// between calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    /// Model-view-projection matrix (OpenGL clip conventions)
    pub mvp: Mat4,
    pub width: u32,
    pub height: u32,
    /// Splat edge length in pixels
    pub point_size: f32,
    pub depth_test: bool,
    pub blending: bool,
    pub multisample: bool,
    /// Clear color, channels in [0, 1]
    pub background: Rgb,
}

impl RenderRequest {
    /// Capture defaults: depth test on, blending and multisampling off,
    /// white background
    pub fn capture(mvp: Mat4, width: u32, height: u32) -> Self {
        Self {
            mvp,
            width,
            height,
            point_size: CAPTURE_POINT_SIZE,
            depth_test: true,
            blending: false,
            multisample: false,
            background: [1.0, 1.0, 1.0],
        }
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Blending or multisampling would mix the channels of neighbouring
    /// ids into values that decode to unrelated points
    pub fn is_pickable(&self) -> bool {
        !self.blending && !self.multisample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defaults() {
        let req = RenderRequest::capture(Mat4::IDENTITY, 640, 480);
        assert_eq!(req.point_size, CAPTURE_POINT_SIZE);
        assert!(req.depth_test);
        assert!(req.is_pickable());
        assert_eq!(req.background, [1.0; 3]);
        assert_eq!(req.pixel_count(), 640 * 480);
    }

    #[test]
    fn test_blending_is_not_pickable() {
        let mut req = RenderRequest::capture(Mat4::IDENTITY, 4, 4);
        req.blending = true;
        assert!(!req.is_pickable());
    }
}
