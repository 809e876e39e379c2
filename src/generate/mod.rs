//! Image generation collaborator
//!
//! The generator receives the captured color view and its depth image and
//! returns a new color image of the same size.

pub mod webui;

use image::{GrayImage, RgbImage};

use crate::core::types::Result;

pub use webui::WebUiGenerator;

/// Inputs of one generation call
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Rendered colors of the captured view
    pub color_image: RgbImage,
    /// Denoised inverted depth image (near = bright) for conditioning
    pub depth_image: GrayImage,
}

impl GenerationRequest {
    pub fn dimensions(&self) -> (u32, u32) {
        self.color_image.dimensions()
    }
}

/// External image generator. Failures must be reported as
/// [`crate::core::Error::GenerationFailed`] so the session can keep going.
pub trait Generator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<RgbImage>;
}
