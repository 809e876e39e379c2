//! One captured view, ready for generation and merge

use std::collections::HashSet;

use image::{GrayImage, RgbImage};

use crate::generate::GenerationRequest;
use crate::picking::{IdBuffer, flatten_and_filter};

/// Rendered view plus the ids that passed the depth-consistency filter.
///
/// `ids` index into the store as it was at `epoch`; merging after a
/// prune or reset is rejected.
#[derive(Clone, Debug)]
pub struct ScreenCapture {
    pub color_image: RgbImage,
    /// Denoised depth image (near = bright), the generation conditioning
    pub depth_image: GrayImage,
    pub width: u32,
    pub height: u32,
    /// Kept ids
    pub ids: IdBuffer,
    /// Ids rejected by the depth filter
    pub removed: IdBuffer,
    pub epoch: u64,
}

impl ScreenCapture {
    /// Distinct points this capture can texture
    pub fn visible_points(&self) -> HashSet<u32> {
        flatten_and_filter(&self.ids)
    }

    pub fn generation_request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            color_image: self.color_image.clone(),
            depth_image: self.depth_image.clone(),
        }
    }
}
