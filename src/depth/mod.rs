//! Depth buffers, 8-bit depth images and the depth-consistency filter
//!
//! The pipeline is: raw float depth -> (optional denoise) -> quantized
//! [`image::GrayImage`] -> per-pixel comparison of denoised vs. raw images
//! to split a picking buffer into trustworthy and occluded ids.

pub mod quantize;
pub mod denoise;
pub mod consistency;

pub use quantize::{DepthBuffer, DepthRange, BACKGROUND_DEPTH, create_depth_image};
pub use denoise::Denoise;
pub use consistency::{DepthConsistencyFilter, IdPartition, DEFAULT_DEVIATION, filter_ids};
