//! Renderer capability trait

use image::RgbImage;

use crate::cloud::PointCloud;
use crate::core::types::Result;
use crate::depth::DepthBuffer;
use crate::picking::IdBuffer;
use crate::render::request::RenderRequest;

/// A backend able to rasterize a point cloud three ways.
///
/// All outputs are top-down (row 0 is the top of the screen) and sized
/// `request.width x request.height`.
pub trait PointRenderer {
    /// Point index per pixel, EMPTY where no point was drawn
    fn render_id_buffer(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<IdBuffer>;

    /// Window depth in [0, 1] per pixel, 1.0 where no point was drawn
    fn render_depth_buffer(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<DepthBuffer>;

    /// 8-bit color view of the cloud over the request background
    fn render_color_image(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<RgbImage>;
}
