//! CPU square-splat rasterizer

use image::RgbImage;

use crate::cloud::PointCloud;
use crate::core::error::Error;
use crate::core::grid::Grid;
use crate::core::types::{Result, Rgb, Vec3, Vec4};
use crate::depth::{BACKGROUND_DEPTH, DepthBuffer};
use crate::picking::{IdBuffer, codec};
use crate::render::renderer::PointRenderer;
use crate::render::request::RenderRequest;

/// Projected point in window coordinates (origin bottom-left)
#[derive(Clone, Copy, Debug)]
struct Fragment {
    x: f32,
    y: f32,
    depth: f32,
}

/// Reference backend: rasterizes each point as an axis-aligned square
/// splat into bottom-up buffers, like a GL framebuffer, and flips them on
/// readback.
#[derive(Clone, Debug, Default)]
pub struct SoftwareRenderer {
    frames: u64,
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render calls served so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn check_request(request: &RenderRequest) -> Result<()> {
        if request.width == 0 || request.height == 0 {
            return Err(Error::InvalidDimensions(format!(
                "cannot render {}x{}",
                request.width, request.height
            )));
        }
        if !request.point_size.is_finite() || request.point_size <= 0.0 {
            return Err(Error::Render(format!("invalid point size {}", request.point_size)));
        }
        Ok(())
    }

    /// Clip-space transform, perspective divide and viewport mapping.
    /// Points outside the clip volume produce no fragment.
    fn project(position: Vec3, request: &RenderRequest) -> Option<Fragment> {
        let clip = request.mvp * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) || !ndc.is_finite() {
            return None;
        }
        Some(Fragment {
            x: (ndc.x + 1.0) * 0.5 * request.width as f32,
            y: (ndc.y + 1.0) * 0.5 * request.height as f32,
            depth: (ndc.z + 1.0) * 0.5,
        })
    }

    /// Pixels whose centers fall inside the splat square, as half-open
    /// ranges clipped to the viewport
    fn coverage(frag: &Fragment, request: &RenderRequest) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
        let size = request.point_size.max(1.0);
        let half = size * 0.5;
        let span = |center: f32, limit: u32| {
            let lo = (center - half - 0.5).ceil().max(0.0);
            let hi = ((center + half - 0.5).ceil()).min(limit as f32);
            (hi > lo).then(|| lo as u32..hi as u32)
        };
        Some((span(frag.x, request.width)?, span(frag.y, request.height)?))
    }

    /// Rasterize every point, calling `write(point, pixel)` for each
    /// fragment that survives the depth test. Returns the bottom-up depth
    /// buffer.
    fn rasterize(
        &mut self,
        cloud: &PointCloud,
        request: &RenderRequest,
        mut write: impl FnMut(usize, usize) -> Result<()>,
    ) -> Result<Vec<f32>> {
        Self::check_request(request)?;
        self.frames += 1;
        let width = request.width as usize;
        let mut depth = vec![BACKGROUND_DEPTH; request.pixel_count()];

        for (index, &position) in cloud.positions().iter().enumerate() {
            let Some(frag) = Self::project(position, request) else {
                continue;
            };
            let Some((xs, ys)) = Self::coverage(&frag, request) else {
                continue;
            };
            for y in ys {
                for x in xs.clone() {
                    let pixel = y as usize * width + x as usize;
                    if request.depth_test && frag.depth >= depth[pixel] {
                        continue;
                    }
                    depth[pixel] = frag.depth;
                    write(index, pixel)?;
                }
            }
        }
        Ok(depth)
    }
}

#[inline]
fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn to_rgb8(color: Rgb) -> [u8; 3] {
    [to_u8(color[0]), to_u8(color[1]), to_u8(color[2])]
}

impl PointRenderer for SoftwareRenderer {
    fn render_id_buffer(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<IdBuffer> {
        if !request.is_pickable() {
            return Err(Error::Render(
                "id buffers must be rendered without blending or multisampling".into(),
            ));
        }
        codec::check_capacity(cloud.len())?;
        // white clear decodes to EMPTY
        let mut bytes = vec![u8::MAX; request.pixel_count() * 4];
        self.rasterize(cloud, request, |index, pixel| {
            let rgba = codec::encode(index)?;
            bytes[pixel * 4..pixel * 4 + 4].copy_from_slice(&rgba);
            Ok(())
        })?;
        codec::decode_rgba_buffer(&bytes, request.width, request.height, true)
    }

    fn render_depth_buffer(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<DepthBuffer> {
        let depth_tested = RenderRequest { depth_test: true, ..*request };
        let depth = self.rasterize(cloud, &depth_tested, |_, _| Ok(()))?;
        let mut grid = Grid::from_vec(request.width, request.height, depth)?;
        grid.flip_vertical();
        Ok(grid)
    }

    fn render_color_image(&mut self, cloud: &PointCloud, request: &RenderRequest) -> Result<RgbImage> {
        let background = to_rgb8(request.background);
        let mut rgb: Vec<[u8; 3]> = vec![background; request.pixel_count()];
        let colors = cloud.colors();
        self.rasterize(cloud, request, |index, pixel| {
            rgb[pixel] = to_rgb8(colors[index]);
            Ok(())
        })?;
        let mut grid = Grid::from_vec(request.width, request.height, rgb)?;
        grid.flip_vertical();
        let raw: Vec<u8> = grid.into_vec().into_iter().flatten().collect();
        RgbImage::from_raw(request.width, request.height, raw)
            .ok_or_else(|| Error::Render("color readback has the wrong size".into()))
    }
}
