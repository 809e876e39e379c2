//! Capture orchestration
//!
//! A session owns the accumulation store and sequences each capture:
//! render ids, depth and colors, filter the ids, call the generator and
//! merge its output. Commands are dispatched one at a time.

pub mod capture;
pub mod command;
pub mod config;
pub mod diagnostics;

use std::path::PathBuf;

use image::RgbImage;

use crate::cloud::PointCloud;
use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::depth::{DepthConsistencyFilter, IdPartition};
use crate::generate::Generator;
use crate::picking::IdBuffer;
use crate::picking::id_buffer::{id_visualization, sorted_unique};
use crate::render::{PointRenderer, RenderRequest};
use crate::store::TexturedPointSet;

pub use capture::ScreenCapture;
pub use command::{CommandTable, SessionCommand};
pub use config::{GenerationConfig, SessionConfig};

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Retextured { new_points: usize },
    CameraMoved,
    /// Diagnostic images written
    Wrote(Vec<PathBuf>),
    Saved(PathBuf),
    Loaded { points: usize },
    Reset,
    Pruned { remaining: usize },
    Swept { views: usize, new_points: usize },
    /// Nothing visible from the current camera; no-op
    EmptyView,
}

/// Rendered outputs of one view before they become a [`ScreenCapture`]
struct View {
    request: RenderRequest,
    color: RgbImage,
    ids: IdBuffer,
    partition: IdPartition,
}

pub struct CaptureSession<R: PointRenderer, G: Generator> {
    store: TexturedPointSet,
    renderer: R,
    generator: G,
    camera: Camera,
    filter: DepthConsistencyFilter,
    config: SessionConfig,
}

impl<R: PointRenderer, G: Generator> CaptureSession<R, G> {
    pub fn new(cloud: PointCloud, renderer: R, generator: G, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let store = TexturedPointSet::new(cloud)?;
        log::info!(
            "Session '{}': {} points, capture {}x{}",
            config.session_name,
            store.len(),
            config.width,
            config.height
        );
        Ok(Self {
            store,
            renderer,
            generator,
            camera: config.camera(),
            filter: config.depth_filter(),
            config,
        })
    }

    /// Replace the initial camera
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn store(&self) -> &TexturedPointSet {
        &self.store
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Render state for the current camera
    pub fn render_request(&self) -> RenderRequest {
        RenderRequest::capture(self.camera.mvp(), self.config.width, self.config.height)
            .with_point_size(self.config.point_size)
    }

    fn render_view(&mut self) -> Result<View> {
        let request = self.render_request();
        let cloud = self.store.cloud();
        let ids = self.renderer.render_id_buffer(cloud, &request)?;
        let depth = self.renderer.render_depth_buffer(cloud, &request)?;
        let color = self.renderer.render_color_image(cloud, &request)?;
        let partition = self.filter.partition(&ids, &depth)?;
        Ok(View { request, color, ids, partition })
    }

    /// Render and filter the current view
    pub fn capture(&mut self) -> Result<ScreenCapture> {
        let view = self.render_view()?;
        Ok(ScreenCapture {
            color_image: view.color,
            depth_image: view.partition.filtered_image,
            width: view.request.width,
            height: view.request.height,
            ids: view.partition.kept,
            removed: view.partition.removed,
            epoch: self.store.epoch(),
        })
    }

    /// Ask the generator for a new image of a capture
    pub fn generate(&mut self, capture: &ScreenCapture, prompt: &str) -> Result<RgbImage> {
        log::info!("Generating {:?} for {} visible points", prompt, capture.visible_points().len());
        self.generator.generate(&capture.generation_request(prompt))
    }

    /// Merge a generated image into the store. The capture must be from
    /// the current epoch and the image must match its size.
    pub fn apply(&mut self, capture: &ScreenCapture, image: &RgbImage) -> Result<usize> {
        self.store.check_epoch(capture.epoch)?;
        if image.dimensions() != (capture.width, capture.height) {
            return Err(Error::InvalidDimensions(format!(
                "generated image is {}x{}, capture is {}x{}",
                image.width(),
                image.height(),
                capture.width,
                capture.height
            )));
        }
        self.store.retexture(image, &capture.ids)
    }

    /// Capture, generate and merge. The store is unchanged on any failure.
    pub fn retexture(&mut self, prompt: &str) -> Result<usize> {
        let capture = self.capture()?;
        let image = self.generate(&capture, prompt)?;
        self.apply(&capture, &image)
    }

    /// Retexture `views` views around the target, then restore the camera.
    /// Empty views and failed generations are skipped.
    pub fn sweep(&mut self, views: usize, prompt: &str) -> Result<usize> {
        let original = self.camera.clone();
        let ring = original.orbit_ring(views);
        let mut total = 0;
        let mut result = Ok(());
        for (i, camera) in ring.into_iter().enumerate() {
            self.camera = camera;
            match self.retexture(prompt) {
                Ok(added) => total += added,
                Err(e) if e.is_expected() => log::warn!("Sweep view {}/{} skipped: {}", i + 1, views, e),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.camera = original;
        result?;
        log::info!("Sweep of {} views retextured {} points", views, total);
        Ok(total)
    }

    fn resolve_prompt<'a>(&'a self, prompt: Option<&'a str>) -> Result<&'a str> {
        prompt
            .or(self.config.default_prompt.as_deref())
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::GenerationFailed("no prompt given".into()))
    }

    /// Dispatch one command. An empty view yields
    /// [`CommandOutcome::EmptyView`] instead of an error.
    pub fn execute(&mut self, command: SessionCommand, prompt: Option<&str>) -> Result<CommandOutcome> {
        log::debug!("Executing {:?}", command);
        match self.dispatch(command, prompt) {
            Err(Error::EmptyDepthRange) => {
                log::warn!("{:?}: nothing visible from this view", command);
                Ok(CommandOutcome::EmptyView)
            }
            other => other,
        }
    }

    fn dispatch(&mut self, command: SessionCommand, prompt: Option<&str>) -> Result<CommandOutcome> {
        let step = self.config.orbit_step_degrees.to_radians();
        match command {
            SessionCommand::Retexture => {
                let prompt = self.resolve_prompt(prompt)?.to_string();
                let new_points = self.retexture(&prompt)?;
                Ok(CommandOutcome::Retextured { new_points })
            }
            SessionCommand::Sweep { views } => {
                let prompt = self.resolve_prompt(prompt)?.to_string();
                let new_points = self.sweep(views, &prompt)?;
                Ok(CommandOutcome::Swept { views, new_points })
            }
            SessionCommand::OrbitLeft => self.move_camera(|c| c.orbit(-step, 0.0)),
            SessionCommand::OrbitRight => self.move_camera(|c| c.orbit(step, 0.0)),
            SessionCommand::OrbitUp => self.move_camera(|c| c.orbit(0.0, step)),
            SessionCommand::OrbitDown => self.move_camera(|c| c.orbit(0.0, -step)),
            SessionCommand::ZoomIn => {
                let factor = self.config.zoom_step;
                self.move_camera(|c| c.zoom(factor))
            }
            SessionCommand::ZoomOut => {
                let factor = 1.0 / self.config.zoom_step;
                self.move_camera(|c| c.zoom(factor))
            }
            SessionCommand::ShowIds => self.show_ids(),
            SessionCommand::ShowDepthFilter => self.show_depth_filter(),
            SessionCommand::ShowTexturedOnly => self.show_textured_only(),
            SessionCommand::SavePatch => {
                let path = self.store.save(&self.config.patch_dir, &self.config.session_name)?;
                Ok(CommandOutcome::Saved(path))
            }
            SessionCommand::LoadPatch => {
                self.store.load(&self.config.patch_dir, &self.config.session_name)?;
                Ok(CommandOutcome::Loaded { points: self.store.retextured_count() })
            }
            SessionCommand::Reset => {
                self.store.reset();
                Ok(CommandOutcome::Reset)
            }
            SessionCommand::PruneUntextured => {
                let keep = self.store.sorted_retextured();
                if keep.is_empty() {
                    log::warn!("Pruning with no retextured points empties the cloud");
                }
                self.store.filter(&keep)?;
                Ok(CommandOutcome::Pruned { remaining: self.store.len() })
            }
        }
    }

    fn move_camera(&mut self, f: impl FnOnce(&mut Camera)) -> Result<CommandOutcome> {
        f(&mut self.camera);
        log::debug!(
            "Camera yaw {:.1} pitch {:.1} radius {:.3}",
            self.camera.yaw.to_degrees(),
            self.camera.pitch.to_degrees(),
            self.camera.radius
        );
        Ok(CommandOutcome::CameraMoved)
    }

    fn show_ids(&mut self) -> Result<CommandOutcome> {
        let request = self.render_request();
        let ids = self.renderer.render_id_buffer(self.store.cloud(), &request)?;
        let path = diagnostics::write_png(&self.config.output_dir, "ids", id_visualization(&ids))?;
        Ok(CommandOutcome::Wrote(vec![path]))
    }

    fn show_depth_filter(&mut self) -> Result<CommandOutcome> {
        let view = self.render_view()?;
        let dir = self.config.output_dir.clone();
        let paths = vec![
            diagnostics::write_png(&dir, "depth_filtered", view.partition.filtered_image.clone())?,
            diagnostics::write_png(&dir, "depth_raw", view.partition.raw_image.clone())?,
            diagnostics::write_png(&dir, "depth_removed", view.partition.removal_mask())?,
            diagnostics::write_png(&dir, "ids_unfiltered", id_visualization(&view.ids))?,
        ];
        let removed = sorted_unique(&view.partition.removed);
        self.store.flag(&removed)?;
        log::info!("Flagged {} points removed by the depth filter", removed.len());
        Ok(CommandOutcome::Wrote(paths))
    }

    fn show_textured_only(&mut self) -> Result<CommandOutcome> {
        let request = self.render_request();
        let textured = self.store.retextured_cloud()?;
        let dir = self.config.output_dir.clone();
        let render = self.renderer.render_color_image(&textured, &request)?;
        let ids = self.renderer.render_id_buffer(self.store.cloud(), &request)?;
        let paths = vec![
            diagnostics::write_png(&dir, "textured_only", render)?,
            diagnostics::write_png(&dir, "textured_mask", self.store.mask_retextured_image(&ids))?,
        ];
        Ok(CommandOutcome::Wrote(paths))
    }
}
