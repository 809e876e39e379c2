//! Session configuration, stored as JSON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::depth::{DepthConsistencyFilter, Denoise};

/// Settings of the external image generator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub webui_url: String,
    pub steps: u32,
    pub cfg_scale: f32,
    /// img2img strength; 0 keeps the init image, 1 ignores it
    pub denoising_strength: f32,
    pub controlnet_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            webui_url: stablescan_webui::DEFAULT_URL.to_string(),
            steps: 20,
            cfg_scale: 7.0,
            denoising_strength: 0.75,
            controlnet_model: stablescan_webui::DEFAULT_DEPTH_MODEL.to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    pub point_size: f32,
    /// Relative depth band θ of the consistency filter
    pub deviation: f32,
    pub fill_iterations: usize,
    pub blur_sigma: f32,
    /// Where diagnostic images are written
    pub output_dir: PathBuf,
    /// Where color patches are saved
    pub patch_dir: PathBuf,
    pub session_name: String,
    /// Used instead of asking for a prompt
    pub default_prompt: Option<String>,
    /// Enables the diagnostic key bindings
    pub debug: bool,
    pub orbit_step_degrees: f32,
    /// Radius factor per zoom step
    pub zoom_step: f32,
    pub camera_radius: f32,
    pub camera_yaw_degrees: f32,
    pub camera_pitch_degrees: f32,
    pub fov_degrees: f32,
    pub generation: GenerationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            point_size: 1.5,
            deviation: crate::depth::DEFAULT_DEVIATION,
            fill_iterations: 1,
            blur_sigma: 1.0,
            output_dir: PathBuf::from("output"),
            patch_dir: PathBuf::from("sessions"),
            session_name: "default".to_string(),
            default_prompt: None,
            debug: false,
            orbit_step_degrees: 15.0,
            zoom_step: 0.9,
            camera_radius: 3.0,
            camera_yaw_degrees: 0.0,
            camera_pitch_degrees: 20.0,
            fov_degrees: 60.0,
            generation: GenerationConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Reject values no capture can run with
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!("capture size {}x{}", self.width, self.height)));
        }
        if !(0.0..1.0).contains(&self.deviation) {
            return Err(Error::Config(format!("deviation {} outside [0, 1)", self.deviation)));
        }
        if self.point_size <= 0.0 || self.blur_sigma < 0.0 {
            return Err(Error::Config(format!(
                "point size {} / blur sigma {}",
                self.point_size, self.blur_sigma
            )));
        }
        if self.zoom_step <= 0.0 || self.zoom_step >= 1.0 {
            return Err(Error::Config(format!("zoom step {} outside (0, 1)", self.zoom_step)));
        }
        Ok(())
    }

    /// Consistency filter built from the depth settings
    pub fn depth_filter(&self) -> DepthConsistencyFilter {
        DepthConsistencyFilter::new(
            self.deviation,
            Denoise { fill_iterations: self.fill_iterations, blur_sigma: self.blur_sigma },
        )
    }

    /// Initial camera looking at the origin of the normalized cloud
    pub fn camera(&self) -> Camera {
        let mut camera = Camera::new(
            Vec3::ZERO,
            self.camera_radius,
            self.fov_degrees,
            self.width as f32 / self.height.max(1) as f32,
        );
        camera.orbit(
            self.camera_yaw_degrees.to_radians(),
            self.camera_pitch_degrees.to_radians(),
        );
        camera
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync). Missing fields take their defaults.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!((config.width, config.height), (512, 512));
        assert_eq!(config.deviation, 0.1);
        assert_eq!(config.generation.webui_url, "http://127.0.0.1:7860");
        assert_eq!(config.generation.controlnet_model, "control_v11f1p_sd15_depth [cfd03158]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let config = SessionConfig {
            width: 320,
            default_prompt: Some("rusty metal".into()),
            debug: true,
            ..SessionConfig::default()
        };
        config.save_sync(&path).unwrap();
        assert_eq!(SessionConfig::load_sync(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"height": 256, "generation": {"steps": 30}}"#).unwrap();
        let config = SessionConfig::load_sync(&path).unwrap();
        assert_eq!(config.height, 256);
        assert_eq!(config.width, 512);
        assert_eq!(config.generation.steps, 30);
        assert_eq!(config.generation.cfg_scale, 7.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"deviation": 1.5}"#).unwrap();
        assert!(matches!(SessionConfig::load_sync(&path), Err(Error::Config(_))));
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(SessionConfig::load_sync(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_camera_from_config() {
        let config = SessionConfig { width: 640, height: 320, ..SessionConfig::default() };
        let camera = config.camera();
        assert_eq!(camera.aspect, 2.0);
        assert!((camera.pitch - 20f32.to_radians()).abs() < 1e-6);
        assert_eq!(config.depth_filter().denoise.fill_iterations, 1);
    }
}
