//! Orbit camera producing the MVP matrices handed to the renderer

use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Quat, Vec3};

/// Projection model of a capture camera
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Vertical field of view in radians
    Perspective { fov_y: f32 },
    /// Half of the visible height in world units
    Orthographic { half_height: f32 },
}

/// Camera orbiting a target point at a fixed radius
///
/// Matrices follow OpenGL clip conventions (NDC depth in [-1, 1]) to match
/// the point renderer backends.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Point the camera looks at
    pub target: Vec3,
    /// Distance from target
    pub radius: f32,
    /// Rotation around the world Y axis in radians
    pub yaw: f32,
    /// Elevation in radians, clamped short of the poles
    pub pitch: f32,
    pub projection: Projection,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

const PITCH_LIMIT: f32 = 1.5;
const MIN_RADIUS: f32 = 0.05;

impl Camera {
    /// Create a perspective orbit camera around `target`
    pub fn new(target: Vec3, radius: f32, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            target,
            radius: radius.max(MIN_RADIUS),
            yaw: 0.0,
            pitch: 0.0,
            projection: Projection::Perspective { fov_y: fov_y_degrees.to_radians() },
            aspect,
            near: 0.01,
            far: 100.0,
        }
    }

    /// Orthographic camera looking down -Z at `target`
    pub fn orthographic(target: Vec3, half_height: f32, aspect: f32) -> Self {
        Self {
            target,
            radius: 2.0,
            yaw: 0.0,
            pitch: 0.0,
            projection: Projection::Orthographic { half_height },
            aspect,
            near: 0.01,
            far: 100.0,
        }
    }

    /// World position derived from the orbit parameters
    pub fn position(&self) -> Vec3 {
        self.target + self.rotation() * Vec3::new(0.0, 0.0, self.radius)
    }

    /// Camera orientation; yaw 0 / pitch 0 looks down -Z
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::YXZ, self.yaw, -self.pitch, 0.0)
    }

    /// Get forward direction
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        let up = self.rotation() * Vec3::Y;
        Mat4::look_at_rh(self.position(), self.target, up)
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh_gl(fov_y, self.aspect, self.near, self.far)
            }
            Projection::Orthographic { half_height } => {
                let half_width = half_height * self.aspect;
                Mat4::orthographic_rh_gl(
                    -half_width, half_width,
                    -half_height, half_height,
                    self.near, self.far,
                )
            }
        }
    }

    /// Combined model-view-projection matrix (the model transform is identity)
    pub fn mvp(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Rotate around the target by the given deltas in radians
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scale the orbit radius; factors below 1 move closer
    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).max(MIN_RADIUS);
    }

    /// `count` cameras evenly spaced around the target at this camera's
    /// radius and pitch, starting at the current yaw
    pub fn orbit_ring(&self, count: usize) -> Vec<Camera> {
        let step = std::f32::consts::TAU / count.max(1) as f32;
        (0..count)
            .map(|i| {
                let mut camera = self.clone();
                camera.orbit(step * i as f32, 0.0);
                camera
            })
            .collect()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 3.0, 60.0, 1.0)
    }
}
