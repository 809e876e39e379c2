//! Stablescan - multi-view retexturing of point clouds
//!
//! Picks the points visible in a rendered view, filters out ids that are
//! inconsistent with the view's depth, and merges externally generated
//! colors onto them. A point keeps the first color it receives.

pub mod core;
pub mod math;
pub mod cloud;
pub mod picking;
pub mod depth;
pub mod store;
pub mod render;
pub mod generate;
pub mod session;
