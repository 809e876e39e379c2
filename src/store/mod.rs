//! Persistent color accumulation store
//!
//! Colors merged from generated views are stored per point and persisted
//! as a minimal patch of the retextured points only.

pub mod textured;
pub mod patch;

pub use textured::{TexturedPointSet, FLAG_COLOR};
pub use patch::ColorPatch;
