//! Point sets with per-point colors

pub mod point_cloud;
pub mod synthetic;

pub use point_cloud::PointCloud;
