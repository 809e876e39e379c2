//! Core types and utilities shared by every stage of the capture pipeline

pub mod types;
pub mod error;
pub mod logging;
pub mod grid;
pub mod camera;

pub use types::*;
pub use error::Error;
pub use grid::Grid;
