//! Renderer collaborator interface and a CPU reference backend

pub mod request;
pub mod renderer;
pub mod software;

pub use request::RenderRequest;
pub use renderer::PointRenderer;
pub use software::SoftwareRenderer;
