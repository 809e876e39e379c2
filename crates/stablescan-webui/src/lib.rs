//! Client for the Stable Diffusion web UI HTTP API
//!
//! Builds txt2img / img2img payloads (optionally conditioned on a ControlNet
//! depth image) and decodes the generated image.
//! ```ignore
//! let client = WebUiClient::new("http://127.0.0.1:7860", Duration::from_secs(300))?;
//! let payload = Img2ImgPayload::new(GenerationParams::new("a brick wall"), &color)?
//!     .with_controlnet(ControlNetUnit::depth(&depth, DEFAULT_DEPTH_MODEL)?);
//! let image = client.img2img(&payload)?;
//! ```

pub mod client;
pub mod error;
pub mod payload;

pub use client::WebUiClient;
pub use error::WebUiError;
pub use payload::*;

/// Default web UI address
pub const DEFAULT_URL: &str = "http://127.0.0.1:7860";

/// ControlNet depth model used when none is configured
pub const DEFAULT_DEPTH_MODEL: &str = "control_v11f1p_sd15_depth [cfd03158]";
