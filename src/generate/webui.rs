//! Generator backed by a Stable Diffusion web UI instance

use std::time::Duration;

use image::{DynamicImage, RgbImage, imageops::FilterType};
use stablescan_webui::{ControlNetUnit, GenerationParams, Img2ImgPayload, WebUiClient, WebUiError};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::generate::{GenerationRequest, Generator};
use crate::session::config::GenerationConfig;

impl From<WebUiError> for Error {
    fn from(e: WebUiError) -> Self {
        Error::GenerationFailed(e.to_string())
    }
}

/// img2img with ControlNet depth conditioning
pub struct WebUiGenerator {
    client: WebUiClient,
    config: GenerationConfig,
}

impl WebUiGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = WebUiClient::new(&config.webui_url, Duration::from_secs(config.timeout_secs))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Build the img2img request body for a capture
    pub fn payload(&self, request: &GenerationRequest) -> Result<Img2ImgPayload> {
        let (width, height) = request.dimensions();
        let params = GenerationParams {
            prompt: request.prompt.clone(),
            width,
            height,
            steps: self.config.steps,
            cfg_scale: self.config.cfg_scale,
        };
        let init = DynamicImage::ImageRgb8(request.color_image.clone());
        let depth = DynamicImage::ImageLuma8(request.depth_image.clone());
        let payload = Img2ImgPayload::new(params, &init)?
            .with_denoising_strength(self.config.denoising_strength)
            .with_controlnet(ControlNetUnit::depth(&depth, &self.config.controlnet_model)?);
        Ok(payload)
    }
}

impl Generator for WebUiGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<RgbImage> {
        let payload = self.payload(request)?;
        log::info!("Generating {:?} via {}", request.prompt, self.client.base_url());
        let image = self.client.img2img(&payload)?.to_rgb8();
        let (width, height) = request.dimensions();
        fit_to_capture(image, width, height)
    }
}

/// Bring a generated image to the capture size.
///
/// Some backends snap the output to multiples of 8. A scaled image of the
/// same aspect ratio is resized back; any other shape would misalign pixels
/// and ids, so it is rejected.
pub fn fit_to_capture(image: RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (w, h) = image.dimensions();
    if (w, h) == (width, height) {
        return Ok(image);
    }
    if w as u64 * height as u64 != h as u64 * width as u64 {
        return Err(Error::GenerationFailed(format!(
            "generated image is {}x{}, which does not have the aspect ratio of the {}x{} capture",
            w, h, width, height
        )));
    }
    log::warn!("Generated image is {}x{}, resizing to {}x{}", w, h, width, height);
    Ok(image::imageops::resize(&image, width, height, FilterType::Nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "weathered stone".into(),
            color_image: RgbImage::from_pixel(8, 4, Rgb([1, 2, 3])),
            depth_image: GrayImage::from_pixel(8, 4, Luma([200])),
        }
    }

    #[test]
    fn test_payload_uses_config() {
        let config = GenerationConfig { steps: 12, cfg_scale: 5.5, ..GenerationConfig::default() };
        let generator = WebUiGenerator::new(config).unwrap();
        let payload = generator.payload(&request()).unwrap();
        assert_eq!(payload.params.prompt, "weathered stone");
        assert_eq!((payload.params.width, payload.params.height), (8, 4));
        assert_eq!(payload.params.steps, 12);
        assert_eq!(payload.params.cfg_scale, 5.5);
        let scripts = payload.alwayson_scripts.unwrap();
        assert_eq!(scripts.controlnet.args.len(), 1);
        assert_eq!(scripts.controlnet.args[0].model, GenerationConfig::default().controlnet_model);
    }

    #[test]
    fn test_fit_to_capture() {
        let same = fit_to_capture(RgbImage::new(8, 4), 8, 4).unwrap();
        assert_eq!(same.dimensions(), (8, 4));

        let scaled = fit_to_capture(RgbImage::from_pixel(16, 8, Rgb([9, 9, 9])), 8, 4).unwrap();
        assert_eq!(scaled.dimensions(), (8, 4));
        assert_eq!(scaled.get_pixel(7, 3), &Rgb([9, 9, 9]));

        let err = fit_to_capture(RgbImage::new(8, 8), 8, 4).unwrap_err();
        assert!(matches!(err, Error::GenerationFailed(_)));
        assert!(err.is_expected());
    }

    #[test]
    fn test_client_errors_become_generation_failed() {
        let config = GenerationConfig { webui_url: "not a url".into(), ..GenerationConfig::default() };
        let err = WebUiGenerator::new(config).err().unwrap();
        assert!(matches!(err, Error::GenerationFailed(_)));
        assert!(err.is_expected());
    }
}
