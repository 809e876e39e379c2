//! JSON payloads of the `/sdapi/v1` endpoints

use std::io::Cursor;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WebUiError};

/// Encode an image as base64 PNG
pub fn encode_png_base64(image: &DynamicImage) -> Result<String> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Decode a base64 image, with or without a `data:image/...;base64,` prefix
pub fn decode_image_base64(data: &str) -> Result<DynamicImage> {
    let data = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Sampling parameters shared by both endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 512,
            height: 512,
            steps: 20,
            cfg_scale: 7.0,
        }
    }
}

/// One ControlNet unit of `alwayson_scripts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetUnit {
    pub input_image: String,
    pub model: String,
}

impl ControlNetUnit {
    /// Depth conditioning unit
    pub fn depth(depth: &DynamicImage, model: &str) -> Result<Self> {
        Ok(Self {
            input_image: encode_png_base64(depth)?,
            model: model.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlNetArgs {
    pub args: Vec<ControlNetUnit>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlwaysOnScripts {
    pub controlnet: ControlNetArgs,
}

/// Body of `POST /sdapi/v1/txt2img`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Txt2ImgPayload {
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwayson_scripts: Option<AlwaysOnScripts>,
}

impl Txt2ImgPayload {
    pub fn new(params: GenerationParams) -> Self {
        Self { params, alwayson_scripts: None }
    }

    pub fn with_controlnet(mut self, unit: ControlNetUnit) -> Self {
        push_unit(&mut self.alwayson_scripts, unit);
        self
    }
}

/// Body of `POST /sdapi/v1/img2img`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Img2ImgPayload {
    #[serde(flatten)]
    pub params: GenerationParams,
    pub init_images: Vec<String>,
    pub denoising_strength: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwayson_scripts: Option<AlwaysOnScripts>,
}

impl Img2ImgPayload {
    pub fn new(params: GenerationParams, init_image: &DynamicImage) -> Result<Self> {
        Ok(Self {
            params,
            init_images: vec![encode_png_base64(init_image)?],
            denoising_strength: 0.75,
            alwayson_scripts: None,
        })
    }

    pub fn with_denoising_strength(mut self, strength: f32) -> Self {
        self.denoising_strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn with_controlnet(mut self, unit: ControlNetUnit) -> Self {
        push_unit(&mut self.alwayson_scripts, unit);
        self
    }
}

fn push_unit(scripts: &mut Option<AlwaysOnScripts>, unit: ControlNetUnit) {
    scripts.get_or_insert_with(AlwaysOnScripts::default).controlnet.args.push(unit);
}

/// Response of both generation endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

impl GenerationResponse {
    /// Decode the first generated image
    pub fn first_image(&self) -> Result<DynamicImage> {
        let encoded = self.images.first().ok_or(WebUiError::NoImages)?;
        decode_image_base64(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, GrayImage};

    fn color() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])))
    }

    fn depth() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([128])))
    }

    #[test]
    fn test_png_base64_roundtrip() {
        let encoded = encode_png_base64(&color()).unwrap();
        let decoded = decode_image_base64(&encoded).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(2, 2), &Rgb([10, 20, 30]));

        let prefixed = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_image_base64(&prefixed).unwrap().to_rgb8(), decoded);
    }

    #[test]
    fn test_txt2img_payload_shape() {
        let json = serde_json::to_value(Txt2ImgPayload::new(GenerationParams::new("a cat"))).unwrap();
        assert_eq!(json["prompt"], "a cat");
        assert_eq!(json["width"], 512);
        assert_eq!(json["steps"], 20);
        assert!(json.get("alwayson_scripts").is_none());
        assert!(json.get("init_images").is_none());
    }

    #[test]
    fn test_img2img_with_controlnet() {
        let payload = Img2ImgPayload::new(GenerationParams::new("moss"), &color())
            .unwrap()
            .with_denoising_strength(1.5)
            .with_controlnet(ControlNetUnit::depth(&depth(), crate::DEFAULT_DEPTH_MODEL).unwrap());
        assert_eq!(payload.denoising_strength, 1.0);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["init_images"].as_array().unwrap().len(), 1);
        let unit = &json["alwayson_scripts"]["controlnet"]["args"][0];
        assert_eq!(unit["model"], crate::DEFAULT_DEPTH_MODEL);
        let depth_back = decode_image_base64(unit["input_image"].as_str().unwrap()).unwrap();
        assert_eq!(depth_back.to_luma8().get_pixel(0, 0), &Luma([128]));
    }

    #[test]
    fn test_response_decode() {
        let encoded = encode_png_base64(&color()).unwrap();
        let body = format!(r#"{{"images": ["{}"], "info": "{{}}"}}"#, encoded);
        let response: GenerationResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.first_image().unwrap().width(), 4);

        let empty: GenerationResponse = serde_json::from_str(r#"{"parameters": {}}"#).unwrap();
        assert!(matches!(empty.first_image(), Err(WebUiError::NoImages)));
    }
}
