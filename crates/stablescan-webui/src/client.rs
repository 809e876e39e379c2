//! Blocking HTTP client

use std::time::Duration;

use image::DynamicImage;
use serde::Serialize;

use crate::error::{Result, WebUiError};
use crate::payload::{GenerationResponse, Img2ImgPayload, Txt2ImgPayload};

pub struct WebUiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl WebUiClient {
    /// Create a client for the web UI at `base_url`. Each request fails
    /// after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(WebUiError::InvalidUrl(base_url));
        }
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/sdapi/v1/{}", self.base_url, path)
    }

    pub fn txt2img(&self, payload: &Txt2ImgPayload) -> Result<DynamicImage> {
        self.post("txt2img", payload)
    }

    pub fn img2img(&self, payload: &Img2ImgPayload) -> Result<DynamicImage> {
        self.post("img2img", payload)
    }

    fn post<P: Serialize>(&self, path: &str, payload: &P) -> Result<DynamicImage> {
        let url = self.endpoint(path);
        log::debug!("POST {}", url);
        let response = self.http.post(&url).json(payload).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(WebUiError::Status { status: status.as_u16(), body });
        }
        let decoded: GenerationResponse = response.json()?;
        log::debug!("{} returned {} image(s)", path, decoded.images.len());
        decoded.first_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = WebUiClient::new("http://127.0.0.1:7860/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:7860");
        assert_eq!(client.endpoint("img2img"), "http://127.0.0.1:7860/sdapi/v1/img2img");
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            WebUiClient::new("127.0.0.1:7860", Duration::from_secs(1)),
            Err(WebUiError::InvalidUrl(_))
        ));
    }
}
