use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebUiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid base64 image: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Response contained no images")]
    NoImages,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, WebUiError>;
