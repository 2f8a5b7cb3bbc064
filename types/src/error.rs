use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("capture permission denied")]
    PermissionDenied,
}
