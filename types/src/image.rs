//! Captured still images.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use crate::error::ImageError;

/// MIME type assumed when the source does not say.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// An encoded still image (JPEG by default) held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self {
            bytes,
            mime_type: mime_type.into(),
        })
    }

    pub fn jpeg(bytes: Vec<u8>) -> Result<Self, ImageError> {
        Self::new(bytes, DEFAULT_MIME_TYPE)
    }

    /// Decode a `data:image/<kind>;base64,<payload>` URL, or a bare base64
    /// payload which is taken to be JPEG.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageError> {
        let (mime_type, payload) = match data_url.strip_prefix("data:") {
            Some(rest) => {
                let (meta, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| ImageError::InvalidDataUrl("missing ',' separator".into()))?;
                let mime = meta
                    .strip_suffix(";base64")
                    .ok_or_else(|| ImageError::InvalidDataUrl("payload is not base64".into()))?;
                if !mime.starts_with("image/") || mime.len() == "image/".len() {
                    return Err(ImageError::InvalidDataUrl(format!("not an image type: {mime}")));
                }
                (mime.to_string(), payload)
            }
            None => (DEFAULT_MIME_TYPE.to_string(), data_url),
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::Base64(e.to_string()))?;
        Self::new(bytes, mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension derived from the MIME subtype (`jpeg` becomes `jpg`).
    pub fn extension(&self) -> &str {
        match self.mime_type.strip_prefix("image/") {
            Some("jpeg") | None => "jpg",
            Some(sub) => sub,
        }
    }

    /// Upload file name stamped with the capture time in epoch millis.
    pub fn upload_file_name(&self, captured_at_millis: u64) -> String {
        format!("selfie-{captured_at_millis}.{}", self.extension())
    }
}

impl fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBlob")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
