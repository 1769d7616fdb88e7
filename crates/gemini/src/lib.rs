//! Client for Google's Gemini `generateContent` REST API.
//!
//! The rest of the workspace talks to the model through the
//! [`GenerativeModel`] trait so handlers and the pipeline can be driven by
//! a fake in tests.

pub mod client;
pub mod config;
pub mod messages;

use async_trait::async_trait;

pub use client::{GeminiClient, GeminiError};
pub use config::GeminiConfig;

/// An image handed to the model alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ReferenceImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build a reference image, sniffing the MIME type from the bytes.
    ///
    /// Unrecognised payloads are labelled `image/jpeg`, which is what the
    /// model accepts most leniently.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&data).unwrap_or("image/jpeg");
        Self::new(mime_type, data)
    }
}

/// An image returned by the model, already decoded from base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Text and image generation as used by the story pipeline.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate text for `prompt`, with optional reference images.
    ///
    /// Returns the candidate text parts joined by newlines.
    async fn generate_text(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
    ) -> Result<String, GeminiError>;

    /// Generate an image for `prompt`.
    ///
    /// `Ok(None)` means the model answered without an image part.
    async fn generate_image(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
    ) -> Result<Option<InlineImage>, GeminiError>;
}

/// MIME type of an encoded image, if the format is recognised.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::WebP => Some("image/webp"),
        image::ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(sniff_mime_type(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_mime_type(JPEG_MAGIC), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(b"plain text"), None);
    }

    #[test]
    fn unknown_reference_defaults_to_jpeg() {
        let image = ReferenceImage::from_bytes(b"????".to_vec());
        assert_eq!(image.mime_type, "image/jpeg");

        let image = ReferenceImage::from_bytes(PNG_MAGIC.to_vec());
        assert_eq!(image.mime_type, "image/png");
    }
}
