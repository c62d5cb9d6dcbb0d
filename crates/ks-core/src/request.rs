use image::ImageFormat;
use serde::{Deserialize, Serialize};
use crate::error::SourceImageError;
use crate::model_types::{AspectRatio, Resolution};

/// Image used as the first frame of a generated video.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SourceImage {
    /// Wraps raw file bytes, sniffing the mime type from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SourceImageError> {
        if bytes.is_empty() {
            return Err(SourceImageError::Empty);
        }

        let format = image::guess_format(&bytes).map_err(|_| SourceImageError::Unsupported)?;
        let mime_type = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            _ => return Err(SourceImageError::Unsupported),
        };

        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: Option<SourceImage>,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: SourceImage) -> Self {
        self.source_image = Some(image);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];

    #[test]
    fn sniffs_png_and_jpeg() {
        let png = SourceImage::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(png.mime_type, "image/png");

        let jpeg = SourceImage::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        assert_eq!(jpeg.mime_type, "image/jpeg");
    }

    #[test]
    fn rejects_empty_and_unknown_bytes() {
        assert!(matches!(SourceImage::from_bytes(Vec::new()), Err(SourceImageError::Empty)));
        assert!(matches!(
            SourceImage::from_bytes(b"definitely not an image".to_vec()),
            Err(SourceImageError::Unsupported)
        ));
    }

    #[test]
    fn builder_keeps_defaults() {
        let request = GenerationRequest::new("a lighthouse at dusk")
            .with_aspect_ratio(AspectRatio::Portrait);

        assert_eq!(request.resolution, Resolution::Hd);
        assert_eq!(request.aspect_ratio, AspectRatio::Portrait);
        assert!(request.source_image.is_none());
    }
}
