//! Pure frame-to-image conversions.
//!
//! Same frame in, same bytes out; nothing here touches the filesystem
//! or mutates the frame.

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use frameloom_common::{FrameloomError, FrameloomResult};

use crate::frame::FrameBuffer;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Target still-image encoding for a single captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    /// Quality on the 1-100 scale; values outside it are clamped.
    Jpeg { quality: u8 },
}

impl ImageFormat {
    pub fn jpeg_default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// Encode a frame to PNG or JPEG bytes.
///
/// JPEG has no alpha channel, so the buffer is reduced to RGB first;
/// frames arriving here are already composited, so dropping alpha loses
/// nothing visible.
pub fn encode_image(frame: &FrameBuffer, format: ImageFormat) -> FrameloomResult<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ImageFormat::Png => {
            PngEncoder::new(&mut out)
                .write_image(
                    &frame.data,
                    frame.width,
                    frame.height,
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| FrameloomError::encode(format!("PNG encode failed: {e}")))?;
        }
        ImageFormat::Jpeg { quality } => {
            let rgb = rgba_to_rgb(&frame.data);
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
                .map_err(|e| FrameloomError::encode(format!("JPEG encode failed: {e}")))?;
        }
    }
    Ok(out)
}

/// Encode a frame as an inline `data:` URI.
pub fn to_data_uri(frame: &FrameBuffer, format: ImageFormat) -> FrameloomResult<String> {
    let bytes = encode_image(frame, format)?;
    let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", format.mime_type(), payload))
}

fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}
