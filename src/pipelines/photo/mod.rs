// SPDX-License-Identifier: GPL-3.0-only

//! Capture sink: one-shot still encoding
//!
//! Given a ready RGBA frame, produces an encoded [`CapturedImage`] and hands
//! it to the caller. Encoding is synchronous and side-effect free; the
//! controller sequences the sink strictly before frame-source teardown, so a
//! capture never races the stream being stopped.

use crate::backends::camera::CameraFrame;
use crate::config::PhotoOutputFormat;
use crate::constants::photo::DEFAULT_JPEG_QUALITY;
use crate::errors::PhotoError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// An encoded still image, created exactly once per session
///
/// The payload is opaque to the controller; the caller owns it after handoff
/// and is responsible for storage.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Encoding of `data`
    pub format: PhotoOutputFormat,
    /// Pixel width of the still
    pub width: u32,
    /// Pixel height of the still
    pub height: u32,
}

impl CapturedImage {
    /// MIME type of the encoded payload
    pub fn mime_type(&self) -> &'static str {
        match self.format {
            PhotoOutputFormat::Jpeg => "image/jpeg",
            PhotoOutputFormat::Png => "image/png",
        }
    }

    /// File extension for the encoded payload
    pub fn extension(&self) -> &'static str {
        match self.format {
            PhotoOutputFormat::Jpeg => "jpg",
            PhotoOutputFormat::Png => "png",
        }
    }

    /// Render the payload as a `data:` URL (base64), the form web callers
    /// embed directly
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), BASE64.encode(&self.data))
    }
}

/// One-shot still encoder
#[derive(Debug, Clone)]
pub struct CaptureSink {
    format: PhotoOutputFormat,
    jpeg_quality: u8,
    mirror: bool,
}

impl CaptureSink {
    /// Create a sink with the given output format and JPEG quality
    pub fn new(format: PhotoOutputFormat, jpeg_quality: u8, mirror: bool) -> Self {
        Self {
            format,
            jpeg_quality,
            mirror,
        }
    }

    /// Encode a frame snapshot into a still image
    pub fn encode(&self, frame: &CameraFrame) -> Result<CapturedImage, PhotoError> {
        debug!(
            width = frame.width,
            height = frame.height,
            format = ?self.format,
            "Encoding captured frame"
        );

        // Re-pack row by row so stride padding never lands in the image
        let mut pixels =
            Vec::with_capacity((frame.width * frame.height * frame.format.bytes_per_pixel()) as usize);
        for y in 0..frame.height {
            pixels.extend_from_slice(frame.row(y));
        }

        let rgba = RgbaImage::from_raw(frame.width, frame.height, pixels).ok_or_else(|| {
            PhotoError::EncodingFailed("Frame dimensions do not match pixel data".to_string())
        })?;

        let mut image = DynamicImage::ImageRgba8(rgba);
        if self.mirror {
            image = image.fliph();
        }

        let mut data = Vec::new();
        match self.format {
            PhotoOutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = image.to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut data, self.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
            }
            PhotoOutputFormat::Png => {
                image
                    .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                    .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
            }
        }

        Ok(CapturedImage {
            data,
            format: self.format,
            width: frame.width,
            height: frame.height,
        })
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new(PhotoOutputFormat::Jpeg, DEFAULT_JPEG_QUALITY, false)
    }
}
