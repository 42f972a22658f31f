// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera frame sources

use gstreamer::buffer::{MappedBuffer, Readable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Result type for frame source operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Frame source errors
#[derive(Debug, Clone)]
pub enum BackendError {
    /// No camera devices found
    NoCameraFound,
    /// Camera initialization failed
    InitializationFailed(String),
    /// Camera disconnected during operation
    Disconnected,
    /// Backend error (e.g., GStreamer)
    Other(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NoCameraFound => write!(f, "No camera devices found"),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Disconnected => write!(f, "Camera disconnected"),
            BackendError::Other(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Frame data storage - either pre-copied bytes or zero-copy GStreamer buffer
///
/// The `Mapped` variant keeps the GStreamer buffer mapped and alive until all
/// references are dropped, so preview frames are passed around without
/// copying pixel data.
#[derive(Clone)]
pub enum FrameData {
    /// Pre-copied bytes (tests, synthetic sources, snapshots)
    Copied(Arc<[u8]>),
    /// Zero-copy mapped GStreamer buffer
    Mapped(Arc<MappedBuffer<Readable>>),
}

impl FrameData {
    /// Wrap a mapped GStreamer buffer without copying
    pub fn from_mapped_buffer(buffer: MappedBuffer<Readable>) -> Self {
        FrameData::Mapped(Arc::new(buffer))
    }

    /// Length of the frame data in bytes
    pub fn len(&self) -> usize {
        match self {
            FrameData::Copied(data) => data.len(),
            FrameData::Mapped(buf) => buf.len(),
        }
    }

    /// Check if the frame data is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FrameData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameData::Copied(data) => write!(f, "FrameData::Copied({} bytes)", data.len()),
            FrameData::Mapped(buf) => write!(f, "FrameData::Mapped({} bytes)", buf.len()),
        }
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        match self {
            FrameData::Copied(data) => data.as_ref(),
            FrameData::Mapped(buf) => buf.as_slice(),
        }
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_ref()
    }
}

/// Pixel format of a camera frame
///
/// The preview pipeline converts everything to RGBA before handing frames to
/// the classifier and the capture sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Rgba => 4,
        }
    }
}

/// A single decoded camera frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data (row-major, `stride` bytes per row)
    pub data: FrameData,
    /// Pixel format
    pub format: PixelFormat,
    /// Bytes per row (may exceed `width * bytes_per_pixel` due to padding)
    pub stride: u32,
    /// When the frame was pulled from the pipeline
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Pixel row at `y`, with any stride padding trimmed
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y * self.stride) as usize;
        let row_bytes = (self.width * self.format.bytes_per_pixel()) as usize;
        &self.data[start..start + row_bytes]
    }
}

/// A camera device discovered through enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Human-readable device name
    pub name: String,
    /// Device path (e.g., /dev/video0); empty lets the source auto-select
    pub path: String,
}

/// A capture format (resolution and framerate) supported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraFormat {
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Framerate in frames per second, if constrained
    pub framerate: Option<u32>,
}

impl fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.framerate {
            Some(fps) => write!(f, "{}x{}@{}fps", self.width, self.height, fps),
            None => write!(f, "{}x{}", self.width, self.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_row_respects_stride() {
        // 2x2 RGBA frame with 4 bytes of padding per row
        let mut data = Vec::new();
        for row in 0..2u8 {
            data.extend_from_slice(&[row; 8]); // two pixels
            data.extend_from_slice(&[0xEE; 4]); // padding
        }
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: FrameData::Copied(Arc::from(data)),
            format: PixelFormat::Rgba,
            stride: 12,
            captured_at: Instant::now(),
        };

        assert_eq!(frame.row(0), &[0u8; 8]);
        assert_eq!(frame.row(1), &[1u8; 8]);
    }

    #[test]
    fn test_format_display() {
        let format = CameraFormat {
            width: 1280,
            height: 720,
            framerate: Some(30),
        };
        assert_eq!(format.to_string(), "1280x720@30fps");
    }
}
