// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the gesture capture session

use std::fmt;

/// Fatal session errors
///
/// Any of these ends the capture session. They are surfaced to the caller as
/// a terminal `Failed` event, distinct from a successful capture, after all
/// resources have been released.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Camera permission denied, no device present, or the device vanished
    DeviceUnavailable(String),
    /// The hand-pose detector could not be brought up, or died mid-session
    Detector(DetectorError),
    /// Encoding the captured frame failed
    Photo(PhotoError),
    /// Storage/filesystem errors (caller-side persistence)
    Storage(String),
    /// Configuration errors
    Config(String),
}

/// Per-frame detector errors
///
/// `Transient` is swallowed at frame granularity (the frame classifies as no
/// pose); `InitFailure` and `Closed` are fatal to the session.
#[derive(Debug, Clone)]
pub enum DetectorError {
    /// Detector resource could not be brought up
    InitFailure(String),
    /// A single frame's classification failed; the loop continues
    Transient(String),
    /// The detector went away mid-session (e.g., sidecar process exited)
    Closed(String),
}

/// Photo capture/encoding errors
#[derive(Debug, Clone)]
pub enum PhotoError {
    /// No frame available for capture
    NoFrameAvailable,
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            SessionError::Detector(e) => write!(f, "Detector error: {}", e),
            SessionError::Photo(e) => write!(f, "Photo error: {}", e),
            SessionError::Storage(msg) => write!(f, "Storage error: {}", msg),
            SessionError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::InitFailure(msg) => write!(f, "Initialization failed: {}", msg),
            DetectorError::Transient(msg) => write!(f, "Transient detection failure: {}", msg),
            DetectorError::Closed(msg) => write!(f, "Detector closed: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}
impl std::error::Error for DetectorError {}
impl std::error::Error for PhotoError {}

impl From<PhotoError> for SessionError {
    fn from(err: PhotoError) -> Self {
        SessionError::Photo(err)
    }
}

impl From<DetectorError> for SessionError {
    fn from(err: DetectorError) -> Self {
        SessionError::Detector(err)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}
