// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame source abstraction
//!
//! A [`FrameSource`] owns the live video stream end to end: it acquires the
//! device, decodes frames, and releases the hardware on [`FrameSource::stop`].
//! Consumers only ever read frames through it; they never manage the stream
//! lifecycle themselves.
//!
//! Readiness and frame pacing are exposed as a [`watch`] channel carrying a
//! monotonically increasing frame sequence number. The channel starts at 0
//! (not ready); every decoded frame bumps it. A sampling loop drives itself
//! off `changed()` notifications instead of a wall-clock timer, so it follows
//! the device's native cadence.

pub mod gst;
pub mod types;

pub use gst::{GstFrameSource, enumerate_cameras};
pub use types::*;

use std::sync::Arc;
use tokio::sync::watch;

/// A live camera frame source
///
/// Implementations must guarantee:
/// - `start` returns only after the stream is acquired (frames may still take
///   a moment to arrive; readiness is observed through [`FrameSource::frames`])
/// - `stop` releases all underlying hardware handles, is idempotent, and is
///   safe to call even if `start` never succeeded
pub trait FrameSource: Send + Sync {
    /// Acquire the device and begin streaming
    fn start(&mut self) -> BackendResult<()>;

    /// Release the stream and all hardware handles (idempotent)
    fn stop(&mut self);

    /// Frame sequence counter; 0 until the first frame is decodable
    fn frames(&self) -> watch::Receiver<u64>;

    /// Most recently decoded frame, if any
    fn latest_frame(&self) -> Option<Arc<CameraFrame>>;
}
