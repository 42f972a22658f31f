// SPDX-License-Identifier: GPL-3.0-only

//! Hand-pose detection
//!
//! The landmark detector itself is an external capability consumed as a black
//! box: given a video frame and a timestamp it returns zero or one hand's
//! landmark set. It is injected at construction, so tests drive the capture
//! controller with a scripted fake instead of a live model.
//!
//! Modules:
//! - [`landmarks`]: the [`Landmark`]/[`Hand`] data model
//! - [`classifier`]: the pure per-frame pose rule producing a [`PoseSignal`]
//! - [`process`]: the production adapter running a detector sidecar process

pub mod classifier;
pub mod landmarks;
pub mod process;

pub use classifier::{PoseSignal, classify};
pub use landmarks::{Hand, Landmark};
pub use process::ProcessDetector;

use crate::backends::camera::CameraFrame;
use crate::errors::DetectorError;
use std::future::Future;

/// An external hand-landmark detector
///
/// `detect` must tolerate being called once per frame at the device's native
/// cadence; callers guarantee strictly increasing timestamps. At most one
/// detection is outstanding at a time.
pub trait HandDetector: Send + 'static {
    /// Bring up the detector resource
    ///
    /// Failure is fatal to the session ([`DetectorError::InitFailure`]).
    fn init(&mut self) -> impl Future<Output = Result<(), DetectorError>> + Send;

    /// Detect the first hand in the frame, if any
    ///
    /// Absence of a hand is a valid `Ok(None)` observation, not an error.
    fn detect(
        &mut self,
        frame: &CameraFrame,
        timestamp_micros: u64,
    ) -> impl Future<Output = Result<Option<Hand>, DetectorError>> + Send;
}
