// SPDX-License-Identifier: GPL-3.0-only

//! Gesture Capture - gesture-triggered webcam photo capture
//!
//! A continuous-sampling capture controller: noisy per-frame hand-pose
//! classifications from an external landmark detector are debounced into a
//! stable "pose confirmed" signal, a cancellable countdown runs, and a still
//! image is captured exactly once per session.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: camera frame source abstraction (GStreamer production impl)
//! - [`detector`]: hand landmark model, pose classifier, detector adapters
//! - [`controller`]: the capture state machine, sampling loop, and session
//!   orchestration
//! - [`pipelines`]: the one-shot photo capture sink
//! - [`config`]: user configuration handling
//! - [`storage`]: caller-side persistence of captured stills
//!
//! Data flows one direction:
//!
//! ```text
//! Frame Source → Sampling Loop → Classifier → State Machine → Capture Sink
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod controller;
pub mod detector;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{CameraDevice, CameraFrame, FrameSource, GstFrameSource};
pub use config::Config;
pub use controller::{CaptureController, CaptureEvent, CaptureState, ControllerOptions};
pub use detector::{Hand, HandDetector, Landmark, PoseSignal, ProcessDetector, classify};
pub use errors::SessionError;
pub use pipelines::photo::{CaptureSink, CapturedImage};
