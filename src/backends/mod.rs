// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! Hardware access sits behind the [`camera::FrameSource`] trait, so the
//! capture controller never touches GStreamer directly and tests can
//! substitute a synthetic frame source.

pub mod camera;
