// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipelines
//!
//! - [`photo`]: one-shot still encoding (the capture sink)

pub mod photo;
