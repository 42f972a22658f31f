// SPDX-License-Identifier: GPL-3.0-only

//! Storage of captured stills
//!
//! Persistence is the caller's responsibility; the controller only hands over
//! the encoded payload. This module is that caller-side piece for the CLI:
//! timestamped filenames under the user's pictures directory.

use crate::pipelines::photo::CapturedImage;
use crate::errors::PhotoError;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default directory for captured stills (`~/Pictures/gesture-capture`)
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gesture-capture")
}

/// Build a timestamped output path for a captured still
pub fn timestamped_path(dir: &Path, image: &CapturedImage) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("photo_{}.{}", stamp, image.extension()))
}

/// Save a captured still to `path`, creating parent directories as needed
pub fn save_image(image: &CapturedImage, path: &Path) -> Result<(), PhotoError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &image.data)?;

    info!(path = %path.display(), bytes = image.data.len(), "Saved captured still");
    Ok(())
}
