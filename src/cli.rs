// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for gesture capture
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a plain photo (no gesture trigger)
//! - Running a gesture capture session

use gesture_capture::backends::camera::{
    CameraDevice, FrameSource, GstFrameSource, enumerate_cameras,
};
use gesture_capture::config::Config;
use gesture_capture::constants::timing;
use gesture_capture::controller::{CaptureController, CaptureEvent, ControllerOptions};
use gesture_capture::detector::{PoseSignal, ProcessDetector};
use gesture_capture::pipelines::photo::CaptureSink;
use gesture_capture::storage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::timeout;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// List all available cameras
pub fn list_cameras() -> CliResult {
    let cameras = enumerate_cameras()?;

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        if camera.path.is_empty() {
            println!("  [{}] {}", index, camera.name);
        } else {
            println!("  [{}] {} ({})", index, camera.name, camera.path);
        }
    }

    Ok(())
}

/// Resolve a camera index from `list` into a device
fn select_camera(camera_index: usize) -> Result<CameraDevice, Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras()?;
    if cameras.is_empty() {
        return Err("No cameras found".into());
    }
    cameras.get(camera_index).cloned().ok_or_else(|| {
        format!(
            "Camera index {} out of range (0-{})",
            camera_index,
            cameras.len() - 1
        )
        .into()
    })
}

/// Start a source and wait until it delivers its first decodable frame
async fn wait_until_ready(source: &GstFrameSource) -> CliResult {
    let mut frames = source.frames();
    let ready = async {
        while *frames.borrow_and_update() == 0 {
            if frames.changed().await.is_err() {
                break;
            }
        }
    };
    timeout(timing::SOURCE_READY_TIMEOUT, ready)
        .await
        .map_err(|_| "Timed out waiting for the camera to deliver frames".into())
}

/// Take a plain photo (no gesture trigger) with the specified camera
pub async fn take_photo(camera_index: usize, output: Option<PathBuf>) -> CliResult {
    let config = Config::load();
    let device = select_camera(camera_index)?;
    println!("Using camera: {}", device.name);

    let mut source = GstFrameSource::new(device, None);
    source.start()?;

    let result = async {
        wait_until_ready(&source).await?;
        // Let auto-exposure settle before grabbing the snapshot
        tokio::time::sleep(timing::PHOTO_WARMUP).await;

        let frame = source
            .latest_frame()
            .ok_or("Failed to capture frame from camera")?;

        let sink = CaptureSink::new(config.output_format, config.jpeg_quality, config.mirror);
        let image = sink.encode(&frame)?;

        let path = output_path(output, &config, &image);
        storage::save_image(&image, &path)?;
        println!("Photo saved to {}", path.display());
        Ok(())
    }
    .await;

    source.stop();
    result
}

/// Run a gesture capture session with the specified camera
///
/// `detector_command` is the sidecar landmark-detector invocation, e.g.
/// `"python3 hand_landmarker.py"`. Ctrl-C cancels the session cleanly.
pub async fn capture_gesture(
    camera_index: usize,
    detector_command: String,
    output: Option<PathBuf>,
    countdown: Option<u32>,
) -> CliResult {
    let mut config = Config::load();
    if let Some(ticks) = countdown {
        config.countdown_ticks = ticks;
    }

    let device = select_camera(camera_index)?;
    println!("Using camera: {}", device.name);

    let mut parts = detector_command.split_whitespace();
    let program = parts
        .next()
        .ok_or("Detector command must not be empty")?
        .to_string();
    let args: Vec<String> = parts.map(str::to_string).collect();

    let source = GstFrameSource::new(device.clone(), None);
    let detector = ProcessDetector::new(program, args);
    let options = ControllerOptions::from_config(&config);

    let (controller, mut events) = CaptureController::spawn(source, detector, options);
    let controller = Arc::new(controller);

    // Ctrl-C maps onto session cancellation; teardown happens in-session
    let cancel_handle = Arc::clone(&controller);
    ctrlc::set_handler(move || cancel_handle.cancel())?;

    println!("Raise your hand (index, middle, and ring fingers) to capture.");

    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::PoseFeedback(PoseSignal::Confirmed) => {
                println!("Pose detected, hold it...");
            }
            CaptureEvent::PoseFeedback(PoseSignal::None) => {
                println!("Pose lost.");
            }
            CaptureEvent::Countdown(remaining) => {
                println!("Capturing in {}...", remaining);
            }
            CaptureEvent::Captured(image) => {
                let path = output_path(output.clone(), &config, &image);
                storage::save_image(&image, &path)?;
                println!("Photo saved to {}", path.display());

                config.last_camera_path = Some(device.path.clone());
                if let Err(e) = config.save() {
                    tracing::warn!(error = %e, "Failed to persist configuration");
                }
                break;
            }
            CaptureEvent::Cancelled => {
                println!("Capture cancelled.");
                break;
            }
            CaptureEvent::Failed(e) => {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn output_path(
    output: Option<PathBuf>,
    config: &Config,
    image: &gesture_capture::pipelines::photo::CapturedImage,
) -> PathBuf {
    match output {
        Some(path) if path.extension().is_some() => path,
        Some(dir) => storage::timestamped_path(&dir, image),
        None => {
            let dir = config
                .output_dir
                .clone()
                .unwrap_or_else(storage::default_photo_dir);
            storage::timestamped_path(&dir, image)
        }
    }
}
