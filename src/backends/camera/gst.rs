// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer frame source
//!
//! Builds a `pipewiresrc`/`v4l2src → videoconvert → appsink` pipeline that
//! delivers decoded RGBA frames. The appsink callback keeps only the most
//! recent frame (zero-copy via a mapped buffer) and bumps the frame sequence
//! counter; slow consumers never cause frames to queue up.

use super::FrameSource;
use super::types::*;
use crate::constants::pipeline as pipeline_constants;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Shared slot holding the most recently decoded frame
type FrameSlot = Arc<Mutex<Option<Arc<CameraFrame>>>>;

/// GStreamer-backed camera frame source
pub struct GstFrameSource {
    device: CameraDevice,
    format: Option<CameraFormat>,
    pipeline: Option<gstreamer::Pipeline>,
    frame_slot: FrameSlot,
    frames_tx: watch::Sender<u64>,
    frames_rx: watch::Receiver<u64>,
}

impl GstFrameSource {
    /// Create a frame source for the given device
    ///
    /// `format` constrains resolution/framerate; `None` lets the device pick.
    /// Nothing is acquired until [`FrameSource::start`] is called.
    pub fn new(device: CameraDevice, format: Option<CameraFormat>) -> Self {
        let (frames_tx, frames_rx) = watch::channel(0u64);
        Self {
            device,
            format,
            pipeline: None,
            frame_slot: Arc::new(Mutex::new(None)),
            frames_tx,
            frames_rx,
        }
    }

    /// Build the pipeline description for this device and format
    fn pipeline_description(&self) -> String {
        // /dev paths go straight to v4l2; anything else lets PipeWire route it
        let source = if self.device.path.starts_with("/dev/") {
            format!("v4l2src device={}", self.device.path)
        } else if self.device.path.is_empty() {
            "pipewiresrc".to_string()
        } else {
            format!("pipewiresrc target-object={}", self.device.path)
        };

        let caps = match self.format {
            Some(CameraFormat {
                width,
                height,
                framerate: Some(fps),
            }) => format!(
                "video/x-raw,format=RGBA,width={},height={},framerate={}/1",
                width, height, fps
            ),
            Some(CameraFormat { width, height, .. }) => {
                format!("video/x-raw,format=RGBA,width={},height={}", width, height)
            }
            None => "video/x-raw,format=RGBA".to_string(),
        };

        format!(
            "{} ! videoconvert ! {} ! appsink name=sink",
            source, caps
        )
    }
}

impl FrameSource for GstFrameSource {
    fn start(&mut self) -> BackendResult<()> {
        if self.pipeline.is_some() {
            debug!("Frame source already started");
            return Ok(());
        }

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let description = self.pipeline_description();
        info!(device = %self.device.name, pipeline = %description, "Starting frame source");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Parsed element is not a pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        // Keep latency low: drop old frames rather than queueing them
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline_constants::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frame_slot = Arc::clone(&self.frame_slot);
        let frames_tx = self.frames_tx.clone();

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;

                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                        error!(error = ?e, "Failed to read video info from caps");
                        gstreamer::FlowError::Error
                    })?;

                    let buffer = sample
                        .buffer_owned()
                        .ok_or(gstreamer::FlowError::Error)?;
                    let map = buffer.into_mapped_buffer_readable().map_err(|_| {
                        warn!("Failed to map frame buffer");
                        gstreamer::FlowError::Error
                    })?;

                    let frame = Arc::new(CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: FrameData::from_mapped_buffer(map),
                        format: PixelFormat::Rgba,
                        captured_at: Instant::now(),
                    });

                    if let Ok(mut slot) = frame_slot.lock() {
                        *slot = Some(frame);
                    }

                    // Bump the sequence counter; subscribers wake on changed()
                    frames_tx.send_modify(|seq| {
                        *seq += 1;
                        if *seq % pipeline_constants::FRAME_LOG_INTERVAL == 0 {
                            debug!(frames = *seq, "Frame source statistics");
                        }
                    });

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            let _ = pipeline.set_state(gstreamer::State::Null);
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            info!(device = %self.device.name, "Stopping frame source");
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!(error = %e, "Failed to stop pipeline cleanly");
            }
        }
        if let Ok(mut slot) = self.frame_slot.lock() {
            *slot = None;
        }
    }

    fn frames(&self) -> watch::Receiver<u64> {
        self.frames_rx.clone()
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frame_slot.lock().ok()?.clone()
    }
}

impl Drop for GstFrameSource {
    fn drop(&mut self) {
        // Scoped release: the stream never outlives the source
        self.stop();
    }
}

/// Enumerate available cameras via the GStreamer device monitor
pub fn enumerate_cameras() -> BackendResult<Vec<CameraDevice>> {
    gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    monitor.add_filter(Some("Video/Source"), None);
    monitor
        .start()
        .map_err(|e| BackendError::Other(format!("Device monitor failed to start: {}", e)))?;

    let mut cameras = Vec::new();
    for device in monitor.devices() {
        let name = device.display_name().to_string();
        let path = device
            .properties()
            .and_then(|props| {
                props
                    .get::<String>("device.path")
                    .or_else(|_| props.get::<String>("api.v4l2.path"))
                    .or_else(|_| props.get::<String>("object.path"))
                    .ok()
            })
            .unwrap_or_default();

        debug!(name = %name, path = %path, "Found camera");
        cameras.push(CameraDevice { name, path });
    }

    monitor.stop();

    if cameras.is_empty() {
        // Fall back to source auto-selection rather than failing enumeration
        info!("No cameras enumerated, offering auto-selected default");
        cameras.push(CameraDevice {
            name: "Default Camera".to_string(),
            path: String::new(),
        });
    }

    Ok(cameras)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_description_v4l2() {
        let source = GstFrameSource::new(
            CameraDevice {
                name: "UVC".to_string(),
                path: "/dev/video0".to_string(),
            },
            Some(CameraFormat {
                width: 1280,
                height: 720,
                framerate: Some(30),
            }),
        );
        let desc = source.pipeline_description();
        assert!(desc.starts_with("v4l2src device=/dev/video0"));
        assert!(desc.contains("framerate=30/1"));
        assert!(desc.ends_with("appsink name=sink"));
    }

    #[test]
    fn test_pipeline_description_auto() {
        let source = GstFrameSource::new(
            CameraDevice {
                name: "Default".to_string(),
                path: String::new(),
            },
            None,
        );
        assert!(source.pipeline_description().starts_with("pipewiresrc !"));
    }
}
