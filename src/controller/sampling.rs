// SPDX-License-Identifier: GPL-3.0-only

//! Cooperative per-frame sampling loop
//!
//! Drives one classification per decoded frame, paced by the frame source's
//! sequence-counter notifications rather than a wall-clock timer, and forwards
//! each resulting [`PoseSignal`] to the controller in strict frame order. The
//! bounded signal channel (capacity 1) guarantees at most one outstanding
//! classification at a time.
//!
//! The loop never blocks while the source is not ready; it simply re-awaits
//! the next frame notification. A cancelled token stops rescheduling; an
//! in-flight detection is allowed to complete but its result is discarded.

use crate::backends::camera::{CameraFrame, FrameSource};
use crate::detector::{HandDetector, PoseSignal, classify};
use crate::errors::DetectorError;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

/// What the sampling loop reports to the controller
#[derive(Debug)]
pub(crate) enum SamplingEvent {
    /// One frame's pose classification, in strict frame order
    Signal(PoseSignal),
    /// The detector went away mid-session; fatal
    DetectorFailed(DetectorError),
}

/// Run the sampling loop until cancellation or detector failure
///
/// Returns when the cancel token trips, the signal channel closes, the frame
/// source is dropped, or the detector fails fatally.
pub(crate) async fn run<S, D>(
    source: Arc<Mutex<S>>,
    mut detector: D,
    mut frames: watch::Receiver<u64>,
    signals: mpsc::Sender<SamplingEvent>,
    mut cancel: watch::Receiver<bool>,
) where
    S: FrameSource,
    D: HandDetector,
{
    let session_start = Instant::now();
    let mut last_timestamp: u64 = 0;

    debug!("Sampling loop started");

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    debug!("Frame source dropped, sampling loop exiting");
                    break;
                }
            }
            _ = cancel.changed() => {}
        }
        if *cancel.borrow() {
            break;
        }

        // Not ready yet (stream not started or no decodable frame):
        // reschedule without sampling
        let seq = *frames.borrow_and_update();
        if seq == 0 {
            continue;
        }

        let Some(frame) = latest_frame(&source) else {
            continue;
        };

        // Detectors may reject non-increasing timestamps, so clamp strictly
        // upward even if two frames land within the same microsecond
        let mut timestamp = session_start.elapsed().as_micros() as u64;
        if timestamp <= last_timestamp {
            timestamp = last_timestamp + 1;
        }
        last_timestamp = timestamp;

        let signal = match detector.detect(&frame, timestamp).await {
            Ok(hand) => classify(hand.as_ref()),
            Err(DetectorError::Transient(msg)) => {
                // Fail-open: a single bad frame classifies as no pose
                trace!(error = %msg, "Transient detector error, treating frame as no pose");
                PoseSignal::None
            }
            Err(e) => {
                warn!(error = %e, "Detector failed, ending session");
                let _ = signals.send(SamplingEvent::DetectorFailed(e)).await;
                break;
            }
        };

        // The detection was in flight while cancellation landed: discard it
        if *cancel.borrow() {
            break;
        }

        if signals.send(SamplingEvent::Signal(signal)).await.is_err() {
            debug!("Signal channel closed, sampling loop exiting");
            break;
        }
    }

    debug!("Sampling loop stopped");
}

fn latest_frame<S: FrameSource>(source: &Arc<Mutex<S>>) -> Option<Arc<CameraFrame>> {
    source
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .latest_frame()
}
