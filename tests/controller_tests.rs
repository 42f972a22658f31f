// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture controller
//!
//! The controller is driven end to end with a synthetic frame source and a
//! scripted detector, so pose sequences, cancellation, and failure paths are
//! fully deterministic. Tests run on a paused tokio clock.

use gesture_capture::backends::camera::{
    BackendError, BackendResult, CameraFrame, FrameData, FrameSource, PixelFormat,
};
use gesture_capture::config::PhotoOutputFormat;
use gesture_capture::constants::landmarks::*;
use gesture_capture::controller::{CaptureController, CaptureEvent, ControllerOptions};
use gesture_capture::detector::{Hand, HandDetector, Landmark, PoseSignal};
use gesture_capture::errors::{DetectorError, SessionError};
use gesture_capture::pipelines::photo::CaptureSink;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A hand with index, middle, and ring fingertips raised
fn confirmed_hand() -> Hand {
    let mut points = [Landmark { x: 0.5, y: 0.5, z: 0.0 }; HAND_LANDMARK_COUNT];
    for (tip, _) in TRACKED_FINGERS {
        points[tip].y = 0.2;
    }
    Hand::new(points)
}

/// One frame's scripted detector behavior
#[derive(Clone)]
enum Step {
    Pose,
    NoHand,
    Transient,
    Closed,
    Stall,
}

/// Detector that plays back a fixed script, then repeats its final step
struct ScriptedDetector {
    script: VecDeque<Step>,
    hold_last: Step,
    fail_init: bool,
    last_timestamp: u64,
    dropped: Option<Arc<AtomicBool>>,
}

impl ScriptedDetector {
    fn new(script: Vec<Step>, hold_last: Step) -> Self {
        Self {
            script: script.into(),
            hold_last,
            fail_init: false,
            last_timestamp: 0,
            dropped: None,
        }
    }

    fn failing_init() -> Self {
        let mut detector = Self::new(Vec::new(), Step::NoHand);
        detector.fail_init = true;
        detector
    }

    /// A detector whose detect call never returns; the flag observes its drop
    fn stalled_forever() -> (Self, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut detector = Self::new(Vec::new(), Step::Stall);
        detector.dropped = Some(Arc::clone(&dropped));
        (detector, dropped)
    }
}

impl Drop for ScriptedDetector {
    fn drop(&mut self) {
        if let Some(flag) = &self.dropped {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl HandDetector for ScriptedDetector {
    async fn init(&mut self) -> Result<(), DetectorError> {
        if self.fail_init {
            Err(DetectorError::InitFailure("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }

    async fn detect(
        &mut self,
        _frame: &CameraFrame,
        timestamp_micros: u64,
    ) -> Result<Option<Hand>, DetectorError> {
        assert!(
            timestamp_micros > self.last_timestamp,
            "timestamps must be strictly increasing"
        );
        self.last_timestamp = timestamp_micros;

        let step = self.script.pop_front().unwrap_or(self.hold_last.clone());
        match step {
            Step::Pose => Ok(Some(confirmed_hand())),
            Step::NoHand => Ok(None),
            Step::Transient => Err(DetectorError::Transient("scripted glitch".to_string())),
            Step::Closed => Err(DetectorError::Closed("scripted death".to_string())),
            Step::Stall => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Synthetic frame source; the test pumps frames through the returned sender
struct FakeSource {
    frames_tx: watch::Sender<u64>,
    frames_rx: watch::Receiver<u64>,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    fail_start: bool,
    frame: Arc<CameraFrame>,
}

impl FakeSource {
    fn new() -> (Self, watch::Sender<u64>, Arc<AtomicBool>) {
        let (frames_tx, frames_rx) = watch::channel(0u64);
        let stopped = Arc::new(AtomicBool::new(false));
        let frame = Arc::new(CameraFrame {
            width: 4,
            height: 4,
            data: FrameData::Copied(Arc::from(vec![0x80u8; 4 * 4 * 4])),
            format: PixelFormat::Rgba,
            stride: 16,
            captured_at: Instant::now(),
        });
        let source = Self {
            frames_tx: frames_tx.clone(),
            frames_rx,
            started: Arc::new(AtomicBool::new(false)),
            stopped: Arc::clone(&stopped),
            fail_start: false,
            frame,
        };
        (source, frames_tx, stopped)
    }

    fn failing_start() -> (Self, Arc<AtomicBool>) {
        let (mut source, _tx, stopped) = Self::new();
        source.fail_start = true;
        (source, stopped)
    }
}

impl FrameSource for FakeSource {
    fn start(&mut self) -> BackendResult<()> {
        if self.fail_start {
            return Err(BackendError::NoCameraFound);
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn frames(&self) -> watch::Receiver<u64> {
        self.frames_rx.clone()
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        if self.started.load(Ordering::SeqCst) && *self.frames_tx.borrow() > 0 {
            Some(Arc::clone(&self.frame))
        } else {
            None
        }
    }
}

/// Fast-ticking options so paused-clock tests converge quickly
fn test_options(countdown_ticks: u32) -> ControllerOptions {
    ControllerOptions {
        countdown_ticks,
        tick_interval: Duration::from_millis(100),
        sink: CaptureSink::new(PhotoOutputFormat::Png, 0, false),
    }
}

/// Pump a frame notification every few milliseconds until dropped
fn pump_frames(frames_tx: watch::Sender<u64>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            frames_tx.send_modify(|seq| *seq += 1);
        }
    })
}

/// Collect events until a terminal one arrives
async fn collect_events(events: &mut tokio::sync::mpsc::Receiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        let terminal = matches!(
            event,
            CaptureEvent::Captured(_) | CaptureEvent::Failed(_) | CaptureEvent::Cancelled
        );
        collected.push(event);
        if terminal {
            break;
        }
    }
    collected
}

fn countdown_values(events: &[CaptureEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::Countdown(n) => Some(*n),
            _ => None,
        })
        .collect()
}

fn captured_count(events: &[CaptureEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, CaptureEvent::Captured(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn held_pose_captures_after_exactly_n_ticks() {
    let (source, frames_tx, stopped) = FakeSource::new();
    let detector = ScriptedDetector::new(Vec::new(), Step::Pose);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    let pump = pump_frames(frames_tx);

    let events = collect_events(&mut events).await;
    pump.abort();

    assert_eq!(countdown_values(&events), vec![3, 2, 1]);
    assert_eq!(captured_count(&events), 1);
    assert!(matches!(events.last(), Some(CaptureEvent::Captured(image)) if image.width == 4));
    assert!(stopped.load(Ordering::SeqCst), "frame source must be released");

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn lost_frame_resets_countdown_and_captures_once() {
    let (source, frames_tx, _stopped) = FakeSource::new();
    // Two confirmed frames, one dropped frame, then the pose holds
    let detector = ScriptedDetector::new(vec![Step::Pose, Step::Pose, Step::NoHand], Step::Pose);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    let pump = pump_frames(frames_tx);

    let events = collect_events(&mut events).await;
    pump.abort();

    // The countdown armed twice (the first run aborted before any tick could
    // fire; frames arrive every 5ms against a 100ms tick), and only the
    // second run counted all the way down
    assert_eq!(countdown_values(&events), vec![3, 3, 2, 1]);
    assert_eq!(captured_count(&events), 1);

    // Feedback is edge-triggered: confirmed, lost, confirmed again
    let feedback: Vec<PoseSignal> = events
        .iter()
        .filter_map(|e| match e {
            CaptureEvent::PoseFeedback(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        feedback,
        vec![PoseSignal::Confirmed, PoseSignal::None, PoseSignal::Confirmed]
    );

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_countdown_never_invokes_the_sink() {
    let (source, frames_tx, stopped) = FakeSource::new();
    let detector = ScriptedDetector::new(Vec::new(), Step::Pose);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    let pump = pump_frames(frames_tx);

    // Wait until the countdown reaches 1, then cancel
    let mut collected = Vec::new();
    while let Some(event) = events.recv().await {
        let at_one = matches!(event, CaptureEvent::Countdown(1));
        collected.push(event);
        if at_one {
            controller.cancel();
            break;
        }
    }
    collected.extend(collect_events(&mut events).await);
    pump.abort();

    assert!(matches!(collected.last(), Some(CaptureEvent::Cancelled)));
    assert_eq!(captured_count(&collected), 0);
    assert!(stopped.load(Ordering::SeqCst), "stop() must run on cancellation");

    // Cancelling again is a no-op
    controller.cancel();
    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn transient_detector_errors_cost_only_that_frame() {
    let (source, frames_tx, _stopped) = FakeSource::new();
    // A glitch mid-hold behaves like a dropped frame: reset, then recapture
    let detector = ScriptedDetector::new(vec![Step::Pose, Step::Transient], Step::Pose);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(2));
    let pump = pump_frames(frames_tx);

    let events = collect_events(&mut events).await;
    pump.abort();

    assert_eq!(captured_count(&events), 1);
    assert!(
        !events.iter().any(|e| matches!(e, CaptureEvent::Failed(_))),
        "transient errors must never surface"
    );

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn unavailable_device_fails_the_session() {
    let (source, stopped) = FakeSource::failing_start();
    let detector = ScriptedDetector::new(Vec::new(), Step::NoHand);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));

    let events = collect_events(&mut events).await;
    assert!(matches!(
        events.last(),
        Some(CaptureEvent::Failed(SessionError::DeviceUnavailable(_)))
    ));
    assert!(stopped.load(Ordering::SeqCst), "stop() must run even when start() failed");

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn detector_init_failure_releases_the_camera() {
    let (source, _frames_tx, stopped) = FakeSource::new();
    let detector = ScriptedDetector::failing_init();

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));

    let events = collect_events(&mut events).await;
    assert!(matches!(
        events.last(),
        Some(CaptureEvent::Failed(SessionError::Detector(_)))
    ));
    assert!(
        stopped.load(Ordering::SeqCst),
        "the already-acquired camera must be released"
    );

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn detector_death_mid_session_fails_the_session() {
    let (source, frames_tx, stopped) = FakeSource::new();
    // One good frame, then the detector dies for good
    let detector = ScriptedDetector::new(vec![Step::Pose], Step::Closed);

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    let pump = pump_frames(frames_tx);

    let events = collect_events(&mut events).await;
    pump.abort();

    assert!(matches!(
        events.last(),
        Some(CaptureEvent::Failed(SessionError::Detector(_)))
    ));
    assert_eq!(captured_count(&events), 0);
    assert!(
        stopped.load(Ordering::SeqCst),
        "the camera must be released before the failure surfaces"
    );

    controller.join().await;
}

#[tokio::test(start_paused = true)]
async fn stalled_detector_does_not_hold_back_cancellation() {
    let (source, frames_tx, stopped) = FakeSource::new();
    let (detector, dropped) = ScriptedDetector::stalled_forever();

    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    let pump = pump_frames(frames_tx);

    // Let the sampling loop enter the never-returning detect call
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.cancel();

    let events = collect_events(&mut events).await;
    pump.abort();

    assert!(matches!(events.last(), Some(CaptureEvent::Cancelled)));
    assert!(stopped.load(Ordering::SeqCst), "stop() must not wait on the detector");

    // Joining drains the sampling loop; past the grace period it is aborted,
    // which tears the stuck detector down with it
    controller.join().await;
    assert!(
        dropped.load(Ordering::SeqCst),
        "the stuck detector must be dropped at session end"
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_before_any_frame_is_clean() {
    let (source, _frames_tx, stopped) = FakeSource::new();
    let detector = ScriptedDetector::new(Vec::new(), Step::NoHand);

    // No frames are ever pumped: the loop idles until cancelled
    let (controller, mut events) = CaptureController::spawn(source, detector, test_options(3));
    controller.cancel();

    let events = collect_events(&mut events).await;
    assert!(matches!(events.last(), Some(CaptureEvent::Cancelled)));
    assert_eq!(captured_count(&events), 0);
    assert!(stopped.load(Ordering::SeqCst));

    controller.join().await;
}
