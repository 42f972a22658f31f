// SPDX-License-Identifier: GPL-3.0-only

//! Gesture capture controller
//!
//! Coordinates the frame source, the sampling loop, the pose classifier, the
//! capture state machine, and the capture sink into one session:
//!
//! ```text
//! Frame Source → Sampling Loop → Classifier → State Machine → Capture Sink
//! ```
//!
//! The caller observes the session through a stream of [`CaptureEvent`]s and
//! can cancel it at any point with [`CaptureController::cancel`]. All state
//! mutation happens on a single cooperative event-loop task, so pose signals
//! are processed in strict frame order and exactly one [`CaptureState`]
//! exists per session. The frame source is released on every exit path:
//! capture, cancellation, and fatal error.

pub mod sampling;
pub mod state_machine;

pub use state_machine::{CaptureState, CaptureStateMachine, SignalEffect, TickEffect};

use crate::backends::camera::FrameSource;
use crate::config::Config;
use crate::constants::{countdown, timing};
use crate::detector::{HandDetector, PoseSignal};
use crate::errors::{PhotoError, SessionError};
use crate::pipelines::photo::{CaptureSink, CapturedImage};
use sampling::SamplingEvent;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Events delivered to the session's caller
///
/// `Captured`, `Failed`, and `Cancelled` are terminal; no further events
/// follow any of them.
#[derive(Debug)]
pub enum CaptureEvent {
    /// The per-frame pose signal changed (for UI highlight); edge-triggered
    PoseFeedback(PoseSignal),
    /// Countdown ticks remaining before the capture fires
    Countdown(u32),
    /// The still was captured; the session is over
    Captured(CapturedImage),
    /// The session failed fatally; distinguishable from a capture
    Failed(SessionError),
    /// The session was cancelled before a capture happened
    Cancelled,
}

/// Session tuning knobs
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Countdown length in ticks once the pose is confirmed
    pub countdown_ticks: u32,
    /// Interval between countdown ticks
    pub tick_interval: Duration,
    /// Still encoder invoked on countdown expiry
    pub sink: CaptureSink,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            countdown_ticks: countdown::DEFAULT_TICKS,
            tick_interval: countdown::TICK_INTERVAL,
            sink: CaptureSink::default(),
        }
    }
}

impl ControllerOptions {
    /// Build options from the persisted user configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            countdown_ticks: config.countdown_ticks,
            tick_interval: countdown::TICK_INTERVAL,
            sink: CaptureSink::new(config.output_format, config.jpeg_quality, config.mirror),
        }
    }
}

/// Handle to a running gesture capture session
///
/// Dropping the handle cancels the session.
pub struct CaptureController {
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl CaptureController {
    /// Start a capture session
    ///
    /// Acquires the frame source, brings up the detector, and runs the
    /// sampling and decision loops as cooperative tasks. Returns the handle
    /// plus the event stream; the first event is either pose feedback or a
    /// terminal `Failed`.
    pub fn spawn<S, D>(
        source: S,
        detector: D,
        options: ControllerOptions,
    ) -> (Self, mpsc::Receiver<CaptureEvent>)
    where
        S: FrameSource + 'static,
        D: HandDetector,
    {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let source = Arc::new(Mutex::new(source));
        let task = tokio::spawn(run_session(
            source,
            detector,
            options,
            events_tx,
            cancel_tx.clone(),
            cancel_rx,
        ));

        (
            Self {
                cancel_tx,
                task: Some(task),
            },
            events_rx,
        )
    }

    /// Cancel the session
    ///
    /// Idempotent and safe to call from any thread, including concurrently
    /// with an in-flight frame classification. Stops the sampling loop,
    /// disarms any pending countdown, and releases the frame source.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Wait for the session task to finish
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock<S>(source: &Arc<Mutex<S>>) -> MutexGuard<'_, S> {
    source.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The session body: acquisition, decision loop, teardown on every exit path
async fn run_session<S, D>(
    source: Arc<Mutex<S>>,
    mut detector: D,
    options: ControllerOptions,
    events: mpsc::Sender<CaptureEvent>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
) where
    S: FrameSource + 'static,
    D: HandDetector,
{
    // Acquire the camera first; failure here is DeviceUnavailable
    let start_result = lock(&source).start();
    if let Err(e) = start_result {
        warn!(error = %e, "Frame source failed to start");
        lock(&source).stop();
        let _ = events
            .send(CaptureEvent::Failed(SessionError::DeviceUnavailable(
                e.to_string(),
            )))
            .await;
        return;
    }

    // Then the detector; the camera is already held, so release it on failure
    if let Err(e) = detector.init().await {
        warn!(error = %e, "Detector failed to initialize");
        lock(&source).stop();
        let _ = events.send(CaptureEvent::Failed(e.into())).await;
        return;
    }

    let frames = lock(&source).frames();
    let (signals_tx, signals_rx) = mpsc::channel(1);
    let mut sampler = tokio::spawn(sampling::run(
        Arc::clone(&source),
        detector,
        frames,
        signals_tx,
        cancel_rx.clone(),
    ));

    let outcome = decision_loop(&source, &options, &events, signals_rx, cancel_rx).await;

    // Internal cancellation: whatever ended the session, the sampling loop
    // must stop rescheduling even if no further frame ever arrives
    let _ = cancel_tx.send(true);

    // Teardown strictly after the sink ran (or the session ended without it)
    lock(&source).stop();

    // Terminal delivery must not wait on an in-flight classification; a
    // detector that never answers would otherwise hold the event back forever
    match outcome {
        Outcome::Captured(image) => {
            info!("Session complete, still captured");
            let _ = events.send(CaptureEvent::Captured(*image)).await;
        }
        Outcome::Cancelled => {
            info!("Session cancelled");
            let _ = events.send(CaptureEvent::Cancelled).await;
        }
        Outcome::Failed(e) => {
            warn!(error = %e, "Session failed");
            let _ = events.send(CaptureEvent::Failed(e)).await;
        }
    }

    // The sampling loop checks the cancel token between awaits, but it cannot
    // interrupt a detect call already in flight. Give it a grace period, then
    // abort, which drops the detector and with it any sidecar process.
    if tokio::time::timeout(timing::SAMPLER_WIND_DOWN, &mut sampler)
        .await
        .is_err()
    {
        warn!("Sampling loop stuck in an in-flight classification, aborting");
        sampler.abort();
        let _ = sampler.await;
    }
}

/// Terminal result of the decision loop
enum Outcome {
    Captured(Box<CapturedImage>),
    Cancelled,
    Failed(SessionError),
}

/// The decision core: converts pose signals and timer ticks into the
/// session's terminal outcome
async fn decision_loop<S: FrameSource>(
    source: &Arc<Mutex<S>>,
    options: &ControllerOptions,
    events: &mpsc::Sender<CaptureEvent>,
    mut signals: mpsc::Receiver<SamplingEvent>,
    mut cancel: watch::Receiver<bool>,
) -> Outcome {
    let mut machine = CaptureStateMachine::new(options.countdown_ticks);
    let mut countdown_timer: Option<Pin<Box<tokio::time::Sleep>>> = None;
    let mut last_feedback: Option<PoseSignal> = None;

    if *cancel.borrow() {
        return Outcome::Cancelled;
    }

    loop {
        let tick = async {
            match countdown_timer.as_mut() {
                Some(sleep) => sleep.as_mut().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    return Outcome::Cancelled;
                }
            }

            event = signals.recv() => {
                match event {
                    Some(SamplingEvent::Signal(signal)) => {
                        // Edge-triggered UI feedback; the raw signal repeats
                        // every frame
                        if last_feedback != Some(signal) {
                            last_feedback = Some(signal);
                            let _ = events.send(CaptureEvent::PoseFeedback(signal)).await;
                        }

                        match machine.on_signal(signal) {
                            SignalEffect::StartCountdown(remaining) => {
                                debug!(remaining, "Pose confirmed, countdown armed");
                                let _ = events.send(CaptureEvent::Countdown(remaining)).await;
                                countdown_timer =
                                    Some(Box::pin(tokio::time::sleep(options.tick_interval)));
                            }
                            SignalEffect::AbortCountdown => {
                                debug!("Pose lost mid-countdown, resetting");
                                countdown_timer = None;
                            }
                            SignalEffect::None => {}
                        }
                    }
                    Some(SamplingEvent::DetectorFailed(e)) => {
                        return Outcome::Failed(e.into());
                    }
                    None => {
                        // Sampling loop gone without a fatal report; only
                        // happens on cancellation races
                        if *cancel.borrow() {
                            return Outcome::Cancelled;
                        }
                        return Outcome::Failed(SessionError::DeviceUnavailable(
                            "Frame sampling ended unexpectedly".to_string(),
                        ));
                    }
                }
            }

            _ = tick => {
                countdown_timer = None;
                match machine.on_tick() {
                    TickEffect::Continue(remaining) => {
                        debug!(remaining, "Countdown tick");
                        let _ = events.send(CaptureEvent::Countdown(remaining)).await;
                        countdown_timer =
                            Some(Box::pin(tokio::time::sleep(options.tick_interval)));
                    }
                    TickEffect::Capture => {
                        // Single-shot: runs at most once per session, and
                        // strictly before teardown is initiated
                        return match capture_still(source, &options.sink) {
                            Ok(image) => Outcome::Captured(Box::new(image)),
                            Err(e) => Outcome::Failed(e.into()),
                        };
                    }
                    TickEffect::Ignored => {}
                }
            }
        }
    }
}

/// Grab the current frame snapshot and run it through the capture sink
fn capture_still<S: FrameSource>(
    source: &Arc<Mutex<S>>,
    sink: &CaptureSink,
) -> Result<CapturedImage, PhotoError> {
    let frame = lock(source)
        .latest_frame()
        .ok_or(PhotoError::NoFrameAvailable)?;
    sink.encode(&frame)
}
