// SPDX-License-Identifier: GPL-3.0-only

//! Capture state machine
//!
//! Converts the per-frame stream of [`PoseSignal`] values plus countdown
//! timer ticks into the session's [`CaptureState`]. The machine is pure: it
//! owns no timer itself, it returns effects telling the controller what to do
//! (arm the countdown, disarm it, trigger the single-shot capture).
//!
//! Transition invariant: `Idle → CountingDown → Captured`, with
//! `CountingDown → Idle` on any single frame of signal loss. `Captured` is
//! terminal; nothing transitions out of it.

use crate::detector::PoseSignal;

/// The session's capture state
///
/// Exactly one instance exists per session, owned and mutated exclusively by
/// the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for the pose to appear
    Idle,
    /// Pose confirmed; counting down the remaining ticks
    CountingDown(u32),
    /// The still has been captured; terminal
    Captured,
}

/// Effect of feeding a pose signal into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEffect {
    /// No transition; nothing to do
    None,
    /// Pose just confirmed: arm the countdown timer at this many ticks
    StartCountdown(u32),
    /// Pose lost mid-countdown: disarm the timer, all progress discarded
    AbortCountdown,
}

/// Effect of a countdown timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    /// Countdown continues with this many ticks remaining; re-arm the timer
    Continue(u32),
    /// Countdown expired: trigger the single-shot capture
    Capture,
    /// Tick arrived outside a countdown (stale timer); drop it
    Ignored,
}

/// The capture decision core
#[derive(Debug)]
pub struct CaptureStateMachine {
    state: CaptureState,
    countdown_ticks: u32,
}

impl CaptureStateMachine {
    /// Create a machine counting down `countdown_ticks` once the pose holds
    pub fn new(countdown_ticks: u32) -> Self {
        Self {
            state: CaptureState::Idle,
            countdown_ticks: countdown_ticks.max(1),
        }
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Feed one frame's pose signal
    ///
    /// Confirmation is instantaneous per frame, but the countdown is guarded
    /// against any single frame of loss: one `None` mid-countdown resets to
    /// `Idle` with no partial credit, and a later re-confirmation restarts
    /// the full countdown.
    pub fn on_signal(&mut self, signal: PoseSignal) -> SignalEffect {
        match (self.state, signal) {
            (CaptureState::Idle, PoseSignal::Confirmed) => {
                self.state = CaptureState::CountingDown(self.countdown_ticks);
                SignalEffect::StartCountdown(self.countdown_ticks)
            }
            (CaptureState::CountingDown(_), PoseSignal::None) => {
                self.state = CaptureState::Idle;
                SignalEffect::AbortCountdown
            }
            // Idle without a pose, a held pose mid-countdown, and anything
            // after Captured are all no-ops
            _ => SignalEffect::None,
        }
    }

    /// Feed one countdown timer tick
    pub fn on_tick(&mut self) -> TickEffect {
        match self.state {
            CaptureState::CountingDown(remaining) => {
                let remaining = remaining - 1;
                if remaining == 0 {
                    self.state = CaptureState::Captured;
                    TickEffect::Capture
                } else {
                    self.state = CaptureState::CountingDown(remaining);
                    TickEffect::Continue(remaining)
                }
            }
            _ => TickEffect::Ignored,
        }
    }
}
