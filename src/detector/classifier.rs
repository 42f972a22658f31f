// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame pose classification
//!
//! A pure, stateless rule over landmark geometry. The signal is recomputed
//! every frame and never persisted; debouncing happens downstream in the
//! capture state machine.

use super::landmarks::Hand;
use crate::constants::landmarks::{REQUIRED_RAISED, TRACKED_FINGERS};

/// The per-frame classification of "capture gesture visible"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseSignal {
    /// No hand, or fewer than the required fingers raised
    #[default]
    None,
    /// All tracked fingers raised; the gesture is showing this frame
    Confirmed,
}

/// Classify one frame's detection result
///
/// A finger counts as raised when its tip sits strictly above its proximal
/// joint (smaller `y` in a top-left-origin frame). The pose is confirmed when
/// all tracked fingers (index, middle, ring) are raised. Absence of a hand is
/// a valid observation, not an error.
pub fn classify(hand: Option<&Hand>) -> PoseSignal {
    let Some(hand) = hand else {
        return PoseSignal::None;
    };

    let raised = TRACKED_FINGERS
        .iter()
        .filter(|(tip, pip)| hand.landmark(*tip).y < hand.landmark(*pip).y)
        .count();

    if raised >= REQUIRED_RAISED {
        PoseSignal::Confirmed
    } else {
        PoseSignal::None
    }
}
