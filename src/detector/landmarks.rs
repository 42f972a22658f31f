// SPDX-License-Identifier: GPL-3.0-only

//! Hand landmark data model
//!
//! Coordinates are normalized to the frame with a top-left origin, so a
//! smaller `y` is higher in the image. Landmarks are immutable per frame.

use crate::constants::landmarks::HAND_LANDMARK_COUNT;
use serde::{Deserialize, Serialize};

/// A single tracked point on a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, normalized to [0, 1]
    pub x: f32,
    /// Vertical position, normalized to [0, 1]; grows downward
    pub y: f32,
    /// Depth relative to the wrist; optional in the wire format
    #[serde(default)]
    pub z: f32,
}

/// One detected hand: 21 landmarks in fixed anatomical order
///
/// Landmark indices follow the standard hand-landmarker layout; named
/// constants live in [`crate::constants::landmarks`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Hand {
    points: [Landmark; HAND_LANDMARK_COUNT],
}

impl Hand {
    /// Build a hand from exactly 21 landmarks
    pub fn new(points: [Landmark; HAND_LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Landmark at the given anatomical index
    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.points[index]
    }
}

impl TryFrom<Vec<Landmark>> for Hand {
    type Error = String;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        let len = points.len();
        let points: [Landmark; HAND_LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| format!("Expected {} landmarks, got {}", HAND_LANDMARK_COUNT, len))?;
        Ok(Self { points })
    }
}

impl From<Hand> for Vec<Landmark> {
    fn from(hand: Hand) -> Self {
        hand.points.to_vec()
    }
}
