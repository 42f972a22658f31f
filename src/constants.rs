// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Countdown configuration
pub mod countdown {
    use super::Duration;

    /// Number of ticks counted down after the pose is confirmed
    pub const DEFAULT_TICKS: u32 = 3;

    /// Interval between countdown ticks
    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
}

/// Hand landmark topology (21-point anatomical indexing)
///
/// Index constants follow the standard hand-landmarker layout: wrist at 0,
/// then four landmarks per finger from metacarpal to tip.
pub mod landmarks {
    /// Total landmarks per detected hand
    pub const HAND_LANDMARK_COUNT: usize = 21;

    /// Index finger tip
    pub const INDEX_TIP: usize = 8;
    /// Index finger proximal interphalangeal joint
    pub const INDEX_PIP: usize = 6;
    /// Middle finger tip
    pub const MIDDLE_TIP: usize = 12;
    /// Middle finger proximal interphalangeal joint
    pub const MIDDLE_PIP: usize = 10;
    /// Ring finger tip
    pub const RING_TIP: usize = 16;
    /// Ring finger proximal interphalangeal joint
    pub const RING_PIP: usize = 14;

    /// Tracked (tip, lower joint) pairs for the capture gesture
    pub const TRACKED_FINGERS: [(usize, usize); 3] = [
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
    ];

    /// How many tracked fingers must be raised for a confirmed pose
    pub const REQUIRED_RAISED: usize = TRACKED_FINGERS.len();
}

/// GStreamer pipeline tuning
pub mod pipeline {
    /// Maximum buffered frames in the appsink before old frames are dropped
    pub const MAX_BUFFERS: u32 = 2;

    /// Frame interval between periodic pipeline statistics log lines
    pub const FRAME_LOG_INTERVAL: u64 = 300;
}

/// Timing defaults
pub mod timing {
    use super::Duration;

    /// How long to wait for the camera to deliver its first decodable frame
    pub const SOURCE_READY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Warm-up period before a plain (non-gesture) photo is taken, letting
    /// auto-exposure settle
    pub const PHOTO_WARMUP: Duration = Duration::from_millis(500);

    /// Grace period for the sampling loop to wind down at session end before
    /// it is aborted outright
    pub const SAMPLER_WIND_DOWN: Duration = Duration::from_secs(2);
}

/// Photo encoding defaults
pub mod photo {
    /// Default JPEG encoding quality (0-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;
}
