//! Clock utilities for preview playback and export.
//!
//! Two time bases drive the renderer:
//! - [`PlaybackClock`]: a monotonic wall clock used for interactive preview
//! - [`VirtualClock`]: an fps-stepped clock used for deterministic export

use std::time::{Duration, Instant};

/// Tolerance applied before rounding frame counts up, so that products such
/// as `2.0 * 10.0` that land a hair above an integer do not gain a frame.
const FRAME_EPSILON: f64 = 1e-9;

/// A preview clock mapping wall time onto timeline seconds.
///
/// The clock is anchored to a timeline position and an instant; while
/// running, the timeline position advances at real-time speed.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    anchor_time: f64,
    anchor_instant: Option<Instant>,

    /// Wall-clock time the clock was created (RFC 3339).
    created_wall: String,
}

impl PlaybackClock {
    /// Create a stopped clock at timeline position zero.
    pub fn new() -> Self {
        Self {
            anchor_time: 0.0,
            anchor_instant: None,
            created_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Start advancing from the current position.
    pub fn start(&mut self) {
        if self.anchor_instant.is_none() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    /// Freeze the clock at its current position.
    pub fn stop(&mut self) {
        self.anchor_time = self.time();
        self.anchor_instant = None;
    }

    /// Jump to a timeline position, keeping the running state.
    pub fn seek(&mut self, time: f64) {
        self.anchor_time = time.max(0.0);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    /// Whether the clock is advancing.
    pub fn is_running(&self) -> bool {
        self.anchor_instant.is_some()
    }

    /// Current timeline position in seconds.
    pub fn time(&self) -> f64 {
        match self.anchor_instant {
            Some(instant) => self.anchor_time + instant.elapsed().as_secs_f64(),
            None => self.anchor_time,
        }
    }

    /// Wall-clock time at creation.
    pub fn created_wall(&self) -> &str {
        &self.created_wall
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

/// An fps-stepped clock for export.
///
/// Frame `i` sits at exactly `i / fps` seconds. A timeline of `d` seconds
/// spans frames `0..=ceil(d * fps)`, so both the first and the final instant
/// are rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualClock {
    fps: f64,
}

impl VirtualClock {
    /// Create a clock ticking at `fps` frames per second.
    ///
    /// Returns `None` for non-positive or non-finite rates.
    pub fn new(fps: f64) -> Option<Self> {
        (fps.is_finite() && fps > 0.0).then_some(Self { fps })
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Time of a frame index in seconds.
    pub fn time_at(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }

    /// Number of frames needed to cover `duration_secs`, endpoints included.
    pub fn frame_count(&self, duration_secs: f64) -> u64 {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return 1;
        }
        let last_index = (duration_secs * self.fps - FRAME_EPSILON).ceil().max(0.0) as u64;
        last_index + 1
    }

    /// Wall time between two frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}
