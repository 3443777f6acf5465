//! Clip data model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, TransitionKind};
use crate::text::TextData;

/// Transition length given to new clips.
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;

/// Unique identifier for a clip within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip-{}", self.0)
    }
}

/// What a clip draws or plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Audio,
    Image,
    Text,
}

impl ClipKind {
    /// Whether the clip contributes pixels to the composited frame.
    pub fn is_visual(&self) -> bool {
        !matches!(self, ClipKind::Audio)
    }

    /// Whether the clip can carry an audio stream.
    pub fn is_audio_capable(&self) -> bool {
        matches!(self, ClipKind::Audio | ClipKind::Video)
    }
}

/// A time-bounded reference to a media or text source on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,

    #[serde(rename = "type")]
    pub kind: ClipKind,

    pub name: String,

    /// Imported asset this clip samples from. Text clips have none.
    #[serde(default)]
    pub asset_id: Option<String>,

    /// Timeline position of the first frame.
    pub start_time: f64,

    /// Length on the timeline.
    pub duration: f64,

    /// Offset into the asset's own timeline where sampling begins.
    #[serde(default)]
    pub trim_start: f64,

    #[serde(default = "one")]
    pub opacity: f64,

    #[serde(default = "one")]
    pub volume: f64,

    #[serde(default)]
    pub fade_in: f64,

    #[serde(default)]
    pub fade_out: f64,

    /// Applied in order; the list is not commutative.
    #[serde(default)]
    pub effects: Vec<Effect>,

    #[serde(default)]
    pub transition: Option<TransitionKind>,

    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,

    #[serde(default)]
    pub text_data: Option<TextData>,
}

fn one() -> f64 {
    1.0
}

fn default_transition_duration() -> f64 {
    DEFAULT_TRANSITION_DURATION
}

impl Clip {
    /// Create a clip with neutral properties.
    pub fn new(
        id: ClipId,
        kind: ClipKind,
        name: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            asset_id: None,
            start_time,
            duration,
            trim_start: 0.0,
            opacity: 1.0,
            volume: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            effects: Vec::new(),
            transition: None,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            text_data: None,
        }
    }

    /// Timeline position just past the last frame.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `time` falls inside `[start, start + duration)`.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time()
    }

    /// Position inside the asset that corresponds to timeline `time`.
    pub fn media_time_at(&self, time: f64) -> f64 {
        time - self.start_time + self.trim_start
    }

    /// Whether the clip's interval intersects `[start, start + duration)`.
    ///
    /// Intervals that only touch at an edge do not intersect.
    pub fn intersects(&self, start: f64, duration: f64) -> bool {
        intervals_intersect(self.start_time, self.duration, start, duration)
    }

    /// Whether the clip carries an audio stream that must be synchronized.
    pub fn has_audio(&self) -> bool {
        self.kind.is_audio_capable() && self.asset_id.is_some()
    }
}

/// Tolerance when comparing interval edges, absorbing float noise from
/// split and resize arithmetic.
pub const EDGE_EPSILON: f64 = 1e-9;

/// Half-open interval intersection with edge tolerance.
pub fn intervals_intersect(a_start: f64, a_duration: f64, b_start: f64, b_duration: f64) -> bool {
    let a_end = a_start + a_duration;
    let b_end = b_start + b_duration;
    a_start < b_end - EDGE_EPSILON && b_start < a_end - EDGE_EPSILON
}
