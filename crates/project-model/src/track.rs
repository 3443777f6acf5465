//! Track data model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId, ClipKind};

/// Unique identifier for a track within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Content type of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl TrackKind {
    /// Whether clips of `kind` may be placed on a track of this type.
    pub fn accepts(&self, kind: ClipKind) -> bool {
        matches!(
            (self, kind),
            (TrackKind::Video, ClipKind::Video)
                | (TrackKind::Video, ClipKind::Image)
                | (TrackKind::Audio, ClipKind::Audio)
                | (TrackKind::Text, ClipKind::Text)
        )
    }
}

/// A lane of non-overlapping clips.
///
/// Clips are kept sorted by `start_time`. Position in the project's track
/// list is the render z-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: TrackKind,

    /// Sorted by `start_time`.
    #[serde(default)]
    pub clips: Vec<Clip>,

    /// Silences and stops every clip on the track.
    #[serde(default)]
    pub muted: bool,

    /// Removes the track from the composited frame.
    #[serde(default)]
    pub hidden: bool,
}

impl Track {
    /// Create an empty, audible, visible track.
    pub fn new(id: TrackId, kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            clips: Vec::new(),
            muted: false,
            hidden: false,
        }
    }

    /// Look up a clip by id.
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Look up a clip by id, mutably.
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Index of a clip in the sorted list.
    pub fn clip_index(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Whether `[start, start + duration)` intersects any clip other than
    /// `exclude`.
    pub fn overlaps(&self, exclude: Option<ClipId>, start: f64, duration: f64) -> bool {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .any(|c| c.intersects(start, duration))
    }

    /// Insert a clip at its sorted position. Does not check for overlaps.
    pub fn insert_sorted(&mut self, clip: Clip) -> usize {
        let idx = self
            .clips
            .partition_point(|c| c.start_time <= clip.start_time);
        self.clips.insert(idx, clip);
        idx
    }

    /// Restore sort order after a clip's start time changed.
    pub fn sort_clips(&mut self) {
        self.clips
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    /// Remove a clip by id.
    pub fn remove_clip(&mut self, id: ClipId) -> Option<Clip> {
        let idx = self.clip_index(id)?;
        Some(self.clips.remove(idx))
    }

    /// Clips whose interval contains `time`.
    pub fn active_clips_at(&self, time: f64) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.is_active_at(time))
    }

    /// End of the last clip, or zero when empty.
    pub fn end_time(&self) -> f64 {
        self.clips
            .iter()
            .map(Clip::end_time)
            .fold(0.0, f64::max)
    }
}
