//! Invariant-preserving timeline mutations.
//!
//! Every function here validates first and mutates last: on `Err` the
//! project is exactly as it was. Callers that keep undo history snapshot the
//! project before calling.

use cutline_common::EditorDefaults;
use cutline_project_model::{
    clamp_intensity, Clip, ClipId, ClipKind, Effect, Project, TextData, Track, TrackId,
    TrackKind, TransitionKind, EDGE_EPSILON,
};

use crate::error::EditError;
use crate::snap::{snap_time, SnapContext};

/// Tolerances applied by geometry edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditLimits {
    /// Shortest clip that may be committed.
    pub min_duration: f64,
    /// Splits at or within this distance of a clip edge are rejected.
    pub split_guard: f64,
    /// Gap between a clip and its duplicate.
    pub duplicate_gap: f64,
}

impl Default for EditLimits {
    fn default() -> Self {
        Self::from_config(&EditorDefaults::default())
    }
}

impl EditLimits {
    pub fn from_config(config: &EditorDefaults) -> Self {
        Self {
            min_duration: config.min_clip_duration_secs,
            split_guard: config.split_guard_secs,
            duplicate_gap: config.duplicate_gap_secs,
        }
    }
}

/// Which edge of a clip a resize moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Moves `start_time` and `trim_start` together, keeping the end fixed.
    Left,
    /// Moves the end, changing only `duration`.
    Right,
}

/// Description of a clip to place on a track.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    pub kind: ClipKind,
    pub name: String,
    pub asset_id: Option<String>,
    pub start_time: f64,
    pub duration: f64,
    pub trim_start: f64,
    pub text_data: Option<TextData>,
}

impl ClipSpec {
    /// A clip sampling an imported asset.
    pub fn media(
        kind: ClipKind,
        name: impl Into<String>,
        asset_id: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            asset_id: Some(asset_id.into()),
            start_time,
            duration,
            trim_start: 0.0,
            text_data: None,
        }
    }

    /// A text clip.
    pub fn text(name: impl Into<String>, text: TextData, start_time: f64, duration: f64) -> Self {
        Self {
            kind: ClipKind::Text,
            name: name.into(),
            asset_id: None,
            start_time,
            duration,
            trim_start: 0.0,
            text_data: Some(text),
        }
    }

    pub fn with_trim(mut self, trim_start: f64) -> Self {
        self.trim_start = trim_start;
        self
    }
}

/// Property edits applied by [`update_clip`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPatch {
    pub name: Option<String>,
    pub opacity: Option<f64>,
    pub volume: Option<f64>,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
    pub duration: Option<f64>,
    pub effects: Option<Vec<Effect>>,
    pub transition: Option<Option<TransitionKind>>,
    pub transition_duration: Option<f64>,
    pub text_data: Option<TextData>,
}

impl ClipPatch {
    pub fn opacity(mut self, value: f64) -> Self {
        self.opacity = Some(value);
        self
    }

    pub fn volume(mut self, value: f64) -> Self {
        self.volume = Some(value);
        self
    }

    pub fn fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = Some(fade_in);
        self.fade_out = Some(fade_out);
        self
    }

    pub fn duration(mut self, value: f64) -> Self {
        self.duration = Some(value);
        self
    }

    pub fn transition(mut self, kind: Option<TransitionKind>, duration: f64) -> Self {
        self.transition = Some(kind);
        self.transition_duration = Some(duration);
        self
    }
}

/// Whether `[start, start + duration)` intersects any clip on `track` other
/// than `exclude`.
pub fn overlaps(track: &Track, exclude: Option<ClipId>, start: f64, duration: f64) -> bool {
    track.overlaps(exclude, start, duration)
}

/// Append a new empty track. It becomes the front-most layer.
pub fn add_track(project: &mut Project, kind: TrackKind, name: impl Into<String>) -> TrackId {
    let id = project.next_track_id();
    project.tracks.push(Track::new(id, kind, name));
    tracing::debug!(track = %id, ?kind, "Added track");
    id
}

/// Remove a track together with all of its clips.
pub fn remove_track(project: &mut Project, track_id: TrackId) -> Result<Track, EditError> {
    let idx = project
        .track_index(track_id)
        .ok_or(EditError::TrackNotFound(track_id))?;
    let track = project.tracks.remove(idx);
    tracing::debug!(track = %track_id, clips = track.clips.len(), "Removed track");
    Ok(track)
}

/// Move a track to `new_index` in the z-order, clamped to the list bounds.
pub fn move_track(project: &mut Project, track_id: TrackId, new_index: usize) -> Result<(), EditError> {
    let idx = project
        .track_index(track_id)
        .ok_or(EditError::TrackNotFound(track_id))?;
    let track = project.tracks.remove(idx);
    let new_index = new_index.min(project.tracks.len());
    project.tracks.insert(new_index, track);
    Ok(())
}

pub fn set_track_muted(project: &mut Project, track_id: TrackId, muted: bool) -> Result<(), EditError> {
    track_mut(project, track_id)?.muted = muted;
    Ok(())
}

pub fn set_track_hidden(project: &mut Project, track_id: TrackId, hidden: bool) -> Result<(), EditError> {
    track_mut(project, track_id)?.hidden = hidden;
    Ok(())
}

pub fn rename_track(
    project: &mut Project,
    track_id: TrackId,
    name: impl Into<String>,
) -> Result<(), EditError> {
    track_mut(project, track_id)?.name = name.into();
    Ok(())
}

/// Place a new clip on a track.
///
/// `asset_duration` is the known length of the referenced asset, if any.
pub fn add_clip(
    project: &mut Project,
    track_id: TrackId,
    spec: ClipSpec,
    asset_duration: Option<f64>,
    limits: &EditLimits,
) -> Result<ClipId, EditError> {
    let track = project
        .track(track_id)
        .ok_or(EditError::TrackNotFound(track_id))?;

    if !track.kind.accepts(spec.kind) {
        return Err(EditError::TrackTypeMismatch {
            clip_kind: spec.kind,
            track_kind: track.kind,
        });
    }
    check_time("start time", spec.start_time)?;
    check_time("trim start", spec.trim_start)?;
    check_duration(spec.duration, limits)?;
    check_asset_bound(spec.trim_start, spec.duration, asset_duration)?;
    check_overlap(track, None, spec.start_time, spec.duration)?;

    let id = project.next_clip_id();
    let mut clip = Clip::new(id, spec.kind, spec.name, spec.start_time, spec.duration);
    clip.asset_id = spec.asset_id;
    clip.trim_start = spec.trim_start;
    clip.text_data = spec.text_data;

    tracing::debug!(clip = %id, track = %track_id, start = clip.start_time, "Added clip");
    track_mut(project, track_id)?.insert_sorted(clip);
    Ok(id)
}

/// Remove a clip from whichever track holds it.
pub fn delete_clip(project: &mut Project, clip_id: ClipId) -> Result<Clip, EditError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    Ok(project.tracks[ti].clips.remove(ci))
}

/// Move a clip to a snapped version of `proposed_start`.
///
/// The clip's own edges do not attract it. Returns the committed start time.
pub fn drag_clip(
    project: &mut Project,
    clip_id: ClipId,
    proposed_start: f64,
    snap: &SnapContext,
) -> Result<f64, EditError> {
    if !proposed_start.is_finite() {
        return Err(EditError::InvalidValue {
            what: "start time",
            value: proposed_start,
        });
    }
    let start = snap_time(project, proposed_start, snap, Some(clip_id)).max(0.0);
    move_clip(project, clip_id, start)?;
    Ok(start)
}

/// Move a clip to an exact start time, without snapping.
pub fn move_clip(project: &mut Project, clip_id: ClipId, start: f64) -> Result<(), EditError> {
    check_time("start time", start)?;
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let track = &mut project.tracks[ti];
    let duration = track.clips[ci].duration;
    check_overlap(track, Some(clip_id), start, duration)?;

    track.clips[ci].start_time = start;
    track.sort_clips();
    Ok(())
}

/// Move one edge of a clip by `delta` seconds.
///
/// Requests past a bound (zero start, zero trim, the minimum duration, or the
/// end of a known asset) are clamped to that bound. A result that would
/// overlap a neighbour cancels the resize.
pub fn resize_clip(
    project: &mut Project,
    clip_id: ClipId,
    edge: Edge,
    delta: f64,
    asset_duration: Option<f64>,
    limits: &EditLimits,
) -> Result<(), EditError> {
    if !delta.is_finite() {
        return Err(EditError::InvalidValue {
            what: "resize delta",
            value: delta,
        });
    }
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let track = &mut project.tracks[ti];
    let clip = &track.clips[ci];

    let (start, duration, trim) = match edge {
        Edge::Right => {
            let mut duration = clip.duration + delta;
            if let Some(available) = asset_duration {
                duration = duration.min(available - clip.trim_start);
            }
            (clip.start_time, duration.max(limits.min_duration), clip.trim_start)
        }
        Edge::Left => {
            let end = clip.end_time();
            let delta = delta
                .max(-clip.trim_start)
                .max(-clip.start_time)
                .min(clip.duration - limits.min_duration);
            let start = clip.start_time + delta;
            (start, end - start, clip.trim_start + delta)
        }
    };

    check_overlap(track, Some(clip_id), start, duration)?;

    let clip = &mut track.clips[ci];
    clip.start_time = start;
    clip.duration = duration;
    clip.trim_start = trim;
    track.sort_clips();
    Ok(())
}

/// Cut a clip in two at timeline position `at`. Returns the id of the new
/// right-hand clip.
///
/// The left part keeps the original id and fade-in; the right part gets a new
/// id, the fade-out, a trim advanced by the split offset, and its own copies
/// of effects, transition, and text. Both parts must meet the minimum
/// duration.
pub fn split_clip(
    project: &mut Project,
    clip_id: ClipId,
    at: f64,
    limits: &EditLimits,
) -> Result<ClipId, EditError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let original = &project.tracks[ti].clips[ci];

    let offset = at - original.start_time;
    let remainder = original.end_time() - at;
    if !at.is_finite() || offset <= limits.split_guard || remainder <= limits.split_guard {
        return Err(EditError::SplitTooCloseToEdge {
            clip_id,
            at,
            guard: limits.split_guard,
        });
    }
    check_duration(offset.min(remainder), limits)?;

    let mut right = original.clone();
    right.start_time = at;
    right.duration = remainder;
    right.trim_start += offset;
    right.fade_in = 0.0;
    right.id = project.next_clip_id();
    let right_id = right.id;

    let track = &mut project.tracks[ti];
    let left = &mut track.clips[ci];
    left.duration = offset;
    left.fade_out = 0.0;
    track.clips.insert(ci + 1, right);

    tracing::debug!(clip = %clip_id, new_clip = %right_id, at, "Split clip");
    Ok(right_id)
}

/// Copy a clip to `end + duplicate_gap` on the same track. Returns the copy's
/// id.
pub fn duplicate_clip(
    project: &mut Project,
    clip_id: ClipId,
    limits: &EditLimits,
) -> Result<ClipId, EditError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let track = &project.tracks[ti];
    let original = &track.clips[ci];

    let start = original.end_time() + limits.duplicate_gap;
    check_overlap(track, None, start, original.duration)?;

    let mut copy = original.clone();
    copy.id = project.next_clip_id();
    copy.start_time = start;
    let copy_id = copy.id;
    project.tracks[ti].insert_sorted(copy);

    tracing::debug!(clip = %clip_id, copy = %copy_id, "Duplicated clip");
    Ok(copy_id)
}

/// Apply direct property edits to a clip.
///
/// Opacity and volume are clamped to `[0, 1]`, fades to `>= 0`, effect
/// intensities to `[0, 100]`. A duration edit is validated like a resize of
/// the right edge, but is rejected rather than clamped.
pub fn update_clip(
    project: &mut Project,
    clip_id: ClipId,
    patch: ClipPatch,
    asset_duration: Option<f64>,
    limits: &EditLimits,
) -> Result<(), EditError> {
    let (ti, ci) = project
        .locate_clip(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let track = &project.tracks[ti];
    let clip = &track.clips[ci];

    if let Some(duration) = patch.duration {
        check_duration(duration, limits)?;
        check_asset_bound(clip.trim_start, duration, asset_duration)?;
        check_overlap(track, Some(clip_id), clip.start_time, duration)?;
    }
    if let Some(td) = patch.transition_duration {
        if !td.is_finite() || td <= 0.0 {
            return Err(EditError::InvalidValue {
                what: "transition duration",
                value: td,
            });
        }
    }
    for value in [patch.opacity, patch.volume, patch.fade_in, patch.fade_out]
        .into_iter()
        .flatten()
    {
        if value.is_nan() {
            return Err(EditError::InvalidValue {
                what: "clip property",
                value,
            });
        }
    }

    let clip = &mut project.tracks[ti].clips[ci];
    if let Some(name) = patch.name {
        clip.name = name;
    }
    if let Some(opacity) = patch.opacity {
        clip.opacity = opacity.clamp(0.0, 1.0);
    }
    if let Some(volume) = patch.volume {
        clip.volume = volume.clamp(0.0, 1.0);
    }
    if let Some(fade_in) = patch.fade_in {
        clip.fade_in = fade_in.max(0.0);
    }
    if let Some(fade_out) = patch.fade_out {
        clip.fade_out = fade_out.max(0.0);
    }
    if let Some(duration) = patch.duration {
        clip.duration = duration;
    }
    if let Some(effects) = patch.effects {
        clip.effects = effects
            .into_iter()
            .map(|e| Effect::new(e.kind, e.intensity))
            .collect();
    }
    if let Some(transition) = patch.transition {
        clip.transition = transition;
    }
    if let Some(td) = patch.transition_duration {
        clip.transition_duration = td;
    }
    if let Some(text) = patch.text_data {
        clip.text_data = Some(text);
    }
    Ok(())
}

/// Append an effect to the end of a clip's stack.
pub fn add_effect(project: &mut Project, clip_id: ClipId, effect: Effect) -> Result<(), EditError> {
    let clip = project
        .clip_mut(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    clip.effects
        .push(Effect::new(effect.kind, clamp_intensity(effect.intensity)));
    Ok(())
}

/// Remove the effect at `index`.
pub fn remove_effect(project: &mut Project, clip_id: ClipId, index: usize) -> Result<Effect, EditError> {
    let clip = project
        .clip_mut(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    if index >= clip.effects.len() {
        return Err(EditError::EffectIndex { index });
    }
    Ok(clip.effects.remove(index))
}

/// Move the effect at `from` so it ends up at `to`.
pub fn move_effect(
    project: &mut Project,
    clip_id: ClipId,
    from: usize,
    to: usize,
) -> Result<(), EditError> {
    let clip = project
        .clip_mut(clip_id)
        .ok_or(EditError::ClipNotFound(clip_id))?;
    let len = clip.effects.len();
    if from >= len {
        return Err(EditError::EffectIndex { index: from });
    }
    if to >= len {
        return Err(EditError::EffectIndex { index: to });
    }
    let effect = clip.effects.remove(from);
    clip.effects.insert(to, effect);
    Ok(())
}

fn track_mut(project: &mut Project, track_id: TrackId) -> Result<&mut Track, EditError> {
    project
        .track_mut(track_id)
        .ok_or(EditError::TrackNotFound(track_id))
}

fn check_time(what: &'static str, value: f64) -> Result<(), EditError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EditError::InvalidValue { what, value })
    }
}

fn check_duration(duration: f64, limits: &EditLimits) -> Result<(), EditError> {
    if duration.is_finite() && duration >= limits.min_duration - EDGE_EPSILON {
        Ok(())
    } else {
        Err(EditError::BelowMinimumDuration {
            duration,
            min: limits.min_duration,
        })
    }
}

fn check_asset_bound(trim_start: f64, duration: f64, asset_duration: Option<f64>) -> Result<(), EditError> {
    match asset_duration {
        Some(available) if trim_start + duration > available + EDGE_EPSILON => {
            Err(EditError::ExceedsAsset {
                available: (available - trim_start).max(0.0),
            })
        }
        _ => Ok(()),
    }
}

fn check_overlap(
    track: &Track,
    exclude: Option<ClipId>,
    start: f64,
    duration: f64,
) -> Result<(), EditError> {
    if overlaps(track, exclude, start, duration) {
        Err(EditError::Overlap {
            track_id: track.id,
            start,
            end: start + duration,
        })
    } else {
        Ok(())
    }
}
