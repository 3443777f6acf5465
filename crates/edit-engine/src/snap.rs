//! Snapping of proposed times to significant timeline positions.

use cutline_common::EditorDefaults;
use cutline_project_model::{ClipId, Project};

/// User-tunable snap behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    /// Snap distance in screen pixels.
    pub threshold_px: f64,
    /// Grid spacing in seconds. Zero disables the grid.
    pub grid_interval: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self::from_config(&EditorDefaults::default())
    }
}

impl SnapSettings {
    pub fn from_config(config: &EditorDefaults) -> Self {
        Self {
            threshold_px: config.snap_threshold_px,
            grid_interval: config.grid_interval_secs,
        }
    }
}

/// Everything snapping needs to know about the current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapContext {
    pub playhead: f64,
    /// Pixels per second.
    pub zoom: f64,
    pub settings: SnapSettings,
}

impl SnapContext {
    /// Pixel threshold converted to seconds at the current zoom.
    pub fn threshold_secs(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.settings.threshold_px / self.zoom
        } else {
            0.0
        }
    }
}

/// Where a snap candidate came from. Lower values win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapSource {
    ClipEdge,
    Playhead,
    Grid,
}

/// Snap `t` to the nearest clip edge, the playhead, or the nearest grid point.
///
/// Only candidates within [`SnapContext::threshold_secs`] are considered.
/// Equally near candidates are ordered by [`SnapSource`] and then by the
/// smaller time. Edges of `exclude` (the clip being dragged) are ignored.
///
/// The function is idempotent: a snapped result is itself a candidate at
/// distance zero.
pub fn snap_time(project: &Project, t: f64, ctx: &SnapContext, exclude: Option<ClipId>) -> f64 {
    snap_candidate(project, t, ctx, exclude)
        .map(|(time, _)| time)
        .unwrap_or(t)
}

/// Like [`snap_time`] but reports which candidate won.
pub fn snap_candidate(
    project: &Project,
    t: f64,
    ctx: &SnapContext,
    exclude: Option<ClipId>,
) -> Option<(f64, SnapSource)> {
    let threshold = ctx.threshold_secs();
    if !t.is_finite() || threshold <= 0.0 {
        return None;
    }

    let edges = project
        .tracks
        .iter()
        .flat_map(|track| track.clips.iter())
        .filter(|clip| Some(clip.id) != exclude)
        .flat_map(|clip| {
            [
                (clip.start_time, SnapSource::ClipEdge),
                (clip.end_time(), SnapSource::ClipEdge),
            ]
        });

    let grid = (ctx.settings.grid_interval > 0.0).then(|| {
        let g = ctx.settings.grid_interval;
        ((t / g).round() * g, SnapSource::Grid)
    });

    let mut best: Option<(f64, SnapSource, f64)> = None;
    for (time, source) in edges
        .chain(std::iter::once((ctx.playhead, SnapSource::Playhead)))
        .chain(grid)
    {
        let distance = (time - t).abs();
        if !distance.is_finite() || distance > threshold {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_distance, best_source, best_time)) => distance
                .total_cmp(&best_distance)
                .then(source.cmp(&best_source))
                .then(time.total_cmp(&best_time))
                .is_lt(),
        };
        if better {
            best = Some((distance, source, time));
        }
    }

    best.map(|(_, source, time)| (time, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_project_model::{Clip, ClipKind, Track, TrackId, TrackKind};

    fn project_with(clips: &[(u64, f64, f64)]) -> Project {
        let mut project = Project::new();
        let mut track = Track::new(TrackId(1), TrackKind::Video, "V1");
        for &(id, start, duration) in clips {
            track.insert_sorted(Clip::new(ClipId(id), ClipKind::Video, "c", start, duration));
        }
        project.tracks.push(track);
        project.clip_id_counter = clips.len() as u64;
        project
    }

    fn ctx(playhead: f64, zoom: f64) -> SnapContext {
        SnapContext {
            playhead,
            zoom,
            settings: SnapSettings {
                threshold_px: 5.0,
                grid_interval: 0.5,
            },
        }
    }

    #[test]
    fn test_threshold_scales_with_zoom() {
        assert!((ctx(0.0, 50.0).threshold_secs() - 0.1).abs() < 1e-12);
        assert!((ctx(0.0, 500.0).threshold_secs() - 0.01).abs() < 1e-12);
        assert_eq!(ctx(0.0, 0.0).threshold_secs(), 0.0);
    }

    #[test]
    fn test_snaps_to_clip_end() {
        let project = project_with(&[(1, 0.0, 3.27)]);
        let snapped = snap_time(&project, 3.3, &ctx(10.0, 50.0), None);
        assert_eq!(snapped, 3.27);
    }

    #[test]
    fn test_snaps_to_grid_when_no_edge_near() {
        let project = project_with(&[]);
        let snapped = snap_time(&project, 1.46, &ctx(10.0, 50.0), None);
        assert_eq!(snapped, 1.5);
    }

    #[test]
    fn test_leaves_time_alone_outside_threshold() {
        let project = project_with(&[]);
        assert_eq!(snap_time(&project, 1.3, &ctx(10.0, 50.0), None), 1.3);
    }

    #[test]
    fn test_excluded_clip_edges_are_ignored() {
        let project = project_with(&[(1, 2.23, 1.0)]);
        let c = ctx(10.0, 50.0);
        assert_eq!(snap_time(&project, 2.25, &c, None), 2.23);
        assert_eq!(snap_time(&project, 2.25, &c, Some(ClipId(1))), 2.25);
    }

    #[test]
    fn test_tie_prefers_clip_edge_over_playhead() {
        let project = project_with(&[(1, 0.0, 2.0)]);
        // At 20 px/s the threshold is 0.25s; edge 2.0 and playhead 2.5 are
        // both exactly 0.25 away from 2.25.
        let mut c = ctx(2.5, 20.0);
        c.settings.grid_interval = 0.0;
        let (time, source) = snap_candidate(&project, 2.25, &c, None).unwrap();
        assert_eq!(source, SnapSource::ClipEdge);
        assert_eq!(time, 2.0);
    }

    #[test]
    fn test_tie_between_edges_prefers_earlier_time() {
        let project = project_with(&[(1, 0.0, 1.0), (2, 1.5, 1.0)]);
        let mut c = ctx(50.0, 20.0);
        c.settings.grid_interval = 0.0;
        assert_eq!(snap_time(&project, 1.25, &c, None), 1.0);
    }

    #[test]
    fn test_snap_is_idempotent_on_examples() {
        let project = project_with(&[(1, 0.0, 3.27), (2, 4.11, 2.0)]);
        let c = ctx(7.3, 50.0);
        for t in [0.04, 1.46, 3.3, 4.0, 4.2, 6.05, 7.25, 9.99] {
            let once = snap_time(&project, t, &c, None);
            assert_eq!(snap_time(&project, once, &c, None), once, "t = {t}");
        }
    }
}
