//! Project document and persistence.
//!
//! A project is the top-level container holding every track, the timeline
//! zoom, and the id counter used to mint new clip ids. It round-trips through
//! JSON losslessly; media content lives outside it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId};
use crate::effect::MAX_INTENSITY;
use crate::track::{Track, TrackId};

/// Smallest clip length accepted in a saved project.
pub const MIN_CLIP_DURATION: f64 = 0.1;

/// Zoom given to new projects, in pixels per second.
pub const DEFAULT_ZOOM: f64 = 50.0;

/// Top-level project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Tracks in z-order: index 0 is drawn first (back-most).
    pub tracks: Vec<Track>,

    /// Timeline zoom in pixels per second.
    pub zoom: f64,

    /// Last clip id handed out.
    pub clip_id_counter: u64,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Create an empty project.
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            zoom: DEFAULT_ZOOM,
            clip_id_counter: 0,
        }
    }

    /// Mint a fresh clip id.
    pub fn next_clip_id(&mut self) -> ClipId {
        self.clip_id_counter += 1;
        ClipId(self.clip_id_counter)
    }

    /// Smallest track id not yet in use.
    pub fn next_track_id(&self) -> TrackId {
        TrackId(self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Locate a clip as `(track index, clip index)`.
    pub fn locate_clip(&self, id: ClipId) -> Option<(usize, usize)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(ti, t)| t.clip_index(id).map(|ci| (ti, ci)))
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        let (ti, ci) = self.locate_clip(id)?;
        Some(&self.tracks[ti].clips[ci])
    }

    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        let (ti, ci) = self.locate_clip(id)?;
        Some(&mut self.tracks[ti].clips[ci])
    }

    /// Track that holds a clip.
    pub fn track_of(&self, id: ClipId) -> Option<&Track> {
        let (ti, _) = self.locate_clip(id)?;
        Some(&self.tracks[ti])
    }

    /// End of the last clip on any track.
    pub fn duration(&self) -> f64 {
        self.tracks.iter().map(Track::end_time).fold(0.0, f64::max)
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON without validating invariants.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the structural invariants of a project.
    ///
    /// Returns one message per violation; an empty list means the project is
    /// safe to hand to the editor and renderer.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];
        let mut seen_tracks = std::collections::HashSet::new();
        let mut seen_clips = std::collections::HashSet::new();

        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            errors.push(format!("zoom must be positive, got {}", self.zoom));
        }

        for track in &self.tracks {
            if !seen_tracks.insert(track.id) {
                errors.push(format!("duplicate track id {}", track.id));
            }

            for clip in &track.clips {
                if !seen_clips.insert(clip.id) {
                    errors.push(format!("duplicate clip id {}", clip.id));
                }
                if clip.id.0 > self.clip_id_counter {
                    errors.push(format!(
                        "{} exceeds clipIdCounter {}",
                        clip.id, self.clip_id_counter
                    ));
                }
                if !track.kind.accepts(clip.kind) {
                    errors.push(format!(
                        "{} of type {:?} on {:?} track {}",
                        clip.id, clip.kind, track.kind, track.id
                    ));
                }
                errors.extend(validate_clip(clip));
            }

            for pair in track.clips.windows(2) {
                if pair[1].start_time < pair[0].start_time {
                    errors.push(format!("{} is not sorted by start time", track.id));
                }
            }
            for (i, a) in track.clips.iter().enumerate() {
                for b in &track.clips[i + 1..] {
                    if a.intersects(b.start_time, b.duration) {
                        errors.push(format!("{} overlaps {} on {}", a.id, b.id, track.id));
                    }
                }
            }
        }

        errors
    }
}

fn validate_clip(clip: &Clip) -> Vec<String> {
    let mut errors = vec![];
    let id = clip.id;
    let finite = [
        clip.start_time,
        clip.duration,
        clip.trim_start,
        clip.opacity,
        clip.volume,
        clip.fade_in,
        clip.fade_out,
        clip.transition_duration,
    ];
    if finite.iter().any(|v| !v.is_finite()) {
        errors.push(format!("{id} has a non-finite property"));
        return errors;
    }
    if clip.start_time < 0.0 {
        errors.push(format!("{id} starts before zero"));
    }
    if clip.duration < MIN_CLIP_DURATION - 1e-9 {
        errors.push(format!("{id} is shorter than {MIN_CLIP_DURATION}s"));
    }
    if clip.trim_start < 0.0 {
        errors.push(format!("{id} has negative trimStart"));
    }
    if !(0.0..=1.0).contains(&clip.opacity) {
        errors.push(format!("{id} opacity outside [0, 1]"));
    }
    if !(0.0..=1.0).contains(&clip.volume) {
        errors.push(format!("{id} volume outside [0, 1]"));
    }
    if clip.fade_in < 0.0 || clip.fade_out < 0.0 {
        errors.push(format!("{id} has a negative fade"));
    }
    if clip.transition_duration <= 0.0 {
        errors.push(format!("{id} transitionDuration must be positive"));
    }
    if clip
        .effects
        .iter()
        .any(|e| !(0.0..=MAX_INTENSITY).contains(&e.intensity))
    {
        errors.push(format!("{id} has an effect intensity outside [0, 100]"));
    }
    errors
}

/// A project bound to a file on disk.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path of the project file.
    pub path: PathBuf,

    pub project: Project,
}

impl LoadedProject {
    /// Load and validate a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref().to_path_buf();

        let json = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let project = Project::from_json(&json).map_err(|e| ProjectError::ParseError {
            path: path.clone(),
            source: e,
        })?;

        let errors = project.validate();
        if !errors.is_empty() {
            return Err(ProjectError::ValidationError {
                message: errors.join("; "),
            });
        }

        tracing::info!(path = %path.display(), tracks = project.tracks.len(), "Loaded project");
        Ok(Self { path, project })
    }

    /// Write the project back to its file.
    pub fn save(&self) -> Result<(), ProjectError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = self.project.to_json().map_err(|e| ProjectError::ParseError {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, json).map_err(|e| ProjectError::IoError {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::info!(path = %self.path.display(), "Saved project");
        Ok(())
    }

    /// Create a new empty project file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let loaded = Self {
            path: path.as_ref().to_path_buf(),
            project: Project::new(),
        };
        loaded.save()?;
        Ok(loaded)
    }
}

/// Errors that can occur when working with project files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipKind;
    use crate::effect::{Effect, EffectKind, TransitionKind};
    use crate::text::TextData;
    use crate::track::TrackKind;

    fn sample_project() -> Project {
        let mut project = Project::new();
        let mut video = Track::new(TrackId(1), TrackKind::Video, "Video 1");
        let id = project.next_clip_id();
        let mut clip = Clip::new(id, ClipKind::Video, "beach", 0.0, 5.0);
        clip.asset_id = Some("asset-1".to_string());
        clip.trim_start = 1.25;
        clip.effects = vec![
            Effect::new(EffectKind::Sepia, 60.0),
            Effect::new(EffectKind::Blur, 20.0),
        ];
        clip.transition = Some(TransitionKind::Dissolve);
        clip.transition_duration = 0.75;
        video.insert_sorted(clip);

        let mut titles = Track::new(TrackId(2), TrackKind::Text, "Titles");
        let id = project.next_clip_id();
        let mut title = Clip::new(id, ClipKind::Text, "title", 1.0, 2.0);
        title.text_data = Some(TextData::new("Hello"));
        titles.insert_sorted(title);

        project.tracks = vec![video, titles];
        project
    }

    #[test]
    fn test_json_roundtrip_is_lossless() {
        let project = sample_project();
        let json = project.to_json().unwrap();
        let parsed = Project::from_json(&json).unwrap();
        assert_eq!(parsed, project);
    }

    #[test]
    fn test_json_uses_persisted_field_names() {
        let value = serde_json::to_value(sample_project()).unwrap();
        assert_eq!(value["clipIdCounter"], 2);
        let clip = &value["tracks"][0]["clips"][0];
        assert_eq!(clip["type"], "video");
        assert_eq!(clip["assetId"], "asset-1");
        assert_eq!(clip["trimStart"], 1.25);
        assert_eq!(clip["effects"][0]["type"], "sepia");
        assert_eq!(clip["transition"], "dissolve");
        assert_eq!(value["tracks"][1]["type"], "text");
    }

    #[test]
    fn test_next_ids() {
        let mut project = sample_project();
        assert_eq!(project.next_clip_id(), ClipId(3));
        assert_eq!(project.next_track_id(), TrackId(3));
    }

    #[test]
    fn test_lookup_and_duration() {
        let project = sample_project();
        assert_eq!(project.locate_clip(ClipId(2)), Some((1, 0)));
        assert_eq!(project.track_of(ClipId(1)).unwrap().id, TrackId(1));
        assert_eq!(project.duration(), 5.0);
        assert_eq!(project.clip_count(), 2);
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample_project().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_overlap_and_bad_ranges() {
        let mut project = sample_project();
        let id = project.next_clip_id();
        let mut bad = Clip::new(id, ClipKind::Video, "overlap", 4.0, 0.05);
        bad.opacity = 1.5;
        project.tracks[0].insert_sorted(bad);

        let errors = project.validate();
        assert!(errors.iter().any(|e| e.contains("overlaps")));
        assert!(errors.iter().any(|e| e.contains("shorter")));
        assert!(errors.iter().any(|e| e.contains("opacity")));
    }

    #[test]
    fn test_validate_reports_type_mismatch() {
        let mut project = sample_project();
        let id = project.next_clip_id();
        project.tracks[1].insert_sorted(Clip::new(id, ClipKind::Audio, "a", 5.0, 1.0));
        assert!(project.validate().iter().any(|e| e.contains("track")));
    }

    #[test]
    fn test_loaded_project_create_save_and_load() {
        let dir = std::env::temp_dir().join("cutline_test_project");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("edit.cutline.json");

        let mut created = LoadedProject::create(&path).unwrap();
        created.project = sample_project();
        created.save().unwrap();

        let loaded = LoadedProject::load(&path).unwrap();
        assert_eq!(loaded.project, created.project);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_invalid_project() {
        let dir = std::env::temp_dir().join("cutline_test_invalid_project");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");

        let mut project = sample_project();
        project.tracks[0].clips[0].duration = 0.0;
        std::fs::write(&path, project.to_json().unwrap()).unwrap();

        let err = LoadedProject::load(&path).unwrap_err();
        assert!(matches!(err, ProjectError::ValidationError { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = std::env::temp_dir().join("cutline_test_parse_error");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garbage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = LoadedProject::load(&path).unwrap_err();
        assert!(matches!(err, ProjectError::ParseError { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
