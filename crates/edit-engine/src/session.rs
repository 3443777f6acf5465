//! The editing session: sole owner and mutator of an open project.

use std::path::{Path, PathBuf};

use cutline_common::EditorDefaults;
use cutline_project_model::{
    AssetInfo, AssetLibrary, ClipId, Effect, LoadedProject, Project, ProjectError, Track,
    TrackId, TrackKind,
};

use crate::error::EditError;
use crate::geometry::{self, ClipPatch, ClipSpec, EditLimits, Edge};
use crate::gesture::{GestureController, GestureState};
use crate::history::History;
use crate::snap::{SnapContext, SnapSettings};

/// An open project together with its assets, history, and view state.
///
/// Every successful edit that changes the project is preceded by one undo
/// snapshot. Rejected edits leave both the project and the history alone.
#[derive(Debug)]
pub struct EditSession {
    project: Project,
    assets: AssetLibrary,
    history: History<Project>,
    gesture: GestureController,
    playhead: f64,
    limits: EditLimits,
    snap: SnapSettings,
    path: Option<PathBuf>,
}

impl EditSession {
    /// Start a session on a new empty project.
    pub fn new(config: &EditorDefaults) -> Self {
        let mut project = Project::new();
        if config.default_zoom.is_finite() && config.default_zoom > 0.0 {
            project.zoom = config.default_zoom;
        }
        Self::with_project(project, config)
    }

    /// Start a session on an existing project.
    pub fn with_project(project: Project, config: &EditorDefaults) -> Self {
        Self {
            project,
            assets: AssetLibrary::new(),
            history: History::new(config.history_capacity),
            gesture: GestureController::new(),
            playhead: 0.0,
            limits: EditLimits::from_config(config),
            snap: SnapSettings::from_config(config),
            path: None,
        }
    }

    /// Load and validate a project file.
    pub fn open(path: impl AsRef<Path>, config: &EditorDefaults) -> Result<Self, ProjectError> {
        let loaded = LoadedProject::load(path)?;
        let mut session = Self::with_project(loaded.project, config);
        session.path = Some(loaded.path);
        Ok(session)
    }

    /// Write the project to the file it was opened from or last saved to.
    pub fn save(&self) -> Result<(), ProjectError> {
        let path = self.path.clone().ok_or_else(|| ProjectError::ValidationError {
            message: "project has no file path; use save_as".to_string(),
        })?;
        self.write(path)
    }

    /// Write the project to `path` and remember it for later saves.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref().to_path_buf();
        self.write(path.clone())?;
        self.path = Some(path);
        Ok(())
    }

    fn write(&self, path: PathBuf) -> Result<(), ProjectError> {
        LoadedProject {
            path,
            project: self.project.clone(),
        }
        .save()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn limits(&self) -> &EditLimits {
        &self.limits
    }

    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn set_playhead(&mut self, time: f64) {
        if time.is_finite() {
            self.playhead = time.max(0.0);
        }
    }

    /// Timeline zoom in pixels per second. View state, not an undo step.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), EditError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(EditError::InvalidValue { what: "zoom", value: zoom });
        }
        self.project.zoom = zoom;
        Ok(())
    }

    pub fn set_snap_settings(&mut self, settings: SnapSettings) {
        self.snap = settings;
    }

    /// Snap context for the current playhead and zoom.
    pub fn snap_context(&self) -> SnapContext {
        SnapContext {
            playhead: self.playhead,
            zoom: self.project.zoom,
            settings: self.snap,
        }
    }

    // Assets

    /// Register media metadata. Rejected imports leave the library unchanged.
    pub fn import_asset(&mut self, info: AssetInfo) -> Result<(), EditError> {
        self.assets.import(info)?;
        Ok(())
    }

    /// Asset ids referenced by the project that have not been imported.
    pub fn missing_assets(&self) -> Vec<String> {
        self.assets.missing_assets(&self.project)
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditError> {
        self.ensure_no_gesture()?;
        let zoom = self.project.zoom;
        let undone = self.history.undo(&mut self.project);
        self.project.zoom = zoom;
        if undone {
            tracing::debug!(remaining = self.history.undo_len(), "Undo");
        }
        Ok(undone)
    }

    /// Re-apply one undone edit. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditError> {
        self.ensure_no_gesture()?;
        let zoom = self.project.zoom;
        let redone = self.history.redo(&mut self.project);
        self.project.zoom = zoom;
        if redone {
            tracing::debug!(remaining = self.history.redo_len(), "Redo");
        }
        Ok(redone)
    }

    // Tracks

    pub fn add_track(&mut self, kind: TrackKind, name: impl Into<String>) -> Result<TrackId, EditError> {
        let name = name.into();
        self.commit(|project, _| Ok(geometry::add_track(project, kind, name)))
    }

    pub fn remove_track(&mut self, track_id: TrackId) -> Result<Track, EditError> {
        self.commit(|project, _| geometry::remove_track(project, track_id))
    }

    pub fn move_track(&mut self, track_id: TrackId, new_index: usize) -> Result<(), EditError> {
        self.commit(|project, _| geometry::move_track(project, track_id, new_index))
    }

    pub fn set_track_muted(&mut self, track_id: TrackId, muted: bool) -> Result<(), EditError> {
        self.commit(|project, _| geometry::set_track_muted(project, track_id, muted))
    }

    pub fn set_track_hidden(&mut self, track_id: TrackId, hidden: bool) -> Result<(), EditError> {
        self.commit(|project, _| geometry::set_track_hidden(project, track_id, hidden))
    }

    pub fn rename_track(&mut self, track_id: TrackId, name: impl Into<String>) -> Result<(), EditError> {
        let name = name.into();
        self.commit(|project, _| geometry::rename_track(project, track_id, name))
    }

    // Clips

    /// Place a clip. Media clips must reference an imported asset.
    pub fn add_clip(&mut self, track_id: TrackId, spec: ClipSpec) -> Result<ClipId, EditError> {
        let available = match spec.asset_id.as_deref() {
            Some(asset_id) if !self.assets.contains(asset_id) => {
                return Err(EditError::AssetNotFound(asset_id.to_string()));
            }
            Some(asset_id) => self.assets.duration_of(asset_id),
            None => None,
        };
        self.commit(|project, limits| geometry::add_clip(project, track_id, spec, available, limits))
    }

    pub fn delete_clip(&mut self, clip_id: ClipId) -> Result<(), EditError> {
        self.commit(|project, _| geometry::delete_clip(project, clip_id).map(|_| ()))
    }

    /// Drag a clip to a snapped start time in one step.
    pub fn drag_clip(&mut self, clip_id: ClipId, proposed_start: f64) -> Result<f64, EditError> {
        let snap = self.snap_context();
        self.commit(|project, _| geometry::drag_clip(project, clip_id, proposed_start, &snap))
    }

    pub fn resize_clip(&mut self, clip_id: ClipId, edge: Edge, delta: f64) -> Result<(), EditError> {
        let available = self.asset_duration_of(clip_id);
        self.commit(|project, limits| {
            geometry::resize_clip(project, clip_id, edge, delta, available, limits)
        })
    }

    pub fn split_clip(&mut self, clip_id: ClipId, at: f64) -> Result<ClipId, EditError> {
        self.commit(|project, limits| geometry::split_clip(project, clip_id, at, limits))
    }

    /// Split a clip at the current playhead.
    pub fn split_at_playhead(&mut self, clip_id: ClipId) -> Result<ClipId, EditError> {
        self.split_clip(clip_id, self.playhead)
    }

    pub fn duplicate_clip(&mut self, clip_id: ClipId) -> Result<ClipId, EditError> {
        self.commit(|project, limits| geometry::duplicate_clip(project, clip_id, limits))
    }

    pub fn update_clip(&mut self, clip_id: ClipId, patch: ClipPatch) -> Result<(), EditError> {
        let available = self.asset_duration_of(clip_id);
        self.commit(|project, limits| {
            geometry::update_clip(project, clip_id, patch, available, limits)
        })
    }

    pub fn add_effect(&mut self, clip_id: ClipId, effect: Effect) -> Result<(), EditError> {
        self.commit(|project, _| geometry::add_effect(project, clip_id, effect))
    }

    pub fn remove_effect(&mut self, clip_id: ClipId, index: usize) -> Result<Effect, EditError> {
        self.commit(|project, _| geometry::remove_effect(project, clip_id, index))
    }

    pub fn move_effect(&mut self, clip_id: ClipId, from: usize, to: usize) -> Result<(), EditError> {
        self.commit(|project, _| geometry::move_effect(project, clip_id, from, to))
    }

    // Gestures

    pub fn begin_drag(&mut self, clip_id: ClipId, pointer_time: f64) -> Result<(), EditError> {
        self.gesture.begin_drag(&self.project, clip_id, pointer_time)
    }

    pub fn begin_resize(&mut self, clip_id: ClipId, edge: Edge, pointer_time: f64) -> Result<(), EditError> {
        self.gesture.begin_resize(&self.project, clip_id, edge, pointer_time)
    }

    /// Feed a pointer position to the active gesture.
    pub fn update_gesture(&mut self, pointer_time: f64) -> Result<bool, EditError> {
        let snap = self.snap_context();
        let available = match self.gesture.state() {
            GestureState::Resizing { clip_id, .. } => self.asset_duration_of(clip_id),
            _ => None,
        };
        self.gesture
            .update(&mut self.project, pointer_time, &snap, available, &self.limits)
    }

    /// Release the active gesture. Returns whether an undo step was recorded.
    pub fn end_gesture(&mut self) -> Result<bool, EditError> {
        match self.gesture.end(&self.project)? {
            Some(before) => {
                self.history.record(before);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn cancel_gesture(&mut self) -> Result<(), EditError> {
        self.gesture.cancel(&mut self.project)
    }

    fn asset_duration_of(&self, clip_id: ClipId) -> Option<f64> {
        let asset_id = self.project.clip(clip_id)?.asset_id.as_deref()?;
        self.assets.duration_of(asset_id)
    }

    fn ensure_no_gesture(&self) -> Result<(), EditError> {
        if self.gesture.is_active() {
            Err(EditError::GestureActive)
        } else {
            Ok(())
        }
    }

    /// Run a geometry operation, recording the prior state if it changed
    /// anything. Geometry operations leave the project untouched on error.
    fn commit<R>(
        &mut self,
        op: impl FnOnce(&mut Project, &EditLimits) -> Result<R, EditError>,
    ) -> Result<R, EditError> {
        self.ensure_no_gesture()?;
        let before = self.project.clone();
        let out = op(&mut self.project, &self.limits)?;
        if self.project != before {
            self.history.record(before);
        }
        Ok(out)
    }
}
