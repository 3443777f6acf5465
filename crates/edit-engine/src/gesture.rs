//! Pointer gesture state machine for dragging and resizing clips.
//!
//! The controller is independent of any input API: callers translate pointer
//! positions to timeline seconds and feed them to [`GestureController`].

use cutline_project_model::{ClipId, Project};

use crate::error::EditError;
use crate::geometry::{drag_clip, resize_clip, EditLimits, Edge};
use crate::snap::{snap_time, SnapContext};

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        clip_id: ClipId,
        /// Pointer time minus clip start at press.
        grab_offset: f64,
    },
    Resizing {
        clip_id: ClipId,
        edge: Edge,
        /// Pointer time at press.
        anchor_time: f64,
        origin_start: f64,
        origin_duration: f64,
    },
}

/// Drives one modal gesture at a time.
///
/// The project as it was at press is kept so the gesture can be cancelled,
/// and so the caller can record a single undo step on release.
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    state: GestureState,
    origin: Option<Project>,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// Press on a clip body.
    pub fn begin_drag(
        &mut self,
        project: &Project,
        clip_id: ClipId,
        pointer_time: f64,
    ) -> Result<(), EditError> {
        self.ensure_idle()?;
        let clip = project.clip(clip_id).ok_or(EditError::ClipNotFound(clip_id))?;
        self.state = GestureState::Dragging {
            clip_id,
            grab_offset: pointer_time - clip.start_time,
        };
        self.origin = Some(project.clone());
        tracing::debug!(clip = %clip_id, "Drag started");
        Ok(())
    }

    /// Press on a clip edge handle.
    pub fn begin_resize(
        &mut self,
        project: &Project,
        clip_id: ClipId,
        edge: Edge,
        pointer_time: f64,
    ) -> Result<(), EditError> {
        self.ensure_idle()?;
        let clip = project.clip(clip_id).ok_or(EditError::ClipNotFound(clip_id))?;
        self.state = GestureState::Resizing {
            clip_id,
            edge,
            anchor_time: pointer_time,
            origin_start: clip.start_time,
            origin_duration: clip.duration,
        };
        self.origin = Some(project.clone());
        tracing::debug!(clip = %clip_id, ?edge, "Resize started");
        Ok(())
    }

    /// Pointer moved. Returns whether the project geometry changed.
    ///
    /// A position that would overlap a neighbour leaves the clip where it
    /// was and returns `Ok(false)`.
    pub fn update(
        &mut self,
        project: &mut Project,
        pointer_time: f64,
        snap: &SnapContext,
        asset_duration: Option<f64>,
        limits: &EditLimits,
    ) -> Result<bool, EditError> {
        if !pointer_time.is_finite() {
            return Err(EditError::InvalidValue {
                what: "pointer time",
                value: pointer_time,
            });
        }
        let result = match self.state {
            GestureState::Idle => return Err(EditError::NoGesture),
            GestureState::Dragging {
                clip_id,
                grab_offset,
            } => {
                let before = geometry(project, clip_id)?;
                drag_clip(project, clip_id, pointer_time - grab_offset, snap)
                    .and_then(|_| geometry(project, clip_id).map(|after| after != before))
            }
            GestureState::Resizing {
                clip_id,
                edge,
                anchor_time,
                origin_start,
                origin_duration,
            } => {
                let before = geometry(project, clip_id)?;
                let (start, duration, _) = before;
                let moved = pointer_time - anchor_time;
                let delta = match edge {
                    Edge::Left => {
                        let target = snap_time(project, origin_start + moved, snap, Some(clip_id));
                        target - start
                    }
                    Edge::Right => {
                        let target = snap_time(
                            project,
                            origin_start + origin_duration + moved,
                            snap,
                            Some(clip_id),
                        );
                        target - (start + duration)
                    }
                };
                resize_clip(project, clip_id, edge, delta, asset_duration, limits)
                    .and_then(|_| geometry(project, clip_id).map(|after| after != before))
            }
        };

        match result {
            Ok(changed) => Ok(changed),
            Err(EditError::Overlap { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Release. Returns the pre-gesture project when the gesture changed
    /// anything, for the caller to record as one undo step.
    pub fn end(&mut self, project: &Project) -> Result<Option<Project>, EditError> {
        if !self.is_active() {
            return Err(EditError::NoGesture);
        }
        self.state = GestureState::Idle;
        let origin = self.origin.take();
        Ok(origin.filter(|before| before != project))
    }

    /// Abort the gesture and put the project back as it was at press.
    pub fn cancel(&mut self, project: &mut Project) -> Result<(), EditError> {
        if !self.is_active() {
            return Err(EditError::NoGesture);
        }
        self.state = GestureState::Idle;
        if let Some(origin) = self.origin.take() {
            *project = origin;
        }
        tracing::debug!("Gesture cancelled");
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.is_active() {
            Err(EditError::GestureActive)
        } else {
            Ok(())
        }
    }
}

fn geometry(project: &Project, clip_id: ClipId) -> Result<(f64, f64, f64), EditError> {
    let clip = project.clip(clip_id).ok_or(EditError::ClipNotFound(clip_id))?;
    Ok((clip.start_time, clip.duration, clip.trim_start))
}
