//! Validation errors raised by timeline edits.

use cutline_common::CutlineError;
use cutline_project_model::{AssetError, ClipId, ClipKind, TrackId, TrackKind};

/// A rejected edit. The project is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Track {0} not found")]
    TrackNotFound(TrackId),

    #[error("Clip {0} not found")]
    ClipNotFound(ClipId),

    #[error("Asset {0} has not been imported")]
    AssetNotFound(String),

    #[error("Interval [{start}, {end}) overlaps another clip on {track_id}")]
    Overlap {
        track_id: TrackId,
        start: f64,
        end: f64,
    },

    #[error("Split at {at}s is within {guard}s of an edge of {clip_id}")]
    SplitTooCloseToEdge { clip_id: ClipId, at: f64, guard: f64 },

    #[error("Duration {duration}s is below the {min}s minimum")]
    BelowMinimumDuration { duration: f64, min: f64 },

    #[error("Clip would read past the end of its asset ({available}s available)")]
    ExceedsAsset { available: f64 },

    #[error("{clip_kind:?} clips cannot be placed on a {track_kind:?} track")]
    TrackTypeMismatch {
        clip_kind: ClipKind,
        track_kind: TrackKind,
    },

    #[error("Invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },

    #[error("Effect index {index} out of range")]
    EffectIndex { index: usize },

    #[error("Another gesture is already active")]
    GestureActive,

    #[error("No gesture is active")]
    NoGesture,

    #[error(transparent)]
    Import(#[from] AssetError),
}

impl From<EditError> for CutlineError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Import(e) => CutlineError::import(e.to_string()),
            other => CutlineError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_errors_map_to_validation() {
        let err: CutlineError = EditError::ClipNotFound(ClipId(7)).into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("clip-7"));
    }

    #[test]
    fn test_import_errors_map_to_import() {
        let err: CutlineError = EditError::Import(AssetError::EmptyId).into();
        assert!(matches!(err, CutlineError::Import { .. }));
    }
}
