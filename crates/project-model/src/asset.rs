//! Imported media registry.
//!
//! Binary media is never embedded in the project file. Clips reference
//! assets by id, and the library is rebuilt by the host on reload; any ids it
//! cannot re-link are reported by [`AssetLibrary::missing_assets`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::project::Project;

/// Media type of an imported asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
}

/// Metadata of an imported asset, as reported by the host's decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub id: String,

    pub name: String,

    pub kind: AssetKind,

    /// Media length in seconds. Unknown for stills and unprobed streams.
    pub duration: Option<f64>,

    pub width: Option<u32>,

    pub height: Option<u32>,
}

impl AssetInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            duration: None,
            width: None,
            height: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Errors raised while importing an asset. The library is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("Asset id must not be empty")]
    EmptyId,

    #[error("Asset {id} is already imported")]
    Duplicate { id: String },

    #[error("Asset {id} could not be decoded: {reason}")]
    Undecodable { id: String, reason: String },
}

/// In-memory collection of imported assets keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    assets: BTreeMap<String, AssetInfo>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset after checking its metadata is usable.
    pub fn import(&mut self, info: AssetInfo) -> Result<&AssetInfo, AssetError> {
        if info.id.trim().is_empty() {
            return Err(AssetError::EmptyId);
        }
        if self.assets.contains_key(&info.id) {
            return Err(AssetError::Duplicate { id: info.id });
        }
        if let Some(duration) = info.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(AssetError::Undecodable {
                    id: info.id,
                    reason: format!("invalid duration {duration}"),
                });
            }
        }
        if matches!(info.width, Some(0)) || matches!(info.height, Some(0)) {
            return Err(AssetError::Undecodable {
                id: info.id,
                reason: "zero-sized frame".to_string(),
            });
        }

        tracing::debug!(id = %info.id, kind = ?info.kind, "Imported asset");
        let id = info.id.clone();
        Ok(self.assets.entry(id).or_insert(info))
    }

    /// Forget an asset. Clips referencing it are left alone.
    pub fn remove(&mut self, id: &str) -> Option<AssetInfo> {
        self.assets.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&AssetInfo> {
        self.assets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    /// Known media length of an asset.
    pub fn duration_of(&self, id: &str) -> Option<f64> {
        self.assets.get(id).and_then(|a| a.duration)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetInfo> {
        self.assets.values()
    }

    /// Asset ids referenced by clips in `project` that this library lacks.
    pub fn missing_assets(&self, project: &Project) -> Vec<String> {
        let mut missing: Vec<String> = project
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .filter_map(|c| c.asset_id.as_deref())
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Clip, ClipId, ClipKind};
    use crate::track::{Track, TrackId, TrackKind};

    #[test]
    fn test_import_and_lookup() {
        let mut library = AssetLibrary::new();
        library
            .import(AssetInfo::new("a1", "beach.mp4", AssetKind::Video).with_duration(12.0))
            .unwrap();
        assert_eq!(library.duration_of("a1"), Some(12.0));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_import_rejects_bad_metadata() {
        let mut library = AssetLibrary::new();
        let err = library
            .import(AssetInfo::new("a1", "broken.mp4", AssetKind::Video).with_duration(f64::NAN))
            .unwrap_err();
        assert!(matches!(err, AssetError::Undecodable { .. }));

        let err = library
            .import(AssetInfo::new("a2", "empty.png", AssetKind::Image).with_size(0, 10))
            .unwrap_err();
        assert!(matches!(err, AssetError::Undecodable { .. }));

        assert_eq!(
            library.import(AssetInfo::new(" ", "x", AssetKind::Audio)),
            Err(AssetError::EmptyId)
        );
        assert!(library.is_empty());
    }

    #[test]
    fn test_duplicate_import_keeps_original() {
        let mut library = AssetLibrary::new();
        library
            .import(AssetInfo::new("a1", "first", AssetKind::Audio).with_duration(3.0))
            .unwrap();
        let err = library
            .import(AssetInfo::new("a1", "second", AssetKind::Audio))
            .unwrap_err();
        assert!(matches!(err, AssetError::Duplicate { .. }));
        assert_eq!(library.get("a1").unwrap().name, "first");
    }

    #[test]
    fn test_missing_assets_are_deduplicated() {
        let mut project = Project::new();
        let mut track = Track::new(TrackId(1), TrackKind::Video, "V1");
        for (id, start) in [(1, 0.0), (2, 2.0)] {
            let mut clip = Clip::new(ClipId(id), ClipKind::Video, "c", start, 1.0);
            clip.asset_id = Some("gone".to_string());
            track.insert_sorted(clip);
        }
        project.tracks.push(track);

        let library = AssetLibrary::new();
        assert_eq!(library.missing_assets(&project), vec!["gone".to_string()]);
    }
}
