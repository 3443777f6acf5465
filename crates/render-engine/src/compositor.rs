//! Frame compositor: layers every visible clip at one instant.
//!
//! Tracks are drawn in array order, so index 0 is the back-most layer. Each
//! active clip becomes a layer that goes through its effect stack, opacity,
//! and transition before being alpha-composited onto an opaque black base.

use cutline_common::TextDefaults;
use cutline_project_model::{Clip, ClipKind, Project};

use crate::effects::apply_effects;
use crate::error::{RenderError, SourceError};
use crate::frame::{Frame, PixelBuffer};
use crate::text::{text_state, GlyphRasterizer, RusttypeRasterizer, TextLayout};
use crate::transition::{apply_transition, transition_progress};

/// Supplies decoded visual samples for imported assets.
pub trait AssetSource: Send {
    /// The picture `media_time` seconds into `asset_id`. The returned frame
    /// may have any size; it is stretched to the output.
    fn frame_at(&self, asset_id: &str, media_time: f64) -> Result<Frame, SourceError>;
}

/// Anything that can fill a frame with the project's picture at a time.
pub trait FrameRenderer: Send {
    fn render_into(&mut self, project: &Project, time: f64, frame: &mut Frame)
        -> Result<(), RenderError>;
}

/// CPU compositor over an [`AssetSource`] and an optional text rasterizer.
pub struct Compositor {
    source: Box<dyn AssetSource>,
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("text", &self.rasterizer.is_some())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            rasterizer: None,
        }
    }

    /// A compositor drawing text with the configured font, if one loads.
    pub fn from_config(source: Box<dyn AssetSource>, text: &TextDefaults) -> Self {
        let compositor = Self::new(source);
        match RusttypeRasterizer::from_config(text) {
            Some(rasterizer) => compositor.with_rasterizer(Box::new(rasterizer)),
            None => compositor,
        }
    }

    /// Enable text clips. Without a rasterizer they are skipped.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Render a fresh `width x height` frame.
    pub fn render(
        &self,
        project: &Project,
        time: f64,
        width: u32,
        height: u32,
    ) -> Result<Frame, RenderError> {
        let mut frame = Frame::black(width, height);
        self.composite(project, time, &mut frame)?;
        Ok(frame)
    }

    fn composite(&self, project: &Project, time: f64, frame: &mut Frame) -> Result<(), RenderError> {
        frame.fill([0, 0, 0, 255]);

        for track in project.tracks.iter().filter(|t| !t.hidden) {
            for clip in track.active_clips_at(time) {
                let Some(mut layer) = self.clip_layer(clip, time, frame.width(), frame.height())?
                else {
                    continue;
                };

                apply_effects(&mut layer, &clip.effects);
                layer.multiply_alpha(clip.opacity);
                if let (Some(kind), Some(progress)) =
                    (clip.transition, transition_progress(clip, time))
                {
                    apply_transition(&mut layer, kind, progress);
                }
                frame.alpha_over(&layer);
            }
        }
        Ok(())
    }

    /// The unprocessed picture of one clip, or `None` if it contributes
    /// nothing at this instant.
    fn clip_layer(
        &self,
        clip: &Clip,
        time: f64,
        width: u32,
        height: u32,
    ) -> Result<Option<Frame>, RenderError> {
        match clip.kind {
            ClipKind::Audio => Ok(None),
            ClipKind::Video | ClipKind::Image => {
                let Some(asset_id) = clip.asset_id.as_deref() else {
                    return Ok(None);
                };
                match self.source.frame_at(asset_id, clip.media_time_at(time)) {
                    Ok(sample) => Ok(Some(sample.scaled(width, height))),
                    Err(e) => {
                        tracing::debug!(clip = %clip.id, error = %e, "Skipping clip without a sample");
                        Ok(None)
                    }
                }
            }
            ClipKind::Text => {
                let (Some(text), Some(rasterizer)) = (&clip.text_data, &self.rasterizer) else {
                    tracing::debug!(clip = %clip.id, "Skipping text clip with nothing to draw");
                    return Ok(None);
                };
                let state = text_state(text, time - clip.start_time);
                let layout = TextLayout::for_clip(text, &state, width, height);
                let mut layer = Frame::transparent(width, height);
                rasterizer.draw(&mut layer, &layout)?;
                Ok(Some(layer))
            }
        }
    }
}

impl FrameRenderer for Compositor {
    fn render_into(
        &mut self,
        project: &Project,
        time: f64,
        frame: &mut Frame,
    ) -> Result<(), RenderError> {
        self.composite(project, time, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_project_model::{
        ClipId, Effect, EffectKind, TextData, Track, TrackId, TrackKind, TransitionKind,
    };
    use std::collections::HashMap;

    /// Solid-colour assets keyed by id.
    struct SolidSource(HashMap<String, [u8; 4]>);

    impl AssetSource for SolidSource {
        fn frame_at(&self, asset_id: &str, _media_time: f64) -> Result<Frame, SourceError> {
            self.0
                .get(asset_id)
                .map(|rgba| Frame::filled(2, 2, *rgba))
                .ok_or_else(|| SourceError::Missing {
                    asset_id: asset_id.to_string(),
                })
        }
    }

    /// Paints the whole layer in the text colour.
    struct BlockRasterizer;

    impl GlyphRasterizer for BlockRasterizer {
        fn draw(&self, frame: &mut Frame, layout: &TextLayout<'_>) -> Result<(), RenderError> {
            let [r, g, b] = layout.color;
            let a = crate::frame::to_channel(layout.alpha * 255.0);
            frame.fill([r, g, b, a]);
            Ok(())
        }
    }

    fn compositor() -> Compositor {
        let mut assets = HashMap::new();
        assets.insert("red".to_string(), [255, 0, 0, 255]);
        assets.insert("blue".to_string(), [0, 0, 255, 255]);
        Compositor::new(Box::new(SolidSource(assets)))
    }

    fn media_clip(id: u64, asset: &str, start: f64, duration: f64) -> Clip {
        let mut clip = Clip::new(ClipId(id), ClipKind::Video, asset, start, duration);
        clip.asset_id = Some(asset.to_string());
        clip
    }

    fn two_layer_project() -> Project {
        let mut project = Project::new();
        let mut back = Track::new(TrackId(1), TrackKind::Video, "back");
        back.insert_sorted(media_clip(1, "red", 0.0, 4.0));
        let mut front = Track::new(TrackId(2), TrackKind::Video, "front");
        front.insert_sorted(media_clip(2, "blue", 1.0, 1.0));
        project.tracks = vec![back, front];
        project.clip_id_counter = 2;
        project
    }

    #[test]
    fn test_empty_project_is_black() {
        let frame = compositor().render(&Project::new(), 0.0, 4, 3).unwrap();
        assert_eq!(frame, Frame::black(4, 3));
    }

    #[test]
    fn test_later_tracks_draw_on_top() {
        let project = two_layer_project();
        let c = compositor();
        assert_eq!(c.render(&project, 0.5, 4, 4).unwrap().pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(c.render(&project, 1.5, 4, 4).unwrap().pixel(3, 3), [0, 0, 255, 255]);
        // End is exclusive.
        assert_eq!(c.render(&project, 2.0, 4, 4).unwrap().pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_hidden_track_is_skipped() {
        let mut project = two_layer_project();
        project.tracks[1].hidden = true;
        let frame = compositor().render(&project, 1.5, 2, 2).unwrap();
        assert_eq!(frame.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_asset_skips_only_that_clip() {
        let mut project = two_layer_project();
        project.tracks[1].clips[0].asset_id = Some("gone".to_string());
        let frame = compositor().render(&project, 1.5, 2, 2).unwrap();
        assert_eq!(frame.pixel(1, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn test_opacity_and_effects() {
        let mut project = two_layer_project();
        {
            let clip = &mut project.tracks[1].clips[0];
            clip.opacity = 0.5;
            clip.effects = vec![Effect::new(EffectKind::Invert, 100.0)];
        }
        let frame = compositor().render(&project, 1.5, 1, 1).unwrap();
        // Inverted blue is yellow, half over red.
        let px = frame.pixel(0, 0);
        assert_eq!(px[3], 255);
        assert_eq!(px[0], 255);
        assert_eq!(px[1], 128);
        assert_eq!(px[2], 0);
    }

    #[test]
    fn test_fade_transition_at_clip_start() {
        let mut project = two_layer_project();
        {
            let clip = &mut project.tracks[1].clips[0];
            clip.transition = Some(TransitionKind::Fade);
            clip.transition_duration = 0.5;
        }
        let c = compositor();
        assert_eq!(c.render(&project, 1.0, 1, 1).unwrap().pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(c.render(&project, 1.5, 1, 1).unwrap().pixel(0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn test_text_clip_uses_rasterizer() {
        let mut project = Project::new();
        let mut titles = Track::new(TrackId(1), TrackKind::Text, "titles");
        let mut clip = Clip::new(ClipId(1), ClipKind::Text, "title", 0.0, 2.0);
        clip.text_data = Some(TextData {
            color: "#00ff00".to_string(),
            ..TextData::new("Hi")
        });
        titles.insert_sorted(clip);
        project.tracks.push(titles);
        project.clip_id_counter = 1;

        let plain = compositor().render(&project, 1.0, 2, 2).unwrap();
        assert_eq!(plain, Frame::black(2, 2));

        let unconfigured = Compositor::from_config(
            Box::new(SolidSource(HashMap::new())),
            &TextDefaults::default(),
        );
        assert_eq!(unconfigured.render(&project, 1.0, 2, 2).unwrap(), Frame::black(2, 2));

        let with_text = compositor()
            .with_rasterizer(Box::new(BlockRasterizer))
            .render(&project, 1.0, 2, 2)
            .unwrap();
        assert_eq!(with_text.pixel(0, 0), [0, 255, 0, 255]);
    }
}
