//! Text clip animation and rasterization.

use std::path::Path;

use cutline_common::TextDefaults;
use cutline_project_model::{TextAlign, TextAnimation, TextData};
use rusttype::{point, Font, Scale};

use crate::error::RenderError;
use crate::frame::{to_channel, Frame, PixelBuffer};

/// Length of every text entrance animation in seconds.
pub const ANIMATION_WINDOW: f64 = 0.5;

/// Vertical travel of `slideUp` in pixels.
pub const SLIDE_UP_DISTANCE: f64 = 50.0;

/// Horizontal travel of `slideLeft` in pixels.
pub const SLIDE_LEFT_DISTANCE: f64 = 100.0;

/// Cubic ease-out on `[0, 1]`.
pub fn ease_out_cubic(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    1.0 - (1.0 - x).powi(3)
}

/// Presentation of a text clip at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextState {
    pub opacity: f64,
    /// Pixels, positive to the right.
    pub offset_x: f64,
    /// Pixels, positive downwards.
    pub offset_y: f64,
    pub scale: f64,
    pub visible_chars: usize,
}

/// Animation state `elapsed` seconds after the clip start.
///
/// Values hold at their terminal state once the window has passed.
pub fn text_state(text: &TextData, elapsed: f64) -> TextState {
    let total = text.char_count();
    let e = ease_out_cubic(elapsed.max(0.0) / ANIMATION_WINDOW);
    let mut state = TextState {
        opacity: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
        scale: 1.0,
        visible_chars: total,
    };
    match text.animation {
        TextAnimation::None => {}
        TextAnimation::FadeIn => state.opacity = e,
        TextAnimation::SlideUp => state.offset_y = (1.0 - e) * SLIDE_UP_DISTANCE,
        TextAnimation::SlideLeft => state.offset_x = (1.0 - e) * SLIDE_LEFT_DISTANCE,
        TextAnimation::Scale => state.scale = e,
        TextAnimation::Typewriter => {
            state.visible_chars = ((total as f64 * e).floor() as usize).min(total)
        }
    }
    state
}

/// A positioned run of text ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout<'a> {
    pub text: &'a str,
    /// Font size in pixels.
    pub size: f64,
    pub color: [u8; 3],
    pub alpha: f64,
    /// Anchor in frame pixels. `align` decides which part of each line sits
    /// on it horizontally, and the block of lines is vertically centred on it.
    pub x: f64,
    pub y: f64,
    pub align: TextAlign,
}

impl<'a> TextLayout<'a> {
    /// Lay out a text clip's content on a `width x height` frame.
    pub fn for_clip(text: &'a TextData, state: &TextState, width: u32, height: u32) -> Self {
        let end = text
            .content
            .char_indices()
            .nth(state.visible_chars)
            .map(|(i, _)| i)
            .unwrap_or(text.content.len());
        Self {
            text: &text.content[..end],
            size: text.font_size * state.scale,
            color: text.rgb(),
            alpha: state.opacity,
            x: text.x * width as f64 + state.offset_x,
            y: text.y * height as f64 + state.offset_y,
            align: text.align,
        }
    }
}

/// Draws text onto a frame.
pub trait GlyphRasterizer: Send {
    fn draw(&self, frame: &mut Frame, layout: &TextLayout<'_>) -> Result<(), RenderError>;
}

/// Rasterizer backed by a TrueType/OpenType font.
pub struct RusttypeRasterizer {
    font: Font<'static>,
}

impl std::fmt::Debug for RusttypeRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RusttypeRasterizer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl RusttypeRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RenderError> {
        let font = Font::try_from_vec(bytes).ok_or_else(|| RenderError::Font {
            message: "unsupported or corrupt font data".to_string(),
        })?;
        Ok(Self { font })
    }

    /// Load a font file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RenderError::FontIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let rasterizer = Self::from_bytes(bytes)?;
        tracing::debug!(path = %path.display(), "Loaded font");
        Ok(rasterizer)
    }

    /// The rasterizer for `TextDefaults::font_path`, or `None` when no font is
    /// configured or it cannot be loaded. Text clips are then skipped.
    pub fn from_config(text: &TextDefaults) -> Option<Self> {
        let path = text.font_path.as_ref()?;
        match Self::from_file(path) {
            Ok(rasterizer) => Some(rasterizer),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Text clips disabled");
                None
            }
        }
    }

    fn run_width(&self, text: &str, scale: Scale) -> f32 {
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }
}

impl GlyphRasterizer for RusttypeRasterizer {
    fn draw(&self, frame: &mut Frame, layout: &TextLayout<'_>) -> Result<(), RenderError> {
        if layout.text.is_empty() || layout.size <= 0.0 || layout.alpha <= 0.0 {
            return Ok(());
        }
        let scale = Scale::uniform(layout.size as f32);
        let v = self.font.v_metrics(scale);
        let line_height = (v.ascent - v.descent + v.line_gap) as f64;
        let lines: Vec<&str> = layout.text.split('\n').collect();
        let block_offset = (lines.len() - 1) as f64 * line_height / 2.0;
        let first_baseline = layout.y - block_offset + ((v.ascent + v.descent) / 2.0) as f64;

        let (fw, fh) = (frame.width() as i32, frame.height() as i32);
        let alpha = layout.alpha.clamp(0.0, 1.0);
        let [r, g, b] = layout.color;
        for (row, line) in lines.iter().enumerate() {
            let width = self.run_width(line, scale) as f64;
            let left = match layout.align {
                TextAlign::Left => layout.x,
                TextAlign::Center => layout.x - width / 2.0,
                TextAlign::Right => layout.x - width,
            };
            let baseline = first_baseline + row as f64 * line_height;

            for glyph in self
                .font
                .layout(line, scale, point(left as f32, baseline as f32))
            {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                glyph.draw(|gx, gy, coverage| {
                    let x = bb.min.x + gx as i32;
                    let y = bb.min.y + gy as i32;
                    if x < 0 || y < 0 || x >= fw || y >= fh {
                        return;
                    }
                    let a = to_channel(coverage as f64 * alpha * 255.0);
                    let existing = frame.pixel(x as u32, y as u32)[3];
                    if a > existing {
                        frame.set_pixel(x as u32, y as u32, [r, g, b, a]);
                    }
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animated(animation: TextAnimation) -> TextData {
        TextData {
            animation,
            ..TextData::new("Hello")
        }
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(0.5), 0.875);
        assert_eq!(ease_out_cubic(3.0), 1.0);
    }

    #[test]
    fn test_fade_in() {
        let text = animated(TextAnimation::FadeIn);
        assert_eq!(text_state(&text, 0.0).opacity, 0.0);
        assert_eq!(text_state(&text, 0.25).opacity, 0.875);
        assert_eq!(text_state(&text, 0.5).opacity, 1.0);
        assert_eq!(text_state(&text, 9.0).opacity, 1.0);
    }

    #[test]
    fn test_slides_start_offset() {
        let up = text_state(&animated(TextAnimation::SlideUp), 0.0);
        assert_eq!((up.offset_x, up.offset_y), (0.0, 50.0));
        let left = text_state(&animated(TextAnimation::SlideLeft), 0.0);
        assert_eq!((left.offset_x, left.offset_y), (100.0, 0.0));
        let done = text_state(&animated(TextAnimation::SlideLeft), 0.7);
        assert_eq!(done.offset_x, 0.0);
    }

    #[test]
    fn test_scale_grows_to_one() {
        let text = animated(TextAnimation::Scale);
        assert_eq!(text_state(&text, 0.0).scale, 0.0);
        assert_eq!(text_state(&text, 1.0).scale, 1.0);
    }

    #[test]
    fn test_typewriter_reveals_characters() {
        let text = animated(TextAnimation::Typewriter);
        assert_eq!(text_state(&text, 0.0).visible_chars, 0);
        // e(0.5) = 0.875, floor(5 * 0.875) = 4
        assert_eq!(text_state(&text, 0.25).visible_chars, 4);
        assert_eq!(text_state(&text, 0.5).visible_chars, 5);
    }

    #[test]
    fn test_static_text_is_terminal_immediately() {
        let state = text_state(&animated(TextAnimation::None), 0.0);
        assert_eq!(state.opacity, 1.0);
        assert_eq!(state.visible_chars, 5);
    }

    #[test]
    fn test_layout_positions_and_truncates() {
        let mut text = TextData::new("héllo");
        text.x = 0.25;
        text.y = 0.5;
        text.font_size = 40.0;
        let state = TextState {
            opacity: 0.5,
            offset_x: 10.0,
            offset_y: -5.0,
            scale: 0.5,
            visible_chars: 2,
        };
        let layout = TextLayout::for_clip(&text, &state, 200, 100);
        assert_eq!(layout.text, "hé");
        assert_eq!(layout.size, 20.0);
        assert_eq!((layout.x, layout.y), (60.0, 45.0));
        assert_eq!(layout.color, [255, 255, 255]);
    }

    const TEST_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/DejaVuSansMono.ttf");

    fn rasterizer() -> RusttypeRasterizer {
        RusttypeRasterizer::from_file(TEST_FONT).unwrap()
    }

    fn layout(text: &str, align: TextAlign) -> TextLayout<'_> {
        TextLayout {
            text,
            size: 20.0,
            color: [255, 0, 0],
            alpha: 1.0,
            x: 50.0,
            y: 25.0,
            align,
        }
    }

    /// Inclusive (min_x, max_x, min_y, max_y) of pixels with any alpha.
    fn ink_bounds(frame: &Frame) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.pixel(x, y)[3] == 0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, x, y, y),
                    Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
                });
            }
        }
        bounds
    }

    fn drawn(layout: &TextLayout<'_>) -> Frame {
        let mut frame = Frame::transparent(100, 50);
        rasterizer().draw(&mut frame, layout).unwrap();
        frame
    }

    #[test]
    fn test_draw_writes_text_colour() {
        let frame = drawn(&layout("Hi", TextAlign::Center));
        let (x0, x1, y0, y1) = ink_bounds(&frame).unwrap();
        // Centred on (50, 25).
        assert!(x0 < 50 && x1 > 50, "{x0}..{x1}");
        assert!(y0 < 25 && y1 > 25, "{y0}..{y1}");
        for px in frame.pixels().chunks_exact(4).filter(|px| px[3] > 0) {
            assert_eq!(&px[..3], &[255, 0, 0]);
        }
    }

    #[test]
    fn test_draw_alignment_moves_ink() {
        let (left_x0, _, _, _) = ink_bounds(&drawn(&layout("ab", TextAlign::Left))).unwrap();
        let (_, right_x1, _, _) = ink_bounds(&drawn(&layout("ab", TextAlign::Right))).unwrap();
        assert!(left_x0 >= 50, "left-aligned text starts at the anchor");
        assert!(right_x1 <= 50, "right-aligned text ends at the anchor");
    }

    #[test]
    fn test_draw_alpha_scales_coverage() {
        let mut faded = layout("H", TextAlign::Center);
        faded.alpha = 0.5;
        let frame = drawn(&faded);
        let max = frame.pixels().chunks_exact(4).map(|px| px[3]).max().unwrap();
        assert!((100..=128).contains(&max), "{max}");
    }

    #[test]
    fn test_draw_nothing_to_do() {
        let blank = Frame::transparent(100, 50);
        assert_eq!(drawn(&layout("", TextAlign::Left)), blank);
        let mut hidden = layout("Hi", TextAlign::Left);
        hidden.alpha = 0.0;
        assert_eq!(drawn(&hidden), blank);
        let mut zero = layout("Hi", TextAlign::Left);
        zero.size = 0.0;
        assert_eq!(drawn(&zero), blank);
    }

    #[test]
    fn test_draw_clips_at_frame_edges() {
        let mut off = layout("Wide text", TextAlign::Right);
        off.x = 5.0;
        off.y = -3.0;
        let frame = drawn(&off);
        assert_eq!(frame.width(), 100);

        let mut gone = layout("Hi", TextAlign::Left);
        gone.x = 500.0;
        assert_eq!(drawn(&gone), Frame::transparent(100, 50));
    }

    #[test]
    fn test_newline_stacks_lines_around_anchor() {
        let (_, _, one_y0, one_y1) = ink_bounds(&drawn(&layout("H", TextAlign::Center))).unwrap();
        let (_, _, two_y0, two_y1) = ink_bounds(&drawn(&layout("H\nH", TextAlign::Center))).unwrap();
        assert!(two_y1 - two_y0 > 2 * (one_y1 - one_y0), "{two_y0}..{two_y1}");
        // The block stays centred on the anchor.
        assert!(two_y0 < one_y0 && two_y1 > one_y1);
    }

    #[test]
    fn test_from_config() {
        assert!(RusttypeRasterizer::from_config(&TextDefaults::default()).is_none());
        let missing = TextDefaults {
            font_path: Some("/nonexistent/font.ttf".into()),
        };
        assert!(RusttypeRasterizer::from_config(&missing).is_none());
        let configured = TextDefaults {
            font_path: Some(TEST_FONT.into()),
        };
        assert!(RusttypeRasterizer::from_config(&configured).is_some());
    }

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        assert!(matches!(
            RusttypeRasterizer::from_bytes(vec![0, 1, 2, 3]),
            Err(RenderError::Font { .. })
        ));
    }
}
