//! Styled text carried by text clips.

use serde::{Deserialize, Serialize};

/// Entrance animation for a text clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TextAnimation {
    #[default]
    None,
    FadeIn,
    SlideUp,
    SlideLeft,
    Scale,
    Typewriter,
}

/// Horizontal alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Content and style of a text clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextData {
    /// The text to draw. Each `\n` starts a new line below the previous one.
    pub content: String,

    /// Font size in output pixels.
    pub font_size: f64,

    /// Fill color as hex string (for example `#ffffff`).
    pub color: String,

    /// Anchor X, normalized to the frame width.
    pub x: f64,

    /// Anchor Y, normalized to the frame height. The block of lines is
    /// vertically centred on it.
    pub y: f64,

    pub align: TextAlign,

    pub animation: TextAnimation,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 48.0,
            color: "#ffffff".to_string(),
            x: 0.5,
            y: 0.5,
            align: TextAlign::Center,
            animation: TextAnimation::None,
        }
    }
}

impl TextData {
    /// Plain centered text with default styling.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Number of characters the typewriter animation reveals in total.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Parse `color` into RGB, falling back to white on malformed input.
    pub fn rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.color).unwrap_or([255, 255, 255])
    }
}

/// Parse `#rgb` or `#rrggbb` into RGB components.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits = hex.as_bytes();
    let nibble = |b: u8| (b as char).to_digit(16).map(|d| d as u8);
    match digits.len() {
        6 => {
            let mut out = [0u8; 3];
            for (channel, pair) in out.iter_mut().zip(digits.chunks_exact(2)) {
                *channel = nibble(pair[0])? * 16 + nibble(pair[1])?;
            }
            Some(out)
        }
        3 => {
            let mut out = [0u8; 3];
            for (channel, &d) in out.iter_mut().zip(digits) {
                *channel = nibble(d)? * 17;
            }
            Some(out)
        }
        _ => None,
    }
}
