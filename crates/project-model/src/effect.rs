//! Pixel effects and clip transitions.

use serde::{Deserialize, Serialize};

/// Upper bound of an effect's intensity.
pub const MAX_INTENSITY: f64 = 100.0;

/// Kind of per-pixel adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Brightness,
    Contrast,
    Saturation,
    Grayscale,
    Sepia,
    Invert,
    HueRotate,
    Blur,
    Sharpen,
    Vignette,
}

impl EffectKind {
    /// Every effect kind, in declaration order.
    pub const ALL: [EffectKind; 10] = [
        EffectKind::Brightness,
        EffectKind::Contrast,
        EffectKind::Saturation,
        EffectKind::Grayscale,
        EffectKind::Sepia,
        EffectKind::Invert,
        EffectKind::HueRotate,
        EffectKind::Blur,
        EffectKind::Sharpen,
        EffectKind::Vignette,
    ];

    /// Intensity a freshly added effect starts with.
    ///
    /// Brightness and saturation are neutral at 50; the rest are neutral at 0
    /// and start at full strength.
    pub fn default_intensity(&self) -> f64 {
        match self {
            EffectKind::Brightness | EffectKind::Saturation => 50.0,
            EffectKind::Contrast => 0.0,
            _ => MAX_INTENSITY,
        }
    }
}

/// One entry of a clip's effect stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,

    /// Strength in `[0, 100]`.
    pub intensity: f64,
}

impl Effect {
    /// Create an effect, clamping intensity into `[0, 100]`.
    pub fn new(kind: EffectKind, intensity: f64) -> Self {
        Self {
            kind,
            intensity: clamp_intensity(intensity),
        }
    }

    /// Create an effect at its default intensity.
    pub fn with_default(kind: EffectKind) -> Self {
        Self::new(kind, kind.default_intensity())
    }

    /// Intensity normalized to `[0, 1]`.
    pub fn factor(&self) -> f64 {
        clamp_intensity(self.intensity) / MAX_INTENSITY
    }
}

/// Clamp an intensity into the valid range, mapping NaN to zero.
pub fn clamp_intensity(intensity: f64) -> f64 {
    if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, MAX_INTENSITY)
    }
}

/// Blend applied at a clip's start and end boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_intensity_is_clamped() {
        assert_eq!(Effect::new(EffectKind::Blur, 250.0).intensity, 100.0);
        assert_eq!(Effect::new(EffectKind::Blur, -3.0).intensity, 0.0);
        assert_eq!(Effect::new(EffectKind::Blur, f64::NAN).intensity, 0.0);
    }

    #[test]
    fn test_effect_factor() {
        let effect = Effect::new(EffectKind::Invert, 25.0);
        assert!((effect.factor() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_effect_serializes_with_type_tag() {
        let json = serde_json::to_string(&Effect::new(EffectKind::HueRotate, 40.0)).unwrap();
        assert_eq!(json, r#"{"type":"hueRotate","intensity":40.0}"#);
    }

    #[test]
    fn test_transition_names() {
        let json = serde_json::to_string(&TransitionKind::WipeLeft).unwrap();
        assert_eq!(json, r#""wipeLeft""#);
    }
}
