//! Per-pixel effect transforms.
//!
//! Each effect reads its intensity as `f = intensity / 100` and rewrites the
//! colour channels of a [`PixelBuffer`] in place. Alpha is never touched.
//! Results are rounded and clamped to `[0, 255]` after every effect, so an
//! effect list is applied strictly in order and is not commutative.

use cutline_project_model::{Effect, EffectKind};

use crate::frame::{to_channel, PixelBuffer, CHANNELS};

/// Largest box blur radius in pixels.
pub const MAX_BLUR_RADIUS: usize = 20;

/// A pure in-place transform over a pixel buffer.
pub trait PixelTransform {
    fn apply(&self, buffer: &mut dyn PixelBuffer);
}

impl PixelTransform for Effect {
    fn apply(&self, buffer: &mut dyn PixelBuffer) {
        let f = self.factor();
        match self.kind {
            EffectKind::Brightness => map_channels(buffer, |c| c * (0.5 + f)),
            EffectKind::Contrast => {
                let k = contrast_factor(f);
                map_channels(buffer, |c| k * (c - 128.0) + 128.0)
            }
            EffectKind::Saturation => map_pixels(buffer, |rgb| {
                let gray = luma(rgb);
                rgb.map(|c| gray + 2.0 * f * (c - gray))
            }),
            EffectKind::Grayscale => map_pixels(buffer, |rgb| {
                let gray = luma(rgb);
                rgb.map(|c| c * (1.0 - f) + gray * f)
            }),
            EffectKind::Sepia => map_pixels(buffer, |rgb| {
                let sepia = mat3(&SEPIA, rgb);
                [0, 1, 2].map(|i| rgb[i] * (1.0 - f) + sepia[i] * f)
            }),
            EffectKind::Invert => map_channels(buffer, |c| c * (1.0 - f) + (255.0 - c) * f),
            EffectKind::HueRotate => {
                let m = hue_rotation(f * 360.0);
                map_pixels(buffer, |rgb| mat3(&m, rgb))
            }
            EffectKind::Blur => box_blur(buffer, blur_radius(f)),
            EffectKind::Sharpen => sharpen(buffer, f),
            EffectKind::Vignette => vignette(buffer, f),
        }
    }
}

/// Apply effects in list order.
pub fn apply_effects(buffer: &mut dyn PixelBuffer, effects: &[Effect]) {
    for effect in effects {
        effect.apply(buffer);
    }
}

const SEPIA: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

fn luma([r, g, b]: [f64; 3]) -> f64 {
    0.2989 * r + 0.587 * g + 0.114 * b
}

fn contrast_factor(f: f64) -> f64 {
    let c = f * 255.0;
    (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
}

/// Box blur radius for a normalised intensity.
pub fn blur_radius(f: f64) -> usize {
    ((f * 10.0).floor().max(0.0) as usize).min(MAX_BLUR_RADIUS)
}

fn mat3(m: &[[f64; 3]; 3], [r, g, b]: [f64; 3]) -> [f64; 3] {
    [0, 1, 2].map(|i| m[i][0] * r + m[i][1] * g + m[i][2] * b)
}

/// Luminance-preserving hue rotation matrix.
fn hue_rotation(degrees: f64) -> [[f64; 3]; 3] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn map_channels(buffer: &mut dyn PixelBuffer, op: impl Fn(f64) -> f64) {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        for c in &mut px[..3] {
            *c = to_channel(op(*c as f64));
        }
    }
}

fn map_pixels(buffer: &mut dyn PixelBuffer, op: impl Fn([f64; 3]) -> [f64; 3]) {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let out = op([px[0] as f64, px[1] as f64, px[2] as f64]);
        for (c, v) in px[..3].iter_mut().zip(out) {
            *c = to_channel(v);
        }
    }
}

/// Separable box blur with edge clamping.
fn box_blur(buffer: &mut dyn PixelBuffer, radius: usize) {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if radius == 0 || w == 0 || h == 0 {
        return;
    }
    let src: Vec<f64> = buffer.pixels().iter().map(|&v| v as f64).collect();
    let window = (2 * radius + 1) as f64;

    let mut horizontal = src.clone();
    for y in 0..h {
        for x in 0..w {
            for c in 0..3 {
                let mut sum = 0.0;
                for dx in -(radius as isize)..=radius as isize {
                    let sx = clamp_index(x as isize + dx, w);
                    sum += src[(y * w + sx) * CHANNELS + c];
                }
                horizontal[(y * w + x) * CHANNELS + c] = sum / window;
            }
        }
    }

    let out = buffer.pixels_mut();
    for y in 0..h {
        for x in 0..w {
            for c in 0..3 {
                let mut sum = 0.0;
                for dy in -(radius as isize)..=radius as isize {
                    let sy = clamp_index(y as isize + dy, h);
                    sum += horizontal[(sy * w + x) * CHANNELS + c];
                }
                out[(y * w + x) * CHANNELS + c] = to_channel(sum / window);
            }
        }
    }
}

/// 3x3 sharpen kernel `[[0,-1,0],[-1,5,-1],[0,-1,0]]` blended by `f`.
fn sharpen(buffer: &mut dyn PixelBuffer, f: f64) {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if f <= 0.0 || w == 0 || h == 0 {
        return;
    }
    let src = buffer.pixels().to_vec();
    let at = |x: isize, y: isize, c: usize| -> f64 {
        let (x, y) = (clamp_index(x, w), clamp_index(y, h));
        src[(y * w + x) * CHANNELS + c] as f64
    };

    let out = buffer.pixels_mut();
    for y in 0..h as isize {
        for x in 0..w as isize {
            for c in 0..3 {
                let centre = at(x, y, c);
                let sharpened = 5.0 * centre
                    - at(x - 1, y, c)
                    - at(x + 1, y, c)
                    - at(x, y - 1, c)
                    - at(x, y + 1, c);
                let i = (y as usize * w + x as usize) * CHANNELS + c;
                out[i] = to_channel(centre * (1.0 - f) + sharpened * f);
            }
        }
    }
}

/// Radial darkening: `c *= 1 - (d / dmax) * f` with `d` measured from the
/// centre and `dmax` the centre-to-corner distance.
fn vignette(buffer: &mut dyn PixelBuffer, f: f64) {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if f <= 0.0 || w == 0 || h == 0 {
        return;
    }
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let dmax = (cx * cx + cy * cy).sqrt();

    let out = buffer.pixels_mut();
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let scale = 1.0 - ((dx * dx + dy * dy).sqrt() / dmax) * f;
            let i = (y * w + x) * CHANNELS;
            for c in &mut out[i..i + 3] {
                *c = to_channel(*c as f64 * scale);
            }
        }
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn single(rgba: [u8; 4], effect: Effect) -> [u8; 4] {
        let mut frame = Frame::filled(1, 1, rgba);
        effect.apply(&mut frame);
        frame.pixel(0, 0)
    }

    #[test]
    fn test_brightness() {
        assert_eq!(single([100, 200, 40, 77], Effect::new(EffectKind::Brightness, 50.0)), [100, 200, 40, 77]);
        assert_eq!(single([100, 200, 40, 255], Effect::new(EffectKind::Brightness, 100.0)), [150, 255, 60, 255]);
        assert_eq!(single([100, 200, 40, 255], Effect::new(EffectKind::Brightness, 0.0)), [50, 100, 20, 255]);
    }

    #[test]
    fn test_contrast_neutral_at_zero() {
        // k = 259*255 / (255*259) = 1
        assert_eq!(single([10, 128, 250, 255], Effect::new(EffectKind::Contrast, 0.0)), [10, 128, 250, 255]);
        let px = single([100, 128, 160, 255], Effect::new(EffectKind::Contrast, 50.0));
        assert!(px[0] < 100 && px[2] > 160);
        assert_eq!(px[1], 128);
    }

    #[test]
    fn test_grayscale_full() {
        let px = single([255, 0, 0, 255], Effect::new(EffectKind::Grayscale, 100.0));
        assert_eq!(px, [76, 76, 76, 255]);
    }

    #[test]
    fn test_saturation_half_is_identity() {
        let px = single([30, 140, 220, 255], Effect::new(EffectKind::Saturation, 50.0));
        assert_eq!(px, [30, 140, 220, 255]);
    }

    #[test]
    fn test_sepia_full() {
        let px = single([100, 100, 100, 255], Effect::new(EffectKind::Sepia, 100.0));
        // 0.393+0.769+0.189 = 1.351 -> 135.1
        assert_eq!(px, [135, 120, 94, 255]);
    }

    #[test]
    fn test_invert() {
        assert_eq!(single([0, 100, 255, 9], Effect::new(EffectKind::Invert, 100.0)), [255, 155, 0, 9]);
        assert_eq!(single([0, 100, 255, 9], Effect::new(EffectKind::Invert, 0.0)), [0, 100, 255, 9]);
    }

    #[test]
    fn test_hue_rotate_full_turn_is_identity() {
        let px = single([200, 50, 10, 255], Effect::new(EffectKind::HueRotate, 100.0));
        for (got, want) in px.iter().zip([200u8, 50, 10, 255]) {
            assert!((*got as i32 - want as i32).abs() <= 1, "{px:?}");
        }
    }

    #[test]
    fn test_blur_radius_mapping() {
        assert_eq!(blur_radius(0.0), 0);
        assert_eq!(blur_radius(0.09), 0);
        assert_eq!(blur_radius(0.35), 3);
        assert_eq!(blur_radius(1.0), 10);
    }

    #[test]
    fn test_blur_spreads_a_bright_pixel() {
        let mut frame = Frame::black(5, 5);
        frame.set_pixel(2, 2, [255, 255, 255, 255]);
        Effect::new(EffectKind::Blur, 10.0).apply(&mut frame);
        // Radius 1: 3x3 box, 255 / 9 = 28.33
        assert_eq!(frame.pixel(2, 2), [28, 28, 28, 255]);
        assert_eq!(frame.pixel(1, 1), [28, 28, 28, 255]);
        assert_eq!(frame.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_sharpen_flat_image_unchanged() {
        let mut frame = Frame::filled(3, 3, [90, 90, 90, 255]);
        Effect::new(EffectKind::Sharpen, 100.0).apply(&mut frame);
        assert_eq!(frame, Frame::filled(3, 3, [90, 90, 90, 255]));
    }

    #[test]
    fn test_vignette_darkens_corners_more() {
        let mut frame = Frame::filled(9, 9, [200, 200, 200, 255]);
        Effect::new(EffectKind::Vignette, 100.0).apply(&mut frame);
        let centre = frame.pixel(4, 4)[0];
        let corner = frame.pixel(0, 0)[0];
        assert_eq!(centre, 200);
        assert!(corner < 40, "corner = {corner}");
    }

    #[test]
    fn test_effect_order_matters() {
        // Brightness 50 is the neutral point, so a non-neutral level is used.
        let effects = [
            Effect::new(EffectKind::Brightness, 80.0),
            Effect::new(EffectKind::Invert, 100.0),
        ];
        let mut forward = Frame::filled(1, 1, [201, 41, 93, 255]);
        apply_effects(&mut forward, &effects);
        let mut reversed = Frame::filled(1, 1, [201, 41, 93, 255]);
        apply_effects(&mut reversed, &[effects[1], effects[0]]);

        assert_eq!(forward.pixel(0, 0), [0, 202, 134, 255]);
        assert_eq!(reversed.pixel(0, 0), [70, 255, 211, 255]);
    }
}
