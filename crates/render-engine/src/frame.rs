//! RGBA pixel buffers.

use crate::error::RenderError;

/// Bytes per pixel in every buffer: straight (non-premultiplied) RGBA8.
pub const CHANNELS: usize = 4;

/// A row-major RGBA8 image that effects can operate on in place.
pub trait PixelBuffer {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn pixels(&self) -> &[u8];

    fn pixels_mut(&mut self) -> &mut [u8];

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = pixel_offset(self.width(), x, y);
        let p = &self.pixels()[i..i + CHANNELS];
        [p[0], p[1], p[2], p[3]]
    }

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = pixel_offset(self.width(), x, y);
        self.pixels_mut()[i..i + CHANNELS].copy_from_slice(&rgba);
    }
}

fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * CHANNELS
}

/// An owned RGBA frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// A frame filled with one colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * CHANNELS);
        for _ in 0..len {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Opaque black, the base of every composite.
    pub fn black(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 255])
    }

    /// Fully transparent, used as a canvas for synthesized layers.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Wrap raw RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Nearest-neighbour resample to `width x height`, stretching to fill.
    pub fn scaled(&self, width: u32, height: u32) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Frame::transparent(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = ((y as u64 * self.height as u64) / height as u64) as u32;
            for x in 0..width {
                let sx = ((x as u64 * self.width as u64) / width as u64) as u32;
                out.set_pixel(x, y, self.pixel(sx, sy));
            }
        }
        out
    }

    /// Multiply every alpha value by `factor` in `[0, 1]`.
    pub fn multiply_alpha(&mut self, factor: f64) {
        let factor = factor.clamp(0.0, 1.0);
        if factor >= 1.0 {
            return;
        }
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px[3] = to_channel(px[3] as f64 * factor);
        }
    }

    /// Composite `layer` over this frame (Porter-Duff source-over).
    ///
    /// Both frames must have the same dimensions; a mismatched layer is
    /// resampled first.
    pub fn alpha_over(&mut self, layer: &Frame) {
        let resampled;
        let layer = if layer.width != self.width || layer.height != self.height {
            resampled = layer.scaled(self.width, self.height);
            &resampled
        } else {
            layer
        };

        for (dst, src) in self
            .data
            .chunks_exact_mut(CHANNELS)
            .zip(layer.data.chunks_exact(CHANNELS))
        {
            let sa = src[3] as f64 / 255.0;
            if sa <= 0.0 {
                continue;
            }
            let da = dst[3] as f64 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            for c in 0..3 {
                let value = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
                dst[c] = to_channel(value);
            }
            dst[3] = to_channel(out_a * 255.0);
        }
    }
}

impl PixelBuffer for Frame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixels(&self) -> &[u8] {
        &self.data
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Round and clamp a channel value to `[0, 255]`.
pub fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_is_opaque() {
        let frame = Frame::black(3, 2);
        assert_eq!(frame.pixels().len(), 24);
        assert_eq!(frame.pixel(2, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Frame::from_rgba(2, 2, vec![0; 15]),
            Err(RenderError::BufferSize { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_scaled_stretches_nearest_neighbour() {
        let mut src = Frame::black(2, 1);
        src.set_pixel(1, 0, [255, 0, 0, 255]);
        let out = src.scaled(4, 2);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(out.pixel(1, 1), [0, 0, 0, 255]);
        assert_eq!(out.pixel(2, 0), [255, 0, 0, 255]);
        assert_eq!(out.pixel(3, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn test_alpha_over_blends() {
        let mut base = Frame::black(1, 1);
        let layer = Frame::filled(1, 1, [200, 100, 50, 128]);
        base.alpha_over(&layer);
        let px = base.pixel(0, 0);
        assert_eq!(px[3], 255);
        assert_eq!(px[0], 100);
        assert_eq!(px[1], 50);
        assert_eq!(px[2], 25);
    }

    #[test]
    fn test_opaque_layer_replaces() {
        let mut base = Frame::black(2, 2);
        let layer = Frame::filled(2, 2, [10, 20, 30, 255]);
        base.alpha_over(&layer);
        assert_eq!(base, layer);
    }

    #[test]
    fn test_multiply_alpha() {
        let mut frame = Frame::filled(1, 1, [1, 2, 3, 200]);
        frame.multiply_alpha(0.5);
        assert_eq!(frame.pixel(0, 0), [1, 2, 3, 100]);
    }
}
