//! Encoder sinks that receive exported frames.

use crate::error::EncoderError;
use crate::frame::{to_channel, Frame, PixelBuffer, CHANNELS};

/// Destination for rendered export frames.
///
/// A sink is started once, receives every frame in timeline order, and is
/// either finished (yielding the encoded bytes) or aborted (discarding them).
pub trait EncoderSink: Send {
    fn start(&mut self, width: u32, height: u32, fps: u32) -> Result<(), EncoderError>;

    fn capture(&mut self, frame: &Frame, time: f64) -> Result<(), EncoderError>;

    fn finish(&mut self) -> Result<Vec<u8>, EncoderError>;

    /// Drop everything written so far. Safe to call in any state.
    fn abort(&mut self);
}

#[derive(Debug)]
struct Y4mStream {
    width: u32,
    height: u32,
    frames: u64,
    out: Vec<u8>,
}

/// In-memory YUV4MPEG2 writer with full-resolution (4:4:4) chroma.
///
/// Colours are converted with BT.601 limited-range coefficients; alpha is
/// ignored because composited frames are opaque.
#[derive(Debug, Default)]
pub struct Y4mSink {
    stream: Option<Y4mStream>,
}

impl Y4mSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames captured since `start`.
    pub fn frames_written(&self) -> u64 {
        self.stream.as_ref().map_or(0, |s| s.frames)
    }
}

impl EncoderSink for Y4mSink {
    fn start(&mut self, width: u32, height: u32, fps: u32) -> Result<(), EncoderError> {
        if self.stream.is_some() {
            return Err(EncoderError::AlreadyStarted);
        }
        if width == 0 || height == 0 || fps == 0 {
            return Err(EncoderError::InvalidParameters {
                message: format!("{width}x{height} at {fps} fps"),
            });
        }
        let header = format!("YUV4MPEG2 W{width} H{height} F{fps}:1 Ip A1:1 C444\n");
        let plane = width as usize * height as usize;
        let mut out = Vec::with_capacity(header.len() + plane * 3);
        out.extend_from_slice(header.as_bytes());
        self.stream = Some(Y4mStream {
            width,
            height,
            frames: 0,
            out,
        });
        Ok(())
    }

    fn capture(&mut self, frame: &Frame, _time: f64) -> Result<(), EncoderError> {
        let stream = self.stream.as_mut().ok_or(EncoderError::NotStarted)?;
        if frame.width() != stream.width || frame.height() != stream.height {
            return Err(EncoderError::FrameSize {
                width: stream.width,
                height: stream.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let plane = stream.width as usize * stream.height as usize;
        let mut y = Vec::with_capacity(plane);
        let mut u = Vec::with_capacity(plane);
        let mut v = Vec::with_capacity(plane);
        for px in frame.pixels().chunks_exact(CHANNELS) {
            let [luma, cb, cr] = rgb_to_ycbcr(px[0], px[1], px[2]);
            y.push(luma);
            u.push(cb);
            v.push(cr);
        }

        stream.out.extend_from_slice(b"FRAME\n");
        stream.out.extend_from_slice(&y);
        stream.out.extend_from_slice(&u);
        stream.out.extend_from_slice(&v);
        stream.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>, EncoderError> {
        let stream = self.stream.take().ok_or(EncoderError::NotStarted)?;
        tracing::debug!(frames = stream.frames, bytes = stream.out.len(), "Y4M stream finished");
        Ok(stream.out)
    }

    fn abort(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::debug!(frames = stream.frames, "Y4M stream discarded");
        }
    }
}

/// BT.601 limited-range conversion.
fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let y = 16.0 + (65.481 * r + 128.553 * g + 24.966 * b) / 255.0;
    let cb = 128.0 + (-37.797 * r - 74.203 * g + 112.0 * b) / 255.0;
    let cr = 128.0 + (112.0 * r - 93.786 * g - 18.214 * b) / 255.0;
    [to_channel(y), to_channel(cb), to_channel(cr)]
}
