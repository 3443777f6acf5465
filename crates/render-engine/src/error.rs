//! Error types for rendering, audio sync, encoding, and export.

use std::path::PathBuf;

use cutline_common::CutlineError;

/// Failure to obtain a visual sample for an asset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Asset {asset_id} is not available")]
    Missing { asset_id: String },

    #[error("Failed to decode {asset_id} at {media_time}s: {reason}")]
    Decode {
        asset_id: String,
        media_time: f64,
        reason: String,
    },
}

/// A media transport refused a command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Media transport error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while producing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Font error: {message}")]
    Font { message: String },

    #[error("Failed to read font {path}: {source}")]
    FontIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised by an encoder sink.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("Encoder has not been started")]
    NotStarted,

    #[error("Encoder is already running")]
    AlreadyStarted,

    #[error("Frame is {actual_width}x{actual_height}, encoder expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Invalid encoder parameters: {message}")]
    InvalidParameters { message: String },
}

/// Errors that abort an export. Partial output is discarded.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid export settings: {message}")]
    InvalidSettings { message: String },

    #[error("Export cancelled after {frames_rendered} frames")]
    Cancelled { frames_rendered: u64 },

    #[error("Render failed at {time}s: {source}")]
    Render { time: f64, source: RenderError },

    #[error("Audio sync failed at {time}s: {source}")]
    Audio { time: f64, source: TransportError },

    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

impl From<RenderError> for CutlineError {
    fn from(err: RenderError) -> Self {
        CutlineError::render(err.to_string())
    }
}

impl From<ExportError> for CutlineError {
    fn from(err: ExportError) -> Self {
        CutlineError::export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_maps_to_export() {
        let err: CutlineError = ExportError::Cancelled { frames_rendered: 3 }.into();
        assert!(matches!(err, CutlineError::Export { .. }));
        assert!(err.to_string().contains("3 frames"));
    }

    #[test]
    fn test_transport_error_converts_to_render_error() {
        let err: RenderError = TransportError::new("device lost").into();
        assert_eq!(err.to_string(), "Media transport error: device lost");
    }
}
