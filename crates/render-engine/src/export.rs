//! Frame-accurate export on a virtual clock.
//!
//! Export walks the timeline at exactly `1 / fps` steps, independent of how
//! long each frame takes to render. For every frame index the pipeline
//! renders, resyncs audio, waits one frame interval through a [`FramePacer`],
//! and then hands the frame to an [`EncoderSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cutline_common::{ExportDefaults, VirtualClock};
use cutline_project_model::Project;

use crate::audio_sync::MediaTransport;
use crate::compositor::FrameRenderer;
use crate::error::ExportError;
use crate::frame::Frame;
use crate::preview::PreviewPlayer;
use crate::sink::{EncoderSink, Y4mSink};

/// Output parameters for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub fps: u32,

    /// Seconds to export; the project end time when `None`.
    pub duration: Option<f64>,

    pub width: u32,
    pub height: u32,
}

impl ExportSettings {
    pub fn from_config(config: &ExportDefaults) -> Self {
        Self {
            fps: config.fps,
            duration: None,
            width: config.width,
            height: config.height,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    fn clock(&self) -> Result<VirtualClock, ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::InvalidSettings {
                message: format!("frame size {}x{} is empty", self.width, self.height),
            });
        }
        if let Some(d) = self.duration {
            if !d.is_finite() || d < 0.0 {
                return Err(ExportError::InvalidSettings {
                    message: format!("duration {d} is not a non-negative number"),
                });
            }
        }
        VirtualClock::new(self.fps as f64).ok_or_else(|| ExportError::InvalidSettings {
            message: format!("frame rate {} must be positive", self.fps),
        })
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&ExportDefaults::default())
    }
}

/// Yields control for one frame interval between render and capture.
#[allow(async_fn_in_trait)]
pub trait FramePacer {
    async fn wait(&mut self, interval: Duration);
}

/// Real-time pacing on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl FramePacer for TokioPacer {
    async fn wait(&mut self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Yields to the runtime without waiting, exporting as fast as frames render.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnpacedPacer;

impl FramePacer for UnpacedPacer {
    async fn wait(&mut self, _interval: Duration) {
        tokio::task::yield_now().await;
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub frames: u64,
    pub fps: u32,
    pub duration_secs: f64,

    /// RFC 3339 wall-clock timestamps.
    pub started_at: String,
    pub finished_at: String,

    /// Bytes produced by the sink.
    pub output: Vec<u8>,
}

/// One export run over borrowed collaborators.
pub struct ExportPipeline<'a> {
    settings: ExportSettings,
    renderer: &'a mut dyn FrameRenderer,
    transport: &'a mut dyn MediaTransport,
    sink: &'a mut dyn EncoderSink,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(
        settings: ExportSettings,
        renderer: &'a mut dyn FrameRenderer,
        transport: &'a mut dyn MediaTransport,
        sink: &'a mut dyn EncoderSink,
    ) -> Self {
        Self {
            settings,
            renderer,
            transport,
            sink,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Share an existing cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setting this flag stops the export before the next frame.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Render the project to the sink.
    ///
    /// The player is paused for the duration of the export; its play state
    /// and position are restored afterwards whether or not export succeeds.
    pub async fn run<P: FramePacer>(
        &mut self,
        project: &Project,
        player: &mut PreviewPlayer,
        pacer: &mut P,
    ) -> Result<ExportReport, ExportError> {
        let clock = self.settings.clock()?;
        let duration = self.settings.duration.unwrap_or_else(|| project.duration());
        let total_frames = clock.frame_count(duration);

        let was_playing = player.is_playing();
        let resume_at = player.time();
        player.pause();

        let started_at = chrono::Utc::now().to_rfc3339();
        tracing::info!(
            fps = self.settings.fps,
            duration,
            total_frames,
            width = self.settings.width,
            height = self.settings.height,
            "Starting export"
        );
        self.report(ExportStage::Preparing, 0, total_frames, 0.0);

        let result = self
            .render_frames(project, player, pacer, &clock, total_frames)
            .await;

        if let Err(e) = player.audio_mut().release_all(&mut *self.transport) {
            tracing::warn!(error = %e, "Failed to release audio after export");
        }
        player.seek(resume_at);
        if was_playing {
            player.play();
        }

        match result {
            Ok(output) => {
                self.report(ExportStage::Complete, total_frames, total_frames, 0.0);
                tracing::info!(frames = total_frames, bytes = output.len(), "Export complete");
                Ok(ExportReport {
                    frames: total_frames,
                    fps: self.settings.fps,
                    duration_secs: duration,
                    started_at,
                    finished_at: chrono::Utc::now().to_rfc3339(),
                    output,
                })
            }
            Err(e) => {
                self.sink.abort();
                self.report(ExportStage::Failed, 0, total_frames, 0.0);
                tracing::warn!(error = %e, "Export aborted");
                Err(e)
            }
        }
    }

    async fn render_frames<P: FramePacer>(
        &mut self,
        project: &Project,
        player: &mut PreviewPlayer,
        pacer: &mut P,
        clock: &VirtualClock,
        total_frames: u64,
    ) -> Result<Vec<u8>, ExportError> {
        let (width, height) = (self.settings.width, self.settings.height);
        self.sink.start(width, height, self.settings.fps)?;

        let mut frame = Frame::black(width, height);
        let interval = clock.frame_interval();
        let render_started = Instant::now();

        for index in 0..total_frames {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(ExportError::Cancelled {
                    frames_rendered: index,
                });
            }

            let time = clock.time_at(index);
            self.renderer
                .render_into(project, time, &mut frame)
                .map_err(|source| ExportError::Render { time, source })?;
            player
                .audio_mut()
                .update(project, time, true, &mut *self.transport)
                .map_err(|source| ExportError::Audio { time, source })?;
            pacer.wait(interval).await;
            self.sink.capture(&frame, time)?;

            let done = index + 1;
            let elapsed = render_started.elapsed().as_secs_f64();
            let eta = elapsed / done as f64 * (total_frames - done) as f64;
            self.report(ExportStage::Rendering, done, total_frames, eta);
        }

        self.report(ExportStage::Finalizing, total_frames, total_frames, 0.0);
        Ok(self.sink.finish()?)
    }

    fn report(&self, stage: ExportStage, frames_rendered: u64, total_frames: u64, eta_secs: f64) {
        if let Some(cb) = &self.progress {
            let progress = if total_frames == 0 {
                0.0
            } else {
                frames_rendered as f64 / total_frames as f64
            };
            cb(ExportProgress {
                progress,
                frames_rendered,
                total_frames,
                eta_secs,
                stage,
            });
        }
    }
}

/// Export the project to an in-memory YUV4MPEG2 stream in real time.
///
/// This is the main entry point for rendering.
pub async fn export_project(
    project: &Project,
    settings: ExportSettings,
    renderer: &mut dyn FrameRenderer,
    transport: &mut dyn MediaTransport,
    player: &mut PreviewPlayer,
    progress: Option<ProgressCallback>,
) -> Result<ExportReport, ExportError> {
    let mut sink = Y4mSink::new();
    let mut pipeline = ExportPipeline::new(settings, renderer, transport, &mut sink);
    if let Some(cb) = progress {
        pipeline = pipeline.with_progress(cb);
    }
    let report = pipeline.run(project, player, &mut TokioPacer).await?;
    Ok(report)
}
