//! Live preview driven by the wall clock.

use cutline_common::{PlaybackClock, PlaybackDefaults};
use cutline_project_model::Project;

use crate::audio_sync::{AudioSyncController, MediaTransport};
use crate::compositor::FrameRenderer;
use crate::error::RenderError;
use crate::frame::Frame;

/// Owns the preview clock, audio sync state, and the displayed frame.
#[derive(Debug)]
pub struct PreviewPlayer {
    clock: PlaybackClock,
    audio: AudioSyncController,
    frame: Frame,
}

impl PreviewPlayer {
    pub fn new(width: u32, height: u32, audio: AudioSyncController) -> Self {
        Self {
            clock: PlaybackClock::new(),
            audio,
            frame: Frame::black(width, height),
        }
    }

    pub fn from_config(width: u32, height: u32, playback: &PlaybackDefaults) -> Self {
        Self::new(width, height, AudioSyncController::from_config(playback))
    }

    pub fn play(&mut self) {
        self.clock.start();
    }

    pub fn pause(&mut self) {
        self.clock.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    /// Move the playhead; audio is re-seeked on the next tick.
    pub fn seek(&mut self, time: f64) {
        self.clock.seek(time);
        self.audio.seek(self.clock.time());
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    pub fn audio(&self) -> &AudioSyncController {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioSyncController {
        &mut self.audio
    }

    /// Render the current instant and resync audio. Playback stops once the
    /// clock reaches the end of the project.
    pub fn tick(
        &mut self,
        project: &Project,
        renderer: &mut dyn FrameRenderer,
        transport: &mut dyn MediaTransport,
    ) -> Result<f64, RenderError> {
        let end = project.duration();
        if self.clock.is_running() && self.clock.time() >= end {
            self.clock.stop();
            self.clock.seek(end);
            tracing::debug!(end, "Preview reached end of timeline");
        }

        let time = self.clock.time();
        renderer.render_into(project, time, &mut self.frame)?;
        self.audio
            .update(project, time, self.clock.is_running(), transport)?;
        Ok(time)
    }
}
