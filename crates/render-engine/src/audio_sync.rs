//! Audio/visual synchronization.
//!
//! Each audio-capable clip owns a media transport that plays independently
//! of the timeline clock. [`AudioSyncController::update`] is called once per
//! rendered frame and nudges every transport back onto the timeline: seeking
//! when it drifts, pausing it outside its clip, and applying gain and fades.

use std::collections::BTreeSet;

use cutline_common::PlaybackDefaults;
use cutline_project_model::{Clip, ClipId, Project};

use crate::error::TransportError;

/// Drift tolerated before a playing transport is re-seeked, in seconds.
pub const DEFAULT_RESYNC_THRESHOLD: f64 = 0.3;

/// Playback handles for clip audio, keyed by clip id.
pub trait MediaTransport: Send {
    /// Current media position in seconds, if the transport exists.
    fn position(&self, clip: ClipId) -> Option<f64>;

    fn is_playing(&self, clip: ClipId) -> bool;

    fn seek(&mut self, clip: ClipId, media_time: f64) -> Result<(), TransportError>;

    /// Linear gain; 0 is silent.
    fn set_gain(&mut self, clip: ClipId, gain: f64) -> Result<(), TransportError>;

    fn play(&mut self, clip: ClipId) -> Result<(), TransportError>;

    fn pause(&mut self, clip: ClipId) -> Result<(), TransportError>;
}

/// Keeps clip transports aligned with the timeline.
#[derive(Debug, Clone)]
pub struct AudioSyncController {
    master_volume: f64,
    resync_threshold: f64,
    last_time: Option<f64>,
    force_resync: bool,
    started: BTreeSet<ClipId>,
}

impl Default for AudioSyncController {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_RESYNC_THRESHOLD)
    }
}

impl AudioSyncController {
    pub fn new(master_volume: f64, resync_threshold: f64) -> Self {
        Self {
            master_volume: master_volume.clamp(0.0, 1.0),
            resync_threshold: resync_threshold.max(0.0),
            last_time: None,
            force_resync: true,
            started: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &PlaybackDefaults) -> Self {
        Self::new(config.master_volume, config.resync_threshold_secs)
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Mark a discontinuity so every active clip is re-seeked on the next
    /// update.
    pub fn seek(&mut self, time: f64) {
        tracing::debug!(time, "Audio resync requested");
        self.last_time = Some(time);
        self.force_resync = true;
    }

    /// Gain for `clip` at `time`, including master volume and fade ramps.
    pub fn gain_at(&self, clip: &Clip, time: f64) -> f64 {
        let mut gain = clip.volume * self.master_volume;
        let elapsed = time - clip.start_time;
        if clip.fade_in > 0.0 && elapsed < clip.fade_in {
            gain *= (elapsed / clip.fade_in).clamp(0.0, 1.0);
        }
        let remaining = clip.end_time() - time;
        if clip.fade_out > 0.0 && remaining < clip.fade_out {
            gain *= (remaining / clip.fade_out).clamp(0.0, 1.0);
        }
        gain
    }

    /// Bring every clip transport in line with timeline `time`.
    pub fn update(
        &mut self,
        project: &Project,
        time: f64,
        playing: bool,
        transport: &mut dyn MediaTransport,
    ) -> Result<(), TransportError> {
        let discontinuous = self.force_resync
            || self
                .last_time
                .map_or(true, |last| (time - last).abs() > self.resync_threshold);
        self.last_time = Some(time);
        self.force_resync = false;

        for track in &project.tracks {
            for clip in track.clips.iter().filter(|c| c.has_audio()) {
                let id = clip.id;
                if !clip.is_active_at(time) || track.muted {
                    if track.muted {
                        transport.set_gain(id, 0.0)?;
                    }
                    if transport.is_playing(id) {
                        transport.pause(id)?;
                    }
                    continue;
                }

                let target = clip.media_time_at(time);
                let drifted = transport
                    .position(id)
                    .map_or(true, |actual| (actual - target).abs() > self.resync_threshold);
                if discontinuous || (playing && drifted) {
                    transport.seek(id, target)?;
                }
                transport.set_gain(id, self.gain_at(clip, time))?;

                match (playing, transport.is_playing(id)) {
                    (true, false) => {
                        transport.play(id)?;
                        self.started.insert(id);
                    }
                    (false, true) => transport.pause(id)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Pause every transport this controller started.
    pub fn release_all(&mut self, transport: &mut dyn MediaTransport) -> Result<(), TransportError> {
        let started = std::mem::take(&mut self.started);
        for id in started {
            if transport.is_playing(id) {
                transport.pause(id)?;
            }
        }
        self.force_resync = true;
        Ok(())
    }
}

/// A transport with nothing behind it, for silent export and tests.
#[derive(Debug, Default, Clone)]
pub struct NullTransport;

impl MediaTransport for NullTransport {
    fn position(&self, _clip: ClipId) -> Option<f64> {
        None
    }

    fn is_playing(&self, _clip: ClipId) -> bool {
        false
    }

    fn seek(&mut self, _clip: ClipId, _media_time: f64) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_gain(&mut self, _clip: ClipId, _gain: f64) -> Result<(), TransportError> {
        Ok(())
    }

    fn play(&mut self, _clip: ClipId) -> Result<(), TransportError> {
        Ok(())
    }

    fn pause(&mut self, _clip: ClipId) -> Result<(), TransportError> {
        Ok(())
    }
}
