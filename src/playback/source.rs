//! Clip slot capability

use std::time::Duration;

use crate::error::AudioError;

/// Something a clip slot can play and sample for analysis.
pub trait ClipSource {
    /// Whether there is audio to play
    fn has_clip(&self) -> bool;

    /// Start (or restart) playback
    fn play(&mut self) -> Result<(), AudioError>;

    /// Stop playback; no-op when already stopped
    fn stop(&mut self);

    /// Whether playback is currently running
    fn is_playing(&self) -> bool;

    /// Move the play head forward by one frame of wall time
    fn advance(&mut self, dt: Duration);

    /// Sample rate of the samples returned by [`ClipSource::recent_samples`]
    fn sample_rate(&self) -> u32;

    /// Fill `out` with the most recently played samples, oldest first.
    ///
    /// Returns `false` when no fresh audio is available this frame.
    fn recent_samples(&mut self, out: &mut [f32]) -> bool;
}
