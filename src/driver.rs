//! Frame driver
//!
//! [`Lipsync`] is what a host calls once per animation frame. It owns the
//! clip slots, the spectrum analyzer, one [`LipsyncSession`] and the mesh
//! sink, and runs the whole pipeline synchronously inside [`Lipsync::tick`].

use std::time::Duration;

use crate::analysis::SpectrumAnalyzer;
use crate::config::{BlendshapeNames, ClipSlotConfig, Config, LipsyncConfig};
use crate::error::{LipsyncError, PlaybackError};
use crate::playback::{ClipBuffer, ClipSource, PlaybackController};
use crate::session::LipsyncSession;
use crate::sink::{BlendShapeBinding, BlendShapeSink};
use crate::viseme::VisemeWeights;

pub struct Lipsync<S: BlendShapeSink> {
    controller: PlaybackController,
    analyzer: SpectrumAnalyzer,
    session: LipsyncSession,
    sink: S,
    /// Time-domain samples handed to the analyzer each tick
    block: Vec<f32>,
    /// Set by a failed `play`; the following tick does not run the pipeline
    skip_next_tick: bool,
}

impl<S: BlendShapeSink> Lipsync<S> {
    /// Wire a session to `sink`, resolving the blendshape names once
    pub fn new(
        config: &LipsyncConfig,
        names: &BlendshapeNames,
        controller: PlaybackController,
        sink: S,
    ) -> Result<Self, LipsyncError> {
        let binding = BlendShapeBinding::resolve(&sink, names);
        let session = LipsyncSession::new(config, binding)?;
        let analyzer = SpectrumAnalyzer::new(config.spectrum_size, config.window);
        let block = vec![0.0; analyzer.block_len()];

        tracing::debug!(
            "Lipsync ready: {} slots, pitch {}, {} bins",
            controller.slot_count(),
            config.pitch,
            config.spectrum_size
        );

        Ok(Self {
            controller,
            analyzer,
            session,
            sink,
            block,
            skip_next_tick: false,
        })
    }

    /// Build slots from the config and wire everything to `sink`
    pub fn from_config(config: &Config, sink: S) -> Result<Self, LipsyncError> {
        let controller = PlaybackController::new(build_slots(config));
        Self::new(&config.lipsync, &config.blendshapes, controller, sink)
    }

    /// Start the clip in `slot`; see [`PlaybackController::play`].
    ///
    /// On failure the selection and playback are untouched, but the next
    /// tick skips analysis and leaves the sink alone.
    pub fn play(&mut self, slot: usize) -> Result<(), PlaybackError> {
        let result = self.controller.play(slot);
        self.skip_next_tick = result.is_err();
        result
    }

    /// Stop the selected clip. The mouth keeps its last pose.
    pub fn stop_audio(&mut self) {
        self.controller.stop_audio();
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_active()
    }

    /// Run one frame.
    ///
    /// Returns the smoothed weights written to the sink, or `None` when the
    /// pipeline did not run (nothing playing, no fresh audio this frame, or
    /// the frame right after a failed `play`).
    pub fn tick(&mut self, dt: Duration) -> Option<VisemeWeights> {
        self.controller.advance(dt);

        if std::mem::take(&mut self.skip_next_tick) {
            return None;
        }

        let source = self.controller.active_source_mut()?;
        if !source.recent_samples(&mut self.block) {
            return None;
        }
        let sample_rate = source.sample_rate();

        let frame = self.analyzer.frame(&self.block, sample_rate);
        let weights = self.session.tick(&frame);
        self.session.apply(&mut self.sink);

        Some(weights)
    }

    pub fn session(&self) -> &LipsyncSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut LipsyncSession {
        &mut self.session
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Create clip slots from the configuration.
///
/// A slot whose clip fails to load is left unbound so `Play` on it reports a
/// playback error instead of failing startup.
pub fn build_slots(config: &Config) -> Vec<Option<Box<dyn ClipSource>>> {
    config
        .clips
        .iter()
        .enumerate()
        .map(|(i, slot)| match slot {
            ClipSlotConfig::Wav { path } => match ClipBuffer::from_wav(path) {
                Ok(clip) => Some(Box::new(clip) as Box<dyn ClipSource>),
                Err(e) => {
                    tracing::error!("Clip slot {} left unbound: {}", i, e);
                    None
                }
            },
            ClipSlotConfig::Capture { device } => live_slot(i, device, config),
            ClipSlotConfig::Empty => None,
        })
        .collect()
}

#[cfg(feature = "capture")]
fn live_slot(_index: usize, device: &str, config: &Config) -> Option<Box<dyn ClipSource>> {
    Some(Box::new(crate::audio::LiveInput::new(device, &config.audio)))
}

#[cfg(not(feature = "capture"))]
fn live_slot(index: usize, device: &str, _config: &Config) -> Option<Box<dyn ClipSource>> {
    tracing::warn!(
        "Clip slot {} wants live input '{}' but capture support is not compiled in",
        index,
        device
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MorphTargets;
    use std::f32::consts::TAU;

    const RATE: u32 = 48000;

    fn tone(freq: f32, secs: f32) -> Vec<f32> {
        let len = (RATE as f32 * secs) as usize;
        (0..len)
            .map(|i| (TAU * freq * i as f32 / RATE as f32).sin() * 0.5)
            .collect()
    }

    fn mesh() -> MorphTargets {
        MorphTargets::new(vec!["kiss".into(), "closed".into(), "open".into()])
    }

    fn lipsync(clips: Vec<Vec<f32>>) -> Lipsync<MorphTargets> {
        let slots = clips
            .into_iter()
            .map(|s| Some(Box::new(ClipBuffer::new("tone", s, RATE)) as Box<dyn ClipSource>))
            .collect();
        let names = BlendshapeNames {
            kiss: "kiss".into(),
            lips_closed: "closed".into(),
            mouth_open: "open".into(),
        };
        Lipsync::new(
            &LipsyncConfig::default(),
            &names,
            PlaybackController::new(slots),
            mesh(),
        )
        .unwrap()
    }

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_idle_does_not_run() {
        let mut lipsync = lipsync(vec![tone(600.0, 1.0)]);
        assert!(lipsync.tick(FRAME).is_none());
        assert_eq!(lipsync.sink().weights(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_low_tone_opens_mouth() {
        // 600 Hz sits in the 500-700 Hz band
        let mut lipsync = lipsync(vec![tone(600.0, 1.0)]);
        lipsync.play(0).unwrap();

        let mut last = None;
        for _ in 0..20 {
            last = lipsync.tick(FRAME).or(last);
        }
        let weights = last.unwrap();
        assert!(weights.mouth_open > 50.0, "{:?}", weights);
        assert!(weights.lips_closed < 10.0, "{:?}", weights);
        assert_eq!(lipsync.sink().weight("open"), Some(weights.mouth_open));
    }

    #[test]
    fn test_high_tone_closes_lips() {
        // 4.5 kHz sits in the 3-6 kHz band
        let mut lipsync = lipsync(vec![tone(4500.0, 1.0)]);
        lipsync.play(0).unwrap();
        for _ in 0..20 {
            lipsync.tick(FRAME);
        }
        let weights = lipsync.session().current();
        assert!(weights.lips_closed > 90.0, "{:?}", weights);
        assert_eq!(weights.mouth_open, 0.0);
    }

    #[test]
    fn test_stop_freezes_pose() {
        let mut lipsync = lipsync(vec![tone(600.0, 1.0)]);
        lipsync.play(0).unwrap();
        for _ in 0..3 {
            lipsync.tick(FRAME);
        }
        let frozen = lipsync.session().current();
        assert_ne!(frozen, VisemeWeights::default());

        lipsync.stop_audio();
        assert!(!lipsync.is_playing());
        for _ in 0..5 {
            assert!(lipsync.tick(FRAME).is_none());
        }
        assert_eq!(lipsync.session().current(), frozen);
        assert_eq!(lipsync.sink().weight("open"), Some(frozen.mouth_open));
    }

    #[test]
    fn test_clip_end_stops_pipeline() {
        let mut lipsync = lipsync(vec![tone(600.0, 0.05)]);
        lipsync.play(0).unwrap();
        assert!(lipsync.tick(FRAME).is_some());
        for _ in 0..5 {
            lipsync.tick(FRAME);
        }
        assert!(!lipsync.is_playing());
        assert!(lipsync.tick(FRAME).is_none());
    }

    #[test]
    fn test_failed_play_skips_next_tick() {
        let mut lipsync = lipsync(vec![tone(600.0, 1.0)]);
        lipsync.play(0).unwrap();
        for _ in 0..3 {
            lipsync.tick(FRAME);
        }
        let before = lipsync.session().current();
        let mesh_before = lipsync.sink().weights().to_vec();

        assert!(lipsync.play(1).is_err());
        assert!(lipsync.is_playing());
        assert_eq!(lipsync.controller().selected(), 0);

        assert!(lipsync.tick(FRAME).is_none());
        assert_eq!(lipsync.session().current(), before);
        assert_eq!(lipsync.sink().weights(), mesh_before.as_slice());

        // One-shot: the still-running clip drives the following frame
        assert!(lipsync.tick(FRAME).is_some());
    }

    #[test]
    fn test_failed_play_is_noop() {
        let mut lipsync = lipsync(vec![tone(600.0, 1.0)]);
        assert!(lipsync.play(3).is_err());
        assert!(!lipsync.is_playing());
        assert!(lipsync.tick(FRAME).is_none());
    }

    #[test]
    fn test_build_slots_missing_wav_unbound() {
        let config = Config {
            clips: vec![
                ClipSlotConfig::Wav {
                    path: "/nonexistent/clip.wav".into(),
                },
                ClipSlotConfig::Empty,
            ],
            ..Config::default()
        };
        let slots = build_slots(&config);
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(Option::is_none));
    }
}
