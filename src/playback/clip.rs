//! In-memory audio clips

use std::path::Path;
use std::time::Duration;

use super::ClipSource;
use crate::error::AudioError;

/// A mono PCM clip with a simulated play head.
///
/// The play head advances with frame time, so analysis always sees the audio
/// that would be coming out of the speakers at that moment.
#[derive(Debug, Clone)]
pub struct ClipBuffer {
    name: String,
    samples: Vec<f32>,
    sample_rate: u32,
    /// Fractional sample position of the play head
    position: f64,
    playing: bool,
}

impl ClipBuffer {
    /// Wrap mono samples in [-1, 1]
    pub fn new(name: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            samples,
            sample_rate,
            position: 0.0,
            playing: false,
        }
    }

    /// Decode a WAV file, downmixing to mono
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let decode_err = |e: hound::Error| AudioError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let mut reader = hound::WavReader::open(path).map_err(decode_err)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(decode_err)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .map_err(decode_err)?
            }
        };

        let samples = downmix(&interleaved, channels);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!(
            "Loaded clip '{}': {} Hz, {} channel(s), {:.2}s",
            name,
            spec.sample_rate,
            channels,
            samples.len() as f64 / spec.sample_rate.max(1) as f64
        );

        Ok(Self::new(name, samples, spec.sample_rate))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Total clip length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Play head position in samples
    pub fn position(&self) -> usize {
        self.position as usize
    }
}

impl ClipSource for ClipBuffer {
    fn has_clip(&self) -> bool {
        !self.samples.is_empty() && self.sample_rate > 0
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.position = 0.0;
        self.playing = self.has_clip();
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, dt: Duration) {
        if !self.playing {
            return;
        }
        self.position += dt.as_secs_f64() * self.sample_rate as f64;
        if self.position >= self.samples.len() as f64 {
            self.position = self.samples.len() as f64;
            self.playing = false;
            tracing::debug!("Clip '{}' finished", self.name);
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn recent_samples(&mut self, out: &mut [f32]) -> bool {
        if !self.playing {
            return false;
        }
        let end = self.position().min(self.samples.len());
        let take = end.min(out.len());
        let pad = out.len() - take;

        out[..pad].fill(0.0);
        out[pad..].copy_from_slice(&self.samples[end - take..end]);
        true
    }
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
