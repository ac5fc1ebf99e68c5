//! Frequency bands and per-band energy extraction

use crate::config::validate_pitch;
use crate::error::ConfigError;

use super::SpectrumFrame;

/// Band boundaries in Hz for a pitch factor of 1.0.
///
/// Bands: sub-speech (0-500), low speech (500-700), mid (700-3000), high (3000-6000).
pub const REFERENCE_BOUNDARIES_HZ: [f32; 5] = [0.0, 500.0, 700.0, 3000.0, 6000.0];

/// Number of analysis bands
pub const BAND_COUNT: usize = REFERENCE_BOUNDARIES_HZ.len() - 1;

/// Pitch-scaled band boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBands {
    pitch: f32,
    boundaries: [f32; 5],
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            boundaries: REFERENCE_BOUNDARIES_HZ,
        }
    }
}

impl FrequencyBands {
    /// Scale the reference boundaries by `pitch` (must be finite and > 0)
    pub fn from_pitch(pitch: f32) -> Result<Self, ConfigError> {
        validate_pitch(pitch)?;
        Ok(Self {
            pitch,
            boundaries: REFERENCE_BOUNDARIES_HZ.map(|hz| hz * pitch),
        })
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn boundaries(&self) -> &[f32; 5] {
        &self.boundaries
    }

    /// (low, high) Hz for each band
    pub fn ranges(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.boundaries.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Average positive magnitude per band.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergy(pub [f32; BAND_COUNT]);

impl BandEnergy {
    pub fn values(&self) -> &[f32; BAND_COUNT] {
        &self.0
    }

    /// 500-700 Hz at pitch 1.0
    pub fn low(&self) -> f32 {
        self.0[1]
    }

    /// 700-3000 Hz at pitch 1.0
    pub fn mid(&self) -> f32 {
        self.0[2]
    }

    /// 3000-6000 Hz at pitch 1.0
    pub fn high(&self) -> f32 {
        self.0[3]
    }

    /// Sum of the three speech bands
    pub fn speech_total(&self) -> f32 {
        self.low() + self.mid() + self.high()
    }
}

/// Map a frequency to a spectrum bin index over the Nyquist range.
///
/// Halves round to even, and the result is clamped to `[0, bins]`.
pub fn bin_index(hz: f32, bins: usize, sample_rate: u32) -> usize {
    if bins == 0 || sample_rate == 0 {
        return 0;
    }
    let nyquist = sample_rate as f32 / 2.0;
    let index = (hz * bins as f32 / nyquist).round_ties_even();
    if index.is_nan() || index <= 0.0 {
        0
    } else {
        (index as usize).min(bins)
    }
}

/// Average the clamped-positive magnitudes falling in each band.
///
/// An empty index range yields 0 for that band.
pub fn band_energies(frame: &SpectrumFrame<'_>, bands: &FrequencyBands) -> BandEnergy {
    let magnitudes = frame.magnitudes();
    let bins = magnitudes.len();
    let mut energy = [0.0f32; BAND_COUNT];

    for (slot, (low_hz, high_hz)) in energy.iter_mut().zip(bands.ranges()) {
        let start = bin_index(low_hz, bins, frame.sample_rate());
        let end = bin_index(high_hz, bins, frame.sample_rate());
        if end <= start {
            continue;
        }

        let sum: f32 = magnitudes[start..end].iter().map(|m| m.max(0.0)).sum();
        *slot = sum / (end - start) as f32;
    }

    BandEnergy(energy)
}
