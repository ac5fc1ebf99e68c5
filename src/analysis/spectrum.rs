//! Magnitude spectrum snapshots
//!
//! [`SpectrumAnalyzer`] turns the most recent block of clip samples into a
//! fixed-size magnitude spectrum covering 0 Hz up to Nyquist, the same shape
//! of snapshot a game engine's audio source would hand out once per frame.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::sync::Arc;

/// One per-tick magnitude spectrum.
///
/// Bin `k` of `N` covers `k * (sample_rate / 2) / N` Hz.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumFrame<'a> {
    magnitudes: &'a [f32],
    sample_rate: u32,
}

impl<'a> SpectrumFrame<'a> {
    pub fn new(magnitudes: &'a [f32], sample_rate: u32) -> Self {
        Self {
            magnitudes,
            sample_rate,
        }
    }

    pub fn magnitudes(&self) -> &'a [f32] {
        self.magnitudes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Analysis window applied before the FFT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Rectangular,
    Hann,
    Blackman,
    #[default]
    BlackmanHarris,
}

impl WindowKind {
    /// Window coefficients for a block of `len` samples
    pub fn coefficients(self, len: usize) -> Vec<f32> {
        if len == 0 {
            return Vec::new();
        }
        let denom = len.saturating_sub(1).max(1) as f32;
        (0..len)
            .map(|n| {
                let phase = n as f32 * TAU / denom;
                match self {
                    Self::Rectangular => 1.0,
                    Self::Hann => 0.5 * (1.0 - phase.cos()),
                    Self::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                    Self::BlackmanHarris => {
                        0.35875 - 0.48829 * phase.cos() + 0.14128 * (2.0 * phase).cos()
                            - 0.01168 * (3.0 * phase).cos()
                    }
                }
            })
            .collect()
    }
}

/// Windowed FFT producing `bins` magnitudes from `2 * bins` samples.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// 2 / sum(window), so a full-scale sine peaks near 1.0
    scale: f32,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer emitting `bins` magnitudes per snapshot
    pub fn new(bins: usize, window: WindowKind) -> Self {
        let block = bins * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(block);
        let scratch_len = fft.get_inplace_scratch_len();

        let window = window.coefficients(block);
        let window_sum: f32 = window.iter().sum();
        let scale = if window_sum > 0.0 { 2.0 / window_sum } else { 0.0 };

        tracing::debug!("SpectrumAnalyzer created: bins={}, block={}", bins, block);

        Self {
            fft,
            window,
            scale,
            fft_buffer: vec![Complex::new(0.0, 0.0); block],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; bins],
        }
    }

    /// Number of magnitude bins per snapshot
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Number of time-domain samples consumed per snapshot
    pub fn block_len(&self) -> usize {
        self.window.len()
    }

    /// Compute the magnitude spectrum of the newest `block_len()` samples.
    ///
    /// Shorter input is zero padded at the front; non-finite samples count as silence.
    pub fn analyze(&mut self, samples: &[f32]) -> &[f32] {
        let block = self.block_len();
        let take = samples.len().min(block);
        let pad = block - take;
        let recent = &samples[samples.len() - take..];

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.fft_buffer) {
            *magnitude = bin.norm() * self.scale;
        }

        &self.magnitudes
    }

    /// Analyze and wrap the result as a frame at `sample_rate`
    pub fn frame(&mut self, samples: &[f32], sample_rate: u32) -> SpectrumFrame<'_> {
        SpectrumFrame::new(self.analyze(samples), sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * freq * i as f32 / sample_rate as f32).sin() * amplitude)
            .collect()
    }

    fn peak_bin(magnitudes: &[f32]) -> usize {
        magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_silence() {
        let mut analyzer = SpectrumAnalyzer::new(256, WindowKind::BlackmanHarris);
        let spectrum = analyzer.analyze(&vec![0.0; 512]);
        assert_eq!(spectrum.len(), 256);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peak_lands_in_expected_bin() {
        let mut analyzer = SpectrumAnalyzer::new(256, WindowKind::BlackmanHarris);
        // 48 kHz / 512 = 93.75 Hz per bin; bin 20 = 1875 Hz
        let samples = sine(1875.0, 48000, 512, 1.0);
        let spectrum = analyzer.analyze(&samples);
        assert_eq!(peak_bin(spectrum), 20);
        assert!(spectrum[20] > 0.5 && spectrum[20] < 1.5, "peak {}", spectrum[20]);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyzer = SpectrumAnalyzer::new(64, WindowKind::Hann);
        let samples = sine(3000.0, 16000, 40, 0.5);
        let spectrum = analyzer.analyze(&samples);
        assert_eq!(spectrum.len(), 64);
        assert!(spectrum.iter().all(|m| m.is_finite() && *m >= 0.0));
    }

    #[test]
    fn test_uses_most_recent_samples() {
        let mut analyzer = SpectrumAnalyzer::new(64, WindowKind::Rectangular);
        let mut samples = sine(4000.0, 16000, 128, 1.0);
        samples.extend(vec![0.0; 128]);
        let spectrum = analyzer.analyze(&samples);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let mut analyzer = SpectrumAnalyzer::new(64, WindowKind::Blackman);
        let samples = vec![f32::NAN; 128];
        let spectrum = analyzer.analyze(&samples);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_window_shapes() {
        for kind in [
            WindowKind::Rectangular,
            WindowKind::Hann,
            WindowKind::Blackman,
            WindowKind::BlackmanHarris,
        ] {
            let w = kind.coefficients(33);
            assert_eq!(w.len(), 33);
            // Symmetric, peaks at the centre
            assert!((w[0] - w[32]).abs() < 1e-5);
            assert!((w[16] - 1.0).abs() < 1e-3, "{:?} centre {}", kind, w[16]);
        }
    }
}
