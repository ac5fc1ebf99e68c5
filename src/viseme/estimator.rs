//! Heuristic viseme model: band energies to target mouth weights

use crate::analysis::BandEnergy;

use super::{VisemeWeights, MAX_WEIGHT};

/// Default minimum speech-band total before normalization
pub const DEFAULT_VOLUME_THRESHOLD: f32 = 1e-4;

/// Below this low-band share the pucker is faded out
const KISS_DAMPEN_BELOW: f32 = 0.2;

/// Maps band energies to target weights. Stateless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisemeEstimator {
    volume_threshold: f32,
}

impl Default for VisemeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_THRESHOLD)
    }
}

impl VisemeEstimator {
    pub fn new(volume_threshold: f32) -> Self {
        Self { volume_threshold }
    }

    pub fn volume_threshold(&self) -> f32 {
        self.volume_threshold
    }

    /// Rescale the speech bands to sum to 1 when above the volume threshold.
    ///
    /// Returns (low, mid, high). Quiet input is passed through untouched.
    pub fn normalize(&self, energy: &BandEnergy) -> (f32, f32, f32) {
        let (low, mid, high) = (energy.low(), energy.mid(), energy.high());
        let total = low + mid + high;
        if total > self.volume_threshold {
            let scale = 1.0 / total;
            (low * scale, mid * scale, high * scale)
        } else {
            (low, mid, high)
        }
    }

    /// Target weights for one tick
    pub fn estimate(&self, energy: &BandEnergy) -> VisemeWeights {
        let (low, mid, high) = self.normalize(energy);

        let mut kiss = (0.5 - mid) * 2.0;
        if low < KISS_DAMPEN_BELOW {
            kiss *= low * 5.0;
        }

        let lips_closed = high * 3.0;
        let mouth_open = low * 0.8 - high * 0.8;

        VisemeWeights::new(
            to_weight(kiss),
            to_weight(lips_closed),
            to_weight(mouth_open),
        )
    }
}

/// Clamp a unit value to [0, 1] and scale to the blendshape range
fn to_weight(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0) * MAX_WEIGHT
}
