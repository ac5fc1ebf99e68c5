//! Per-character lipsync state
//!
//! One [`LipsyncSession`] per animated character. It owns the pitch-scaled
//! bands, the smoothed mouth pose and the mesh binding; nothing is shared
//! between sessions.

use crate::analysis::{band_energies, BandEnergy, FrequencyBands, SpectrumFrame};
use crate::config::LipsyncConfig;
use crate::error::ConfigError;
use crate::sink::{BlendShapeBinding, BlendShapeSink};
use crate::viseme::{MotionSmoother, VisemeEstimator, VisemeWeights};

#[derive(Debug, Clone)]
pub struct LipsyncSession {
    bands: FrequencyBands,
    estimator: VisemeEstimator,
    smoother: MotionSmoother,
    binding: BlendShapeBinding,
    last_energy: BandEnergy,
    last_target: VisemeWeights,
}

impl LipsyncSession {
    pub fn new(config: &LipsyncConfig, binding: BlendShapeBinding) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            bands: FrequencyBands::from_pitch(config.pitch)?,
            estimator: VisemeEstimator::new(config.volume_threshold),
            smoother: MotionSmoother::new(config.max_lip_speed),
            binding,
            last_energy: BandEnergy::default(),
            last_target: VisemeWeights::default(),
        })
    }

    /// Start from a given mouth pose instead of neutral
    pub fn with_pose(mut self, pose: VisemeWeights) -> Self {
        self.smoother.reset(pose);
        self
    }

    /// Rescale the analysis bands. An invalid pitch keeps the current bands.
    pub fn set_pitch(&mut self, pitch: f32) -> Result<(), ConfigError> {
        self.bands = FrequencyBands::from_pitch(pitch)?;
        tracing::debug!("Lipsync pitch set to {}: {:?}", pitch, self.bands.boundaries());
        Ok(())
    }

    pub fn pitch(&self) -> f32 {
        self.bands.pitch()
    }

    pub fn bands(&self) -> &FrequencyBands {
        &self.bands
    }

    pub fn binding(&self) -> &BlendShapeBinding {
        &self.binding
    }

    /// Run one pipeline pass on a spectrum snapshot and return the smoothed pose
    pub fn tick(&mut self, frame: &SpectrumFrame<'_>) -> VisemeWeights {
        self.last_energy = band_energies(frame, &self.bands);
        self.last_target = self.estimator.estimate(&self.last_energy);
        let current = self.smoother.step(&self.last_target);

        tracing::trace!(
            "energy={:?} target={:?} current={:?}",
            self.last_energy.values(),
            self.last_target.as_array(),
            current.as_array()
        );

        current
    }

    /// Write the smoothed pose to a mesh
    pub fn apply<S: BlendShapeSink + ?Sized>(&self, sink: &mut S) {
        self.binding.apply(sink, &self.smoother.current());
    }

    /// Smoothed pose after the last tick
    pub fn current(&self) -> VisemeWeights {
        self.smoother.current()
    }

    /// Unsmoothed target from the last tick
    pub fn target(&self) -> VisemeWeights {
        self.last_target
    }

    /// Band energies from the last tick
    pub fn energy(&self) -> BandEnergy {
        self.last_energy
    }
}
