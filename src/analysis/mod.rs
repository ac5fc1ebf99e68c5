//! Spectrum analysis module
//!
//! Produces magnitude-spectrum snapshots and reduces them to per-band energies.

pub mod bands;
pub mod spectrum;

pub use bands::{band_energies, bin_index, BandEnergy, FrequencyBands, REFERENCE_BOUNDARIES_HZ};
pub use spectrum::{SpectrumAnalyzer, SpectrumFrame, WindowKind};
