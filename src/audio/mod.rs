//! Live audio input
//!
//! Microphone capture exposed as a clip slot, so a live voice can drive the
//! same lipsync pipeline as a recorded clip.

pub mod capture;

pub use capture::{default_input_device_name, list_input_devices, LiveInput};
