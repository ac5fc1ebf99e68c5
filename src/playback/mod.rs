//! Clip playback module
//!
//! Clip slots, the controller that gates lipsync on the selected slot, and
//! timed cues that trigger playback.

pub mod clip;
pub mod controller;
pub mod cue;
pub mod source;

pub use clip::ClipBuffer;
pub use controller::PlaybackController;
pub use cue::{Cue, CueSchedule};
pub use source::ClipSource;
