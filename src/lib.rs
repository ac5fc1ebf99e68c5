//! Fushigi3D Lipsync - spectrum-driven mouth animation
//!
//! Turns the frequency spectrum of a playing voice clip into three smoothed
//! mouth blendshape weights:
//! - Band energies from a per-frame magnitude spectrum (pitch-scaled bands)
//! - A heuristic viseme model for pucker, lips-closed and mouth-open targets
//! - Rate-limited smoothing so the mouth never jitters or overshoots
//!
//! Everything runs synchronously on the caller's frame clock; call
//! [`Lipsync::tick`] once per animation frame.

pub mod analysis;
#[cfg(feature = "capture")]
pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod playback;
pub mod session;
pub mod sink;
pub mod viseme;

pub use config::Config;
pub use driver::Lipsync;
pub use error::{LipsyncError, Result};
pub use session::LipsyncSession;
pub use sink::{BlendShapeBinding, BlendShapeSink, MorphTargets};
pub use viseme::{VisemeChannel, VisemeWeights};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
