//! Viseme weights
//!
//! Three mouth channels driven from band energies: pucker ("kiss"),
//! lips closed, and mouth open. Weights live on the 0-100 blendshape scale.

pub mod estimator;
pub mod smoother;

pub use estimator::VisemeEstimator;
pub use smoother::MotionSmoother;

use serde::{Deserialize, Serialize};

/// Lowest blendshape weight
pub const MIN_WEIGHT: f32 = 0.0;
/// Highest blendshape weight
pub const MAX_WEIGHT: f32 = 100.0;

/// A semantic mouth channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisemeChannel {
    Kiss,
    LipsClosed,
    MouthOpen,
}

impl VisemeChannel {
    pub const ALL: [VisemeChannel; 3] = [Self::Kiss, Self::LipsClosed, Self::MouthOpen];

    /// Mesh index used when the channel name cannot be resolved
    pub fn default_index(self) -> usize {
        match self {
            Self::Kiss => 0,
            Self::LipsClosed => 1,
            Self::MouthOpen => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kiss => "kiss",
            Self::LipsClosed => "lips_closed",
            Self::MouthOpen => "mouth_open",
        }
    }
}

impl std::fmt::Display for VisemeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weight per mouth channel, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VisemeWeights {
    pub kiss: f32,
    pub lips_closed: f32,
    pub mouth_open: f32,
}

impl VisemeWeights {
    pub fn new(kiss: f32, lips_closed: f32, mouth_open: f32) -> Self {
        Self {
            kiss,
            lips_closed,
            mouth_open,
        }
    }

    pub fn get(&self, channel: VisemeChannel) -> f32 {
        match channel {
            VisemeChannel::Kiss => self.kiss,
            VisemeChannel::LipsClosed => self.lips_closed,
            VisemeChannel::MouthOpen => self.mouth_open,
        }
    }

    pub fn get_mut(&mut self, channel: VisemeChannel) -> &mut f32 {
        match channel {
            VisemeChannel::Kiss => &mut self.kiss,
            VisemeChannel::LipsClosed => &mut self.lips_closed,
            VisemeChannel::MouthOpen => &mut self.mouth_open,
        }
    }

    /// [kiss, lips_closed, mouth_open]
    pub fn as_array(&self) -> [f32; 3] {
        [self.kiss, self.lips_closed, self.mouth_open]
    }

    /// Copy with every channel clamped to [0, 100]; NaN becomes 0
    pub fn clamped(mut self) -> Self {
        for channel in VisemeChannel::ALL {
            let value = self.get_mut(channel);
            *value = if value.is_nan() {
                MIN_WEIGHT
            } else {
                value.clamp(MIN_WEIGHT, MAX_WEIGHT)
            };
        }
        self
    }
}
