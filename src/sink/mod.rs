//! Blendshape output
//!
//! The pipeline writes its three smoothed weights through a [`BlendShapeSink`],
//! the capability a host mesh exposes: name lookup plus per-index weight writes.

pub mod morph;

pub use morph::MorphTargets;

use crate::config::BlendshapeNames;
use crate::error::BindingError;
use crate::viseme::{VisemeChannel, VisemeWeights};

/// A mesh that accepts blendshape weights in [0, 100]
pub trait BlendShapeSink {
    /// Look up a blendshape index by name
    fn resolve_index(&self, name: &str) -> Result<usize, BindingError>;

    /// Set one blendshape weight
    fn set_weight(&mut self, index: usize, weight: f32);
}

impl<T: BlendShapeSink + ?Sized> BlendShapeSink for &mut T {
    fn resolve_index(&self, name: &str) -> Result<usize, BindingError> {
        (**self).resolve_index(name)
    }

    fn set_weight(&mut self, index: usize, weight: f32) {
        (**self).set_weight(index, weight)
    }
}

/// Mesh indices for the three mouth channels, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendShapeBinding {
    indices: [usize; 3],
}

impl Default for BlendShapeBinding {
    fn default() -> Self {
        Self {
            indices: VisemeChannel::ALL.map(VisemeChannel::default_index),
        }
    }
}

impl BlendShapeBinding {
    /// Resolve the configured names against `sink`.
    ///
    /// A channel whose name is empty or missing from the mesh keeps its
    /// default index (0, 1, 2) and only logs a warning.
    pub fn resolve<S: BlendShapeSink + ?Sized>(sink: &S, names: &BlendshapeNames) -> Self {
        let mut binding = Self::default();

        for (slot, channel) in binding.indices.iter_mut().zip(VisemeChannel::ALL) {
            match resolve_channel(sink, channel, names) {
                Ok(index) => {
                    tracing::debug!("Bound {} to blendshape index {}", channel, index);
                    *slot = index;
                }
                Err(BindingError::EmptyName(_)) => {
                    tracing::debug!(
                        "No blendshape name for {}, using default index {}",
                        channel,
                        slot
                    );
                }
                Err(e) => {
                    tracing::warn!("{}; using default index {} for {}", e, slot, channel);
                }
            }
        }

        binding
    }

    pub fn index(&self, channel: VisemeChannel) -> usize {
        match channel {
            VisemeChannel::Kiss => self.indices[0],
            VisemeChannel::LipsClosed => self.indices[1],
            VisemeChannel::MouthOpen => self.indices[2],
        }
    }

    /// Write all three weights to the sink
    pub fn apply<S: BlendShapeSink + ?Sized>(&self, sink: &mut S, weights: &VisemeWeights) {
        for channel in VisemeChannel::ALL {
            sink.set_weight(self.index(channel), weights.get(channel));
        }
    }
}

fn resolve_channel<S: BlendShapeSink + ?Sized>(
    sink: &S,
    channel: VisemeChannel,
    names: &BlendshapeNames,
) -> Result<usize, BindingError> {
    let name = match channel {
        VisemeChannel::Kiss => &names.kiss,
        VisemeChannel::LipsClosed => &names.lips_closed,
        VisemeChannel::MouthOpen => &names.mouth_open,
    };
    if name.trim().is_empty() {
        return Err(BindingError::EmptyName(channel.to_string()));
    }
    sink.resolve_index(name)
}
