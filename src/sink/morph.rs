//! In-memory morph target set.
//!
//! Stands in for a skinned mesh: a list of morph target names and one weight
//! per target. Hosts with a real mesh implement [`BlendShapeSink`] themselves.

use std::collections::HashMap;

use super::BlendShapeSink;
use crate::error::BindingError;
use crate::viseme::{MAX_WEIGHT, MIN_WEIGHT};

/// Named morph targets with their current weights
#[derive(Debug, Clone, Default)]
pub struct MorphTargets {
    names: Vec<String>,
    /// Morph target name -> index in `weights`
    name_to_index: HashMap<String, usize>,
    weights: Vec<f32>,
}

impl MorphTargets {
    /// Create a set from the model's morph target name list.
    ///
    /// A duplicated name resolves to its first occurrence.
    pub fn new(names: Vec<String>) -> Self {
        let mut name_to_index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            name_to_index.entry(name.clone()).or_insert(i);
        }
        Self {
            weights: vec![0.0; names.len()],
            name_to_index,
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Current weight of a named target
    pub fn weight(&self, name: &str) -> Option<f32> {
        self.name_to_index.get(name).map(|&i| self.weights[i])
    }

    /// (name, weight) pairs in mesh order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }
}

impl BlendShapeSink for MorphTargets {
    fn resolve_index(&self, name: &str) -> Result<usize, BindingError> {
        self.name_to_index
            .get(name)
            .copied()
            .ok_or_else(|| BindingError::NotFound(name.to_string()))
    }

    fn set_weight(&mut self, index: usize, weight: f32) {
        match self.weights.get_mut(index) {
            Some(slot) => {
                *slot = if weight.is_nan() {
                    MIN_WEIGHT
                } else {
                    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
                }
            }
            None => tracing::trace!(
                "Ignoring weight for blendshape index {} ({} targets)",
                index,
                self.weights.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let mesh = MorphTargets::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(mesh.resolve_index("a"), Ok(0));
        assert_eq!(mesh.resolve_index("b"), Ok(1));
        assert_eq!(
            mesh.resolve_index("c"),
            Err(BindingError::NotFound("c".to_string()))
        );
    }

    #[test]
    fn test_set_weight_clamps() {
        let mut mesh = MorphTargets::new(vec!["a".into(), "b".into()]);
        mesh.set_weight(0, 140.0);
        mesh.set_weight(1, -3.0);
        assert_eq!(mesh.weights(), &[100.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        // Fallback indices may point past a small mesh
        let mut mesh = MorphTargets::new(vec!["a".into()]);
        mesh.set_weight(2, 50.0);
        assert_eq!(mesh.weights(), &[0.0]);
    }

    #[test]
    fn test_iter() {
        let mut mesh = MorphTargets::new(vec!["a".into(), "b".into()]);
        mesh.set_weight(1, 25.0);
        let pairs: Vec<(&str, f32)> = mesh.iter().collect();
        assert_eq!(pairs, vec![("a", 0.0), ("b", 25.0)]);
    }
}
