//! Clip slot selection and playback gating

use std::time::Duration;

use super::ClipSource;
use crate::error::PlaybackError;

/// A fixed, ordered set of clip slots with one selected slot.
///
/// Only the selected slot drives lipsync; starting another slot stops it.
#[derive(Default)]
pub struct PlaybackController {
    slots: Vec<Option<Box<dyn ClipSource>>>,
    selected: usize,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("slots", &self.slots.len())
            .field("selected", &self.selected)
            .field("active", &self.is_active())
            .finish()
    }
}

impl PlaybackController {
    /// Create a controller over the given slots (`None` = unbound)
    pub fn new(slots: Vec<Option<Box<dyn ClipSource>>>) -> Self {
        Self { slots, selected: 0 }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the selected slot
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Start the clip in `slot`.
    ///
    /// On failure nothing changes: the previous selection keeps playing and
    /// the error is logged and returned.
    pub fn play(&mut self, slot: usize) -> Result<(), PlaybackError> {
        let result = self.try_play(slot);
        if let Err(ref e) = result {
            tracing::error!("Play({}) ignored: {}", slot, e);
        }
        result
    }

    fn try_play(&mut self, slot: usize) -> Result<(), PlaybackError> {
        let len = self.slots.len();
        let source = self
            .slots
            .get_mut(slot)
            .ok_or(PlaybackError::SlotOutOfRange { slot, len })?
            .as_mut()
            .ok_or(PlaybackError::UnboundSlot(slot))?;

        if !source.has_clip() {
            return Err(PlaybackError::MissingClip(slot));
        }

        source.play().map_err(|e| PlaybackError::Start {
            slot,
            reason: e.to_string(),
        })?;

        if self.selected != slot {
            if let Some(Some(previous)) = self.slots.get_mut(self.selected) {
                previous.stop();
            }
            self.selected = slot;
        }

        tracing::info!("Playing clip slot {}", slot);
        Ok(())
    }

    /// Stop the selected slot if it is playing
    pub fn stop_audio(&mut self) {
        if let Some(source) = self.active_source_mut() {
            source.stop();
            tracing::info!("Stopped clip slot {}", self.selected);
        }
    }

    /// Whether the selected slot is playing
    pub fn is_active(&self) -> bool {
        matches!(self.slots.get(self.selected), Some(Some(source)) if source.is_playing())
    }

    /// Advance the selected slot's play head
    pub fn advance(&mut self, dt: Duration) {
        if let Some(Some(source)) = self.slots.get_mut(self.selected) {
            source.advance(dt);
        }
    }

    /// The selected slot, if it is playing
    pub fn active_source_mut(&mut self) -> Option<&mut (dyn ClipSource + 'static)> {
        match self.slots.get_mut(self.selected) {
            Some(Some(source)) if source.is_playing() => Some(source.as_mut()),
            _ => None,
        }
    }
}
