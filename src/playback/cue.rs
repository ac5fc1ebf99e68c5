//! Timed playback triggers

use std::time::Duration;

use crate::config::CueConfig;

/// A `Play(slot)` request scheduled at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub at: Duration,
    pub slot: usize,
}

/// Fires each cue once, in time order, as the clock passes it.
#[derive(Debug, Clone, Default)]
pub struct CueSchedule {
    cues: Vec<Cue>,
    next: usize,
    elapsed: Duration,
}

impl CueSchedule {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        // Stable: cues at the same instant keep their configured order
        cues.sort_by_key(|c| c.at);
        Self {
            cues,
            next: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Build from config entries. A cue time that is not a valid duration
    /// is dropped with a warning.
    pub fn from_config(cues: &[CueConfig]) -> Self {
        Self::new(
            cues.iter()
                .filter_map(|c| match Duration::try_from_secs_f64(c.at_secs) {
                    Ok(at) => Some(Cue { at, slot: c.slot }),
                    Err(e) => {
                        tracing::warn!("Dropping cue for slot {} at {}s: {}", c.slot, c.at_secs, e);
                        None
                    }
                })
                .collect(),
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Cues not yet fired
    pub fn pending(&self) -> usize {
        self.cues.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    /// Advance the clock and return the slots whose cue time has passed.
    ///
    /// A cue fires once the clock is strictly past its time.
    pub fn advance(&mut self, dt: Duration) -> Vec<usize> {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut due = Vec::new();
        while let Some(cue) = self.cues.get(self.next) {
            if cue.at >= self.elapsed {
                break;
            }
            due.push(cue.slot);
            self.next += 1;
        }
        due
    }
}
