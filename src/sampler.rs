//! Ramp clock recovery for the receive line.
//!
//! The receiver shares no clock with the transmitter, so bit boundaries are
//! inferred from the transitions it observes. The [`Sampler`] is called at
//! [`SAMPLES_PER_BIT`](crate::consts::SAMPLES_PER_BIT) times the bit rate and
//! runs a small software PLL:
//!
//! - a ramp counts through a 160-unit window, one window per bit
//! - every sample without a transition advances it by 20 (160 / 8)
//! - a transition in the first half of the window advances it by only 11,
//!   delaying the next boundary
//! - a transition in the second half advances it by 29, pulling the next
//!   boundary earlier
//!
//! This early/late loop drives the window boundary onto the transmitter's
//! edges during the training preamble and keeps it there. An integrator counts
//! the high samples of each window; when the ramp wraps, the bit is read as a 1
//! if at least 5 samples were high.
//!
//! Until the first edge the sampler is hunting and emits nothing. If no edge is
//! seen for [`LOCK_TIMEOUT_TICKS`](crate::consts::LOCK_TIMEOUT_TICKS) samples
//! it reports [`Recovered::LockLost`] and hunts again.

use crate::consts::{
    INTEGRATOR_THRESHOLD, LOCK_TIMEOUT_TICKS, RAMP_INC, RAMP_INC_ADVANCE, RAMP_INC_RETARD,
    RAMP_LEN, RAMP_TRANSITION,
};

/// What the sampler produced on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Recovered {
    /// A complete bit window elapsed; this is its level.
    Bit(bool),
    /// The line went quiet and the sampler is hunting again.
    LockLost,
}

/// Ramp state for one receive line.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    /// Phase position within the current bit window, `0..RAMP_LEN`.
    ramp: u16,

    /// High samples seen in the current window.
    integrator: u8,

    /// Previous sample, for edge detection.
    last_sample: bool,

    /// Whether an edge has seeded the ramp.
    locked: bool,

    /// Samples since the last edge.
    quiet: u16,
}

impl Sampler {
    /// Creates a sampler in the hunting state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops lock and clears the ramp.
    ///
    /// The last line level is kept so a level already present is not mistaken
    /// for an edge.
    pub fn reset(&mut self) {
        self.ramp = 0;
        self.integrator = 0;
        self.locked = false;
        self.quiet = 0;
    }

    /// Whether the sampler has locked onto an edge and is emitting bits.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Current ramp phase.
    pub fn ramp(&self) -> u16 {
        self.ramp
    }

    /// Processes one line sample (already corrected for inversion).
    pub fn sample(&mut self, level: bool) -> Option<Recovered> {
        let transition = level != self.last_sample;
        self.last_sample = level;

        if !self.locked {
            if transition {
                // Treat the edge as the first sample of a new window.
                self.locked = true;
                self.ramp = RAMP_INC;
                self.integrator = u8::from(level);
                self.quiet = 0;
                trace!("sampler locked");
            }
            return None;
        }

        if level {
            self.integrator = self.integrator.saturating_add(1);
        }

        if transition {
            self.quiet = 0;
            self.ramp += if self.ramp < RAMP_TRANSITION {
                RAMP_INC_RETARD
            } else {
                RAMP_INC_ADVANCE
            };
        } else {
            self.quiet += 1;
            if self.quiet >= LOCK_TIMEOUT_TICKS {
                self.reset();
                return Some(Recovered::LockLost);
            }
            self.ramp += RAMP_INC;
        }

        if self.ramp >= RAMP_LEN {
            self.ramp -= RAMP_LEN;
            let bit = self.integrator >= INTEGRATOR_THRESHOLD;
            self.integrator = 0;
            return Some(Recovered::Bit(bit));
        }
        None
    }
}
