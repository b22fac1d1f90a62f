//! Shared fixtures: an in-memory wire that one link drives and another reads.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use askwire::consts::{FRAME_OVERHEAD, PREAMBLE_LEN, SAMPLES_PER_BIT, SYMBOL_BITS};
use askwire::{Link, LinkConfig};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A logic line. Clones share the same level.
#[derive(Debug, Clone, Default)]
pub struct Wire(Arc<AtomicBool>);

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl ErrorType for Wire {
    type Error = Infallible;
}

impl OutputPin for Wire {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl InputPin for Wire {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

pub type WireLink = Link<Wire, Wire, Wire>;

/// A transmitter and a receiver joined by one wire. Each has its own quiet
/// line for the direction it does not use.
pub fn pair(config: LinkConfig) -> (WireLink, WireLink) {
    let air = Wire::new();
    let sender = Link::new(air.clone(), Wire::new(), None, config).unwrap();
    let receiver = Link::new(Wire::new(), air, None, config).unwrap();
    (sender, receiver)
}

/// A link whose transmitter is wired to its own receiver.
pub fn looped(config: LinkConfig) -> WireLink {
    let air = Wire::new();
    Link::new(air.clone(), air, None, config).unwrap()
}

/// Sample ticks needed to send a payload of `len` bytes, with some slack.
pub fn ticks_for(len: usize) -> u32 {
    let symbols = usize::from(PREAMBLE_LEN) + 2 * (len + usize::from(FRAME_OVERHEAD));
    let ticks = symbols * usize::from(SYMBOL_BITS) * usize::from(SAMPLES_PER_BIT);
    u32::try_from(ticks).unwrap() + 4 * u32::from(SAMPLES_PER_BIT)
}

/// Runs `ticks` combined ticks on every link, in step.
pub fn run(links: &[&WireLink], ticks: u32) {
    for _ in 0..ticks {
        for link in links {
            link.tick();
        }
    }
}
