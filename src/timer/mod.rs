//! Tick timing and scheduling glue for the link.
//!
//! The link needs two periodic calls: [`Link::rx_tick`](crate::link::Link::rx_tick)
//! at eight times the bit rate and [`Link::tx_tick`](crate::link::Link::tx_tick)
//! at the bit rate, or a single [`Link::tick`](crate::link::Link::tick) at the
//! sample rate that drives both. They can be scheduled two ways: from a timer
//! interrupt through a `critical_section` protected global (`timer-isr`
//! feature), or from a blocking delay loop (`delay-loop` feature).
//!
//! Contains:
//! - [`Timing`]: bit and sample periods derived from a bit rate
//! - [`compute_compare_values`]: CTC compare values for a hardware timer
//! - `run_tick_loop` / `run_ticks`: blocking drivers (feature `delay-loop`)
//! - `global_link_*` and `tick_link!()`: interrupt glue (feature `timer-isr`)
//!
//! Timer counts per sample tick at 2000 bps (16 kHz sample rate):
//!
//! | F_CPU  | PRESCALER | Sample compare | Bit compare |
//! |--------|-----------|----------------|-------------|
//! | 16 MHz |         1 |           1000 |        8000 |
//! | 16 MHz |         8 |            125 |        1000 |
//! |  8 MHz |         8 |             63 |         500 |
//! | 72 MHz |        64 |             70 |         563 |

use libm::round;

use crate::consts::SAMPLES_PER_BIT;
use crate::error::LinkError;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Tick periods for a bit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Timing {
    /// Bits per second.
    pub bit_rate: u16,
    /// Period of the transmit tick, in nanoseconds.
    pub bit_period_ns: u32,
    /// Period of the receive sampling tick, in nanoseconds.
    pub sample_period_ns: u32,
}

impl Timing {
    /// Derives both tick periods from `bit_rate`.
    ///
    /// # Errors
    /// [`LinkError::InvalidBitRate`] for a rate of zero.
    pub fn from_bit_rate(bit_rate: u16) -> Result<Self, LinkError> {
        if bit_rate == 0 {
            return Err(LinkError::InvalidBitRate(bit_rate));
        }
        let bit_period_ns = NANOS_PER_SECOND / u32::from(bit_rate);
        Ok(Self {
            bit_rate,
            bit_period_ns,
            sample_period_ns: bit_period_ns / u32::from(SAMPLES_PER_BIT),
        })
    }

    /// Sampling ticks per second.
    pub fn sample_rate(&self) -> u32 {
        u32::from(self.bit_rate) * u32::from(SAMPLES_PER_BIT)
    }
}

/// Computes the compare values for a timer in CTC mode.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 1, 8, 64, 256)
/// - `bit_rate`: link bit rate in bits per second
///
/// # Returns
/// - Compare value for the sampling tick (`8 × bit_rate`), rounded
/// - Compare value for the bit tick (`bit_rate`), rounded
///
/// Values that do not fit the register saturate at `u16::MAX`.
///
/// # Errors
/// [`LinkError::InvalidBitRate`] for a rate of zero.
pub fn compute_compare_values(
    f_cpu: u32,
    prescaler: u32,
    bit_rate: u16,
) -> Result<(u16, u16), LinkError> {
    let timing = Timing::from_bit_rate(bit_rate)?;
    let counts_per_second = f64::from(f_cpu) / f64::from(prescaler.max(1));
    let sample = round(counts_per_second / f64::from(timing.sample_rate()));
    let bit = round(counts_per_second / f64::from(bit_rate));
    Ok((saturate(sample), saturate(bit)))
}

fn saturate(count: f64) -> u16 {
    if count >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        count as u16
    }
}
