//! # askwire
//!
//! A portable, no_std Rust implementation of a VirtualWire style datagram link over
//! Amplitude Shift Keying (ASK/OOK) radios, such as the cheap 433 MHz FS1000A and
//! XY-MK-5V modules.
//!
//! The link is an unreliable datagram service, much like UDP over a wire: no addressing,
//! no retransmission, no acknowledgment. What it does provide is:
//! - a DC-balanced 4b6b line code so the receiver always sees enough transitions
//! - a training preamble and start symbol for the receiver to lock onto
//! - software clock recovery (a ramp PLL) at 8x oversampling
//! - a CRC-16 checksum on every frame
//!
//! It is built on:
//! - `embedded-hal` traits for digital I/O and timing
//! - interrupt-safe state with `critical-section`
//! - fixed-capacity `heapless` buffers
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Builds against `std` and enables wall-clock waits |
//! | `delay-loop`          | Blocking tick loops paced by `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | Global link slot and tick macros for timer interrupts |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Layers
//!
//! - [`encoding`]: the 4b6b symbol table
//! - [`framer`]: length byte, payload and checksum, encoded to symbols
//! - [`modulator`]: drives frame bits onto the TX pin, one per bit tick
//! - [`sampler`]: recovers bits from the RX pin at 8x the bit rate
//! - [`demodulator`]: finds the start symbol and reassembles frames
//! - [`link`]: the owned link context callers and interrupts share
//! - [`value`]: typed float readings carried as payloads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use askwire::{Link, LinkConfig};
//!
//! let link = Link::new(tx_pin, rx_pin, None, LinkConfig::default())?;
//! link.start();
//! link.send(b"hello")?;
//! loop {
//!     link.tick(); // Call every 62.5 µs at 2000 bps
//!     if let Some(message) = link.take_message() {
//!         // ...
//!     }
//! }
//! ```
//!
//! Or, with the `delay-loop` feature, use `run_tick_loop()` with a `DelayNs` implementation:
//!
//! ```rust,ignore
//! askwire::timer::run_tick_loop(&link, &mut delay);
//! ```
//!
//! ## Integration Notes
//!
//! - The receiver tolerates a few percent of clock offset between the two ends; hardware
//!   timer configuration is still recommended for reliability
//! - Most cheap receivers output noise when no carrier is present; expect the bad frame
//!   counter to move even when nothing is being sent
//! - The radios share one channel: keep `half_duplex` set unless the receiver cannot hear
//!   the local transmitter

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub use critical_section;
pub use heapless;

pub mod consts;
pub mod crc;
pub mod demodulator;
pub mod encoding;
pub mod error;
pub mod framer;
pub mod link;
pub mod modulator;
pub mod sampler;
pub mod timer;
pub mod value;

pub use error::{FrameCorruption, LinkError, ValueError};
pub use framer::Message;
pub use link::{DatagramLink, Link, LinkConfig, LinkStatistics};
pub use timer::Timing;
pub use value::{ValueKind, ValueRecord};
