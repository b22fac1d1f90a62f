//! Link control: the owned context tying the modulator, sampler and
//! demodulator to a pair of pins.
//!
//! A [`Link`] is shared between caller code and one or two periodic tick
//! contexts (timer interrupts or a delay loop). All of its operations take
//! `&self`; the state they touch lives in `critical_section::Mutex` cells,
//! and each operation holds the critical section only for its own span.
//!
//! ## Example
//!
//! ```rust
//! use askwire::link::{Link, LinkConfig};
//! use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};
//!
//! let tx = Mock::new(&[Transaction::set(State::Low)]);
//! let rx = Mock::new(&[]);
//! let link: Link<Mock, Mock, Mock> = Link::new(tx, rx, None, LinkConfig::default()).unwrap();
//! link.start();
//! assert!(link.is_receiving());
//! assert!(!link.has_message());
//!
//! let (mut tx, mut rx, _) = link.release();
//! tx.done();
//! rx.done();
//! ```
//!
//! ## Notes
//!
//! - Call [`Link::rx_tick`] at `8 × bit_rate` and [`Link::tx_tick`] at
//!   `bit_rate`, or [`Link::tick`] alone at `8 × bit_rate`.
//! - Only one message is held. A frame completing before the previous one was
//!   taken replaces it.
//! - The good and bad frame counters are 8 bits wide and wrap at 256.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::fmt;

use critical_section::{CriticalSection, Mutex};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use nb::block;

use crate::consts::{DEFAULT_BIT_RATE, SAMPLES_PER_BIT};
use crate::demodulator::{Demodulator, Outcome};
use crate::error::LinkError;
use crate::framer::{Message, build};
use crate::modulator::Modulator;
use crate::sampler::{Recovered, Sampler};
use crate::timer::Timing;
use crate::value::{ValueKind, ValueRecord};

/// Interval between mailbox checks in [`Link::wait_message`].
const WAIT_POLL_US: u32 = 100;

/// Runtime link settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkConfig {
    /// Bits per second on the air.
    pub bit_rate: u16,
    /// The receiver outputs `LOW` for carrier.
    pub rx_inverted: bool,
    /// PTT is active `LOW`.
    pub ptt_inverted: bool,
    /// Suspend the receiver while transmitting.
    pub half_duplex: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bit_rate: DEFAULT_BIT_RATE,
            rx_inverted: false,
            ptt_inverted: false,
            half_duplex: true,
        }
    }
}

/// Frame counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkStatistics {
    /// Frames received with a matching checksum (wrapping).
    pub good: u8,
    /// Frames received corrupted or abandoned after their length (wrapping).
    pub bad: u8,
}

/// The interface the link exposes to a command layer.
///
/// Only booleans and options cross it: on an unreliable link loss and
/// corruption are routine.
pub trait DatagramLink {
    /// Queues `payload` for transmission. Returns `false` if the link is busy
    /// or the payload does not fit in a frame.
    fn try_send(&self, payload: &[u8]) -> bool;

    /// Takes the pending message, if any.
    fn poll_message(&self) -> Option<Message>;

    /// Current frame counters.
    fn link_statistics(&self) -> LinkStatistics;

    /// Whether a transmission is in flight.
    fn is_busy(&self) -> bool;
}

#[derive(Debug)]
struct Receiver<RX: InputPin> {
    rx: RX,
    inverted: bool,
    enabled: bool,
    suspended: bool,
    sampler: Sampler,
    demod: Demodulator,
}

impl<RX: InputPin> Receiver<RX> {
    fn new(rx: RX, inverted: bool) -> Self {
        Self {
            rx,
            inverted,
            enabled: false,
            suspended: false,
            sampler: Sampler::new(),
            demod: Demodulator::new(),
        }
    }

    fn restart(&mut self) {
        self.sampler.reset();
        self.demod.reset();
    }

    fn tick(&mut self) -> Option<Outcome> {
        if !self.enabled || self.suspended {
            return None;
        }
        // A failed read counts as a low line.
        let level = self.rx.is_high().unwrap_or(false) != self.inverted;
        match self.sampler.sample(level)? {
            Recovered::Bit(bit) => self.demod.push_bit(bit),
            Recovered::LockLost => {
                debug!("receiver lost lock");
                self.demod.lose_lock()
            }
        }
    }
}

#[derive(Debug, Default)]
struct Mailbox {
    message: Option<Message>,
    stats: LinkStatistics,
}

impl Mailbox {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Message(message) => {
                if message.checksum_valid() {
                    self.stats.good = self.stats.good.wrapping_add(1);
                } else {
                    self.stats.bad = self.stats.bad.wrapping_add(1);
                }
                if self.message.replace(message).is_some() {
                    debug!("unread message replaced");
                }
            }
            Outcome::Dropped { counted: true, .. } => {
                self.stats.bad = self.stats.bad.wrapping_add(1);
            }
            Outcome::Dropped { counted: false, .. } => {}
        }
    }
}

/// An ASK datagram link over a TX pin, an RX pin and an optional PTT pin.
pub struct Link<TX, RX, PTT>
where
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    modulator: Mutex<RefCell<Modulator<TX, PTT>>>,
    receiver: Mutex<RefCell<Receiver<RX>>>,
    mailbox: Mutex<RefCell<Mailbox>>,
    config: Mutex<Cell<LinkConfig>>,
    timing: Mutex<Cell<Timing>>,
    /// Sample ticks since the last bit tick, for [`Link::tick`].
    divider: Mutex<Cell<u8>>,
}

impl<TX, RX, PTT> fmt::Debug for Link<TX, RX, PTT>
where
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("config", &self.config())
            .field("busy", &self.is_busy())
            .field("receiving", &self.is_receiving())
            .field("statistics", &self.statistics())
            .finish_non_exhaustive()
    }
}

impl<TX, RX, PTT> Link<TX, RX, PTT>
where
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    /// Creates a stopped, idle link.
    ///
    /// TX is driven `LOW` and PTT, if present, released.
    ///
    /// # Errors
    /// [`LinkError::InvalidBitRate`] if `config.bit_rate` is zero.
    pub fn new(tx: TX, rx: RX, ptt: Option<PTT>, config: LinkConfig) -> Result<Self, LinkError> {
        let timing = Timing::from_bit_rate(config.bit_rate)?;
        debug!("link created at {} bps", timing.bit_rate);
        Ok(Self {
            modulator: Mutex::new(RefCell::new(Modulator::new(tx, ptt, config.ptt_inverted))),
            receiver: Mutex::new(RefCell::new(Receiver::new(rx, config.rx_inverted))),
            mailbox: Mutex::new(RefCell::new(Mailbox::default())),
            config: Mutex::new(Cell::new(config)),
            timing: Mutex::new(Cell::new(timing)),
            divider: Mutex::new(Cell::new(0)),
        })
    }

    /// Replaces the configuration.
    ///
    /// The caller must reprogram its tick timers from [`Link::timing`]
    /// afterwards.
    ///
    /// # Errors
    /// [`LinkError::InvalidBitRate`] for a zero bit rate, [`LinkError::Running`]
    /// while receiving or transmitting.
    pub fn configure(&self, config: LinkConfig) -> Result<(), LinkError> {
        let timing = Timing::from_bit_rate(config.bit_rate)?;
        critical_section::with(|cs| {
            let mut modulator = self.modulator.borrow_ref_mut(cs);
            let mut receiver = self.receiver.borrow_ref_mut(cs);
            if receiver.enabled || modulator.is_active() {
                return Err(LinkError::Running);
            }
            modulator.set_ptt_inverted(config.ptt_inverted);
            receiver.inverted = config.rx_inverted;
            self.config.borrow(cs).set(config);
            self.timing.borrow(cs).set(timing);
            Ok(())
        })?;
        info!("link configured for {} bps", config.bit_rate);
        Ok(())
    }

    /// The current configuration.
    pub fn config(&self) -> LinkConfig {
        critical_section::with(|cs| self.config.borrow(cs).get())
    }

    /// Tick periods for the current bit rate.
    pub fn timing(&self) -> Timing {
        critical_section::with(|cs| self.timing.borrow(cs).get())
    }

    /// Enables the receive pipeline from a fresh hunting state.
    pub fn start(&self) {
        critical_section::with(|cs| {
            let mut receiver = self.receiver.borrow_ref_mut(cs);
            receiver.restart();
            receiver.enabled = true;
        });
        info!("receiver started");
    }

    /// Disables the receive pipeline, discarding any partial frame.
    ///
    /// Counters and a pending message are kept.
    pub fn stop(&self) {
        critical_section::with(|cs| {
            let mut receiver = self.receiver.borrow_ref_mut(cs);
            receiver.enabled = false;
            receiver.restart();
        });
        info!("receiver stopped");
    }

    /// Whether the receive pipeline is enabled.
    pub fn is_receiving(&self) -> bool {
        critical_section::with(|cs| self.receiver.borrow_ref(cs).enabled)
    }

    /// Queues `payload` for transmission.
    ///
    /// In half-duplex mode the receiver is suspended until the transmission
    /// completes.
    ///
    /// # Errors
    /// [`LinkError::Busy`] while a transmission is in flight,
    /// [`LinkError::PayloadTooLarge`] if the payload does not fit in a frame.
    pub fn send(&self, payload: &[u8]) -> Result<(), LinkError> {
        // Encoding runs outside the guard; only the hand-over is locked.
        let frame = build(payload)?;
        critical_section::with(|cs| {
            self.modulator.borrow_ref_mut(cs).transmit(&frame)?;
            if self.config.borrow(cs).get().half_duplex {
                let mut receiver = self.receiver.borrow_ref_mut(cs);
                receiver.suspended = true;
                receiver.restart();
            }
            Ok(())
        })
    }

    /// Whether a transmission is in flight.
    pub fn is_busy(&self) -> bool {
        critical_section::with(|cs| self.modulator.borrow_ref(cs).is_active())
    }

    /// Non-blocking check for the end of the transmission.
    pub fn poll_idle(&self) -> nb::Result<(), Infallible> {
        if self.is_busy() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Blocks until the transmission in flight completes.
    ///
    /// The ticks must be running in another context.
    pub fn wait_idle(&self) {
        let _ = block!(self.poll_idle());
    }

    /// Whether a message is waiting to be taken.
    pub fn has_message(&self) -> bool {
        critical_section::with(|cs| self.mailbox.borrow_ref(cs).message.is_some())
    }

    /// Takes the pending message, valid or not.
    pub fn take_message(&self) -> Option<Message> {
        critical_section::with(|cs| self.mailbox.borrow_ref_mut(cs).message.take())
    }

    /// Non-blocking variant of [`Link::take_message`].
    pub fn read_message(&self) -> nb::Result<Message, Infallible> {
        self.take_message().ok_or(nb::Error::WouldBlock)
    }

    /// Blocks until a message arrives and takes it.
    ///
    /// The ticks must be running in another context.
    pub fn wait_message_blocking(&self) -> Message {
        match block!(self.read_message()) {
            Ok(message) => message,
            Err(never) => match never {},
        }
    }

    /// Frames received with a matching checksum, modulo 256.
    pub fn good_count(&self) -> u8 {
        self.statistics().good
    }

    /// Frames received corrupted, modulo 256.
    pub fn bad_count(&self) -> u8 {
        self.statistics().bad
    }

    /// Both frame counters, read together.
    pub fn statistics(&self) -> LinkStatistics {
        critical_section::with(|cs| self.mailbox.borrow_ref(cs).stats)
    }

    /// Waits up to `timeout_ms` for a message, polling through `delay`.
    ///
    /// Returns `true` as soon as a message is pending. The ticks must be
    /// running in another context, or be driven by `delay` itself.
    pub fn wait_message<D: DelayNs>(&self, delay: &mut D, timeout_ms: u32) -> bool {
        let budget_us = timeout_ms.saturating_mul(1_000);
        let mut waited_us: u32 = 0;
        loop {
            if self.has_message() {
                return true;
            }
            if waited_us >= budget_us {
                return false;
            }
            delay.delay_us(WAIT_POLL_US);
            waited_us = waited_us.saturating_add(WAIT_POLL_US);
        }
    }

    /// Waits up to `timeout` of wall-clock time for a message.
    #[cfg(feature = "std")]
    pub fn wait_message_timeout(&self, timeout: std::time::Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if self.has_message() {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(std::time::Duration::from_micros(u64::from(WAIT_POLL_US)));
        }
    }

    /// Bit-rate tick: drives the next transmit bit.
    pub fn tx_tick(&self) {
        critical_section::with(|cs| self.tx_tick_in(cs));
    }

    /// Sampling tick (`8 × bit_rate`): reads the RX line.
    pub fn rx_tick(&self) {
        critical_section::with(|cs| self.rx_tick_in(cs));
    }

    /// Combined tick for hosts with a single timer at `8 × bit_rate`.
    ///
    /// Samples on every call and transmits on every eighth.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let divider = self.divider.borrow(cs);
            if divider.get() == 0 {
                self.tx_tick_in(cs);
            }
            divider.set((divider.get() + 1) % SAMPLES_PER_BIT);
            self.rx_tick_in(cs);
        });
    }

    /// Builds a value record and sends it.
    ///
    /// # Errors
    /// [`LinkError::Value`] if the record cannot be built, otherwise as
    /// [`Link::send`].
    pub fn send_value(
        &self,
        value: f32,
        digits: u8,
        kind: ValueKind,
        source: u8,
    ) -> Result<(), LinkError> {
        let record = ValueRecord::new(value, digits, kind, source)?;
        self.send(&record.encode())
    }

    /// Takes the pending message as a value record.
    ///
    /// The message is consumed either way; `None` if there was none, its
    /// checksum failed, or it is not a well-formed record.
    pub fn take_value(&self) -> Option<ValueRecord> {
        let message = self.take_message()?;
        if !message.checksum_valid() {
            return None;
        }
        ValueRecord::decode(message.payload()).ok()
    }

    /// Tears the link down and returns its pins.
    pub fn release(self) -> (TX, RX, Option<PTT>) {
        let (tx, ptt) = self.modulator.into_inner().into_inner().release();
        let rx = self.receiver.into_inner().into_inner().rx;
        (tx, rx, ptt)
    }

    fn tx_tick_in(&self, cs: CriticalSection<'_>) {
        if !self.modulator.borrow_ref_mut(cs).tick() {
            return;
        }
        if self.config.borrow(cs).get().half_duplex {
            let mut receiver = self.receiver.borrow_ref_mut(cs);
            receiver.suspended = false;
            receiver.restart();
        }
    }

    fn rx_tick_in(&self, cs: CriticalSection<'_>) {
        let outcome = self.receiver.borrow_ref_mut(cs).tick();
        if let Some(outcome) = outcome {
            self.mailbox.borrow_ref_mut(cs).record(outcome);
        }
    }
}

impl<TX, RX, PTT> DatagramLink for Link<TX, RX, PTT>
where
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    fn try_send(&self, payload: &[u8]) -> bool {
        self.send(payload).is_ok()
    }

    fn poll_message(&self) -> Option<Message> {
        self.take_message()
    }

    fn link_statistics(&self) -> LinkStatistics {
        self.statistics()
    }

    fn is_busy(&self) -> bool {
        Link::is_busy(self)
    }
}
