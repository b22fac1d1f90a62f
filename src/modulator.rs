//! Bit-rate transmitter.
//!
//! The [`Modulator`] owns the TX and optional PTT pins and the transmit
//! buffer. [`send`](Modulator::send) only queues: it builds the frame, puts the
//! training preamble and start symbol in front of it, keys the transmitter and
//! arms the bit tick. Each [`tick`](Modulator::tick), called once per bit
//! period, drives the next bit onto the TX line using On-Off Keying:
//!
//! - `HIGH` = carrier on = logical `1`
//! - `LOW`  = carrier off = logical `0`
//!
//! The tick after the last bit (so the last bit is held for a full period)
//! releases PTT, drives TX low and disarms.

use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::consts::{MAX_BUF_LEN_USIZE, PREAMBLE, SYMBOL_BITS};
use crate::error::LinkError;
use crate::framer::{Frame, build};

/// Transmit side of the link.
#[derive(Debug)]
pub struct Modulator<TX, PTT>
where
    TX: OutputPin,
    PTT: OutputPin,
{
    tx: TX,
    ptt: Option<PTT>,
    ptt_inverted: bool,

    /// Preamble and frame symbols for the transmission in flight.
    buf: Vec<u8, MAX_BUF_LEN_USIZE>,

    /// Index into the transmission buffer, pointing to the current symbol being transmitted.
    index: usize,

    /// Current bit position within the current 6-bit symbol being transmitted (0–5).
    bit: u8,

    armed: bool,
}

impl<TX, PTT> Modulator<TX, PTT>
where
    TX: OutputPin,
    PTT: OutputPin,
{
    /// Creates an idle modulator.
    ///
    /// TX is driven `LOW` (carrier off) and PTT, if present, is released.
    pub fn new(tx: TX, ptt: Option<PTT>, ptt_inverted: bool) -> Self {
        let mut modulator = Self {
            tx,
            ptt,
            ptt_inverted,
            buf: Vec::new(),
            index: 0,
            bit: 0,
            armed: false,
        };
        modulator.write_tx(false);
        modulator.write_ptt(false);
        modulator
    }

    /// Changes the PTT polarity.
    ///
    /// While idle the PTT line is re-driven to its released level.
    pub fn set_ptt_inverted(&mut self, inverted: bool) {
        self.ptt_inverted = inverted;
        if !self.armed {
            self.write_ptt(false);
        }
    }

    /// Whether a transmission is in flight.
    pub fn is_active(&self) -> bool {
        self.armed
    }

    /// Symbols queued for the transmission in flight, preamble included.
    pub fn queued(&self) -> &[u8] {
        &self.buf
    }

    /// Builds a frame for `payload` and starts transmitting it.
    ///
    /// # Errors
    /// [`LinkError::Busy`] while a transmission is in flight, or
    /// [`LinkError::PayloadTooLarge`] from [`build`].
    pub fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if self.armed {
            return Err(LinkError::Busy);
        }
        let frame = build(payload)?;
        self.transmit(&frame)
    }

    /// Starts transmitting an already built frame.
    ///
    /// # Errors
    /// [`LinkError::Busy`] while a transmission is in flight.
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), LinkError> {
        if self.armed {
            return Err(LinkError::Busy);
        }
        self.buf.clear();
        // Capacity covers the preamble plus the largest frame.
        let _ = self.buf.extend_from_slice(&PREAMBLE);
        let _ = self.buf.extend_from_slice(frame.symbols());
        self.index = 0;
        self.bit = 0;

        self.write_ptt(true);
        self.armed = true;
        debug!("transmitting {} symbols", self.buf.len());
        Ok(())
    }

    /// Advances the transmission by one bit period.
    ///
    /// Returns `true` on the tick that completes the transmission.
    pub fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        // Finished sending the whole message? (after waiting one bit period
        // since the last bit)
        let Some(&symbol) = self.buf.get(self.index) else {
            self.finish();
            return true;
        };
        // Symbols are sent LSB first
        self.write_tx(symbol & (1 << self.bit) != 0);
        self.bit += 1;
        if self.bit >= SYMBOL_BITS {
            self.bit = 0;
            self.index += 1;
        }
        false
    }

    /// Returns the pins, releasing PTT first.
    pub fn release(mut self) -> (TX, Option<PTT>) {
        self.write_ptt(false);
        (self.tx, self.ptt)
    }

    fn finish(&mut self) {
        self.write_ptt(false);
        self.write_tx(false);
        self.buf.clear();
        self.index = 0;
        self.bit = 0;
        self.armed = false;
        debug!("transmission complete");
    }

    fn write_tx(&mut self, level: bool) {
        let _ = if level {
            self.tx.set_high()
        } else {
            self.tx.set_low()
        };
    }

    fn write_ptt(&mut self, keyed: bool) {
        let state = keyed != self.ptt_inverted;
        if let Some(ptt) = self.ptt.as_mut() {
            let _ = if state { ptt.set_high() } else { ptt.set_low() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_PAYLOAD_LEN_USIZE, PREAMBLE_LEN};
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn level(bit: bool) -> PinState {
        if bit { PinState::High } else { PinState::Low }
    }

    fn done(modulator: Modulator<PinMock, PinMock>) {
        let (mut tx, ptt) = modulator.release_unchecked();
        tx.done();
        if let Some(mut ptt) = ptt {
            ptt.done();
        }
    }

    impl<TX: OutputPin, PTT: OutputPin> Modulator<TX, PTT> {
        // Hands the pins back without touching PTT, so mock expectations stay exact.
        fn release_unchecked(self) -> (TX, Option<PTT>) {
            (self.tx, self.ptt)
        }
    }

    #[test]
    fn test_modulator_initialization() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let modulator = Modulator::new(tx, Some(ptt), false);
        assert!(!modulator.is_active());
        done(modulator);
    }

    #[test]
    fn test_inverted_ptt_idles_high() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut modulator = Modulator::new(tx, Some(ptt), true);
        assert!(modulator.send(b"x").is_ok());
        assert!(modulator.is_active());
        done(modulator);
    }

    #[test]
    fn test_send_queues_preamble_and_frame() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut modulator = Modulator::new(tx, Some(ptt), false);
        assert!(modulator.send(&[0x01, 0x02, 0x03]).is_ok());
        assert_eq!(
            modulator.queued(),
            &[
                0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x38, 0x2c, 13, 26, 13, 14, 13, 19, 13, 21, 41,
                21, 50, 42
            ]
        );
        done(modulator);
    }

    #[test]
    fn test_send_while_busy_is_refused() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut modulator = Modulator::new(tx, Some(ptt), false);
        assert!(modulator.send(b"first").is_ok());
        let queued: std::vec::Vec<u8> = modulator.queued().to_vec();
        assert_eq!(modulator.send(b"second"), Err(LinkError::Busy));
        assert_eq!(modulator.queued(), &queued[..]);
        assert!(modulator.is_active());
        done(modulator);
    }

    #[test]
    fn test_oversized_payload_starts_nothing() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut modulator = Modulator::new(tx, Some(ptt), false);
        let payload = [0u8; MAX_PAYLOAD_LEN_USIZE + 1];
        assert_eq!(
            modulator.send(&payload),
            Err(LinkError::PayloadTooLarge { len: 78, max: 77 })
        );
        assert!(!modulator.is_active());
        assert!(modulator.queued().is_empty());
        assert!(!modulator.tick());
        done(modulator);
    }

    #[test]
    fn test_tick_drives_every_bit_then_releases() {
        let frame = build(b"AB").unwrap();
        let mut bits: std::vec::Vec<bool> = PREAMBLE
            .iter()
            .flat_map(|&s| (0..6).map(move |i| (s >> i) & 1 == 1))
            .collect();
        bits.extend(frame.bits());
        assert_eq!(bits.len(), (usize::from(PREAMBLE_LEN) + frame.symbols().len()) * 6);

        let mut expectations = std::vec![PinTransaction::set(PinState::Low)];
        expectations.extend(bits.iter().map(|&b| PinTransaction::set(level(b))));
        expectations.push(PinTransaction::set(PinState::Low));
        let tx = PinMock::new(&expectations);
        let ptt = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);

        let mut modulator = Modulator::new(tx, Some(ptt), false);
        modulator.transmit(&frame).unwrap();
        for _ in 0..bits.len() {
            assert!(!modulator.tick());
            assert!(modulator.is_active());
        }
        // Hold period: the last bit stays on the line for this tick.
        assert!(modulator.tick());
        assert!(!modulator.is_active());
        // Disarmed: further ticks touch nothing.
        assert!(!modulator.tick());
        done(modulator);
    }

    #[test]
    fn test_release_drops_ptt() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let ptt = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let modulator = Modulator::new(tx, Some(ptt), false);
        let (mut tx, ptt) = modulator.release();
        tx.done();
        if let Some(mut ptt) = ptt {
            ptt.done();
        }
    }
}
