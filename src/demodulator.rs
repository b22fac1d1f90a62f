//! Frame reassembly from recovered bits.
//!
//! The [`Demodulator`] consumes the bits produced by the
//! [`Sampler`](crate::sampler::Sampler) and walks the state machine
//!
//! ```text
//! Hunting -> ReadingLength -> ReadingPayload -> ReadingChecksum -> Hunting
//! ```
//!
//! While hunting, bits are shifted into a 12-bit register (newest bit at the
//! top, matching LSB-first symbols) until it holds the start symbol. After
//! that, every six bits form a symbol, every two symbols a byte, and the bytes
//! are handed to a [`FrameParser`].
//!
//! Corruption never escapes as an error. The frame is abandoned, hunting
//! resumes, and the caller receives an [`Outcome::Dropped`] telling it whether
//! the loss should count as a bad frame.

use crate::consts::{START_SYMBOL, START_SYMBOL_BITS, SYMBOL_BITS};
use crate::encoding::decode_symbol;
use crate::error::FrameCorruption;
use crate::framer::{FrameParser, Message, ParseStage};

/// Where the demodulator is in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DemodState {
    /// Looking for the start symbol.
    #[default]
    Hunting,
    /// Decoding the length byte.
    ReadingLength,
    /// Decoding payload bytes.
    ReadingPayload,
    /// Decoding the checksum bytes.
    ReadingChecksum,
}

/// The end of a frame, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A complete frame, with or without a matching checksum.
    Message(Message),
    /// The frame was abandoned.
    Dropped {
        /// Whether the loss counts against the bad-frame counter.
        counted: bool,
        /// Why it was abandoned.
        reason: FrameCorruption,
    },
}

/// Receive assembly state.
#[derive(Debug, Clone)]
pub struct Demodulator {
    /// Last 12 bits received, so we can look for the start symbol
    bits: u16,
    hunting: bool,
    symbol: u8,
    symbol_bits: u8,
    high_nibble: Option<u8>,
    parser: FrameParser,
}

impl Default for Demodulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Demodulator {
    /// Creates a demodulator hunting for a start symbol.
    pub fn new() -> Self {
        Self {
            bits: 0,
            hunting: true,
            symbol: 0,
            symbol_bits: 0,
            high_nibble: None,
            parser: FrameParser::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DemodState {
        if self.hunting {
            return DemodState::Hunting;
        }
        match self.parser.stage() {
            ParseStage::Length => DemodState::ReadingLength,
            ParseStage::Payload => DemodState::ReadingPayload,
            ParseStage::Checksum => DemodState::ReadingChecksum,
        }
    }

    /// Discards any partial frame and resumes hunting, without reporting it.
    pub fn reset(&mut self) {
        self.bits = 0;
        self.hunting = true;
        self.symbol = 0;
        self.symbol_bits = 0;
        self.high_nibble = None;
        self.parser.reset();
    }

    /// Feeds one recovered bit.
    pub fn push_bit(&mut self, bit: bool) -> Option<Outcome> {
        if self.hunting {
            self.bits >>= 1;
            if bit {
                self.bits |= 1 << (START_SYMBOL_BITS - 1);
            }
            if self.bits == START_SYMBOL {
                self.reset();
                self.hunting = false;
                trace!("start symbol");
            }
            return None;
        }

        if bit {
            self.symbol |= 1 << self.symbol_bits;
        }
        self.symbol_bits += 1;
        if self.symbol_bits < SYMBOL_BITS {
            return None;
        }
        let code = self.symbol;
        self.symbol = 0;
        self.symbol_bits = 0;

        let Some(nibble) = decode_symbol(code) else {
            return Some(self.abandon(FrameCorruption::BadSymbol { code }));
        };
        let Some(high) = self.high_nibble.take() else {
            self.high_nibble = Some(nibble);
            return None;
        };

        match self.parser.push_byte((high << 4) | nibble) {
            Ok(None) => None,
            Ok(Some(message)) => {
                debug!(
                    "frame complete: {} bytes, checksum valid {}",
                    message.len(),
                    message.checksum_valid()
                );
                self.reset();
                Some(Outcome::Message(message))
            }
            Err(reason) => Some(self.abandon(reason)),
        }
    }

    /// Abandons the current frame after the sampler lost lock.
    ///
    /// Returns `None` when no frame was in progress.
    pub fn lose_lock(&mut self) -> Option<Outcome> {
        if self.hunting {
            self.bits = 0;
            return None;
        }
        Some(self.abandon(FrameCorruption::Truncated))
    }

    fn abandon(&mut self, reason: FrameCorruption) -> Outcome {
        // A bogus length is a bad frame. Anything else only counts once a
        // length has been accepted; before that it is just noise.
        let counted = match reason {
            FrameCorruption::BadLength(_) => true,
            _ => self.parser.length_accepted(),
        };
        warn!("frame dropped: {}", reason);
        self.reset();
        Outcome::Dropped { counted, reason }
    }
}
