//! Frame construction and parsing.
//!
//! A frame wraps a payload for the wire:
//!
//! ```text
//! +-------------+-------------------+-------------+-------------+
//! | length (1)  | payload (0..=77)  | fcs lo (1)  | fcs hi (1)  |
//! +-------------+-------------------+-------------+-------------+
//! ```
//!
//! The length byte counts itself, the payload and the checksum, so it lies in
//! `3..=80`. The checksum is computed over the length byte and payload (see
//! [`crate::crc::checksum`]). Every byte is then 4b6b encoded into two 6-bit
//! symbols, high nibble first, and each symbol goes on the line LSB first.
//!
//! [`build`] produces the encoded symbols for transmission. [`FrameParser`] is
//! its inverse, fed one decoded byte at a time by the demodulator, and
//! [`parse`] runs it over a complete symbol sequence.

use core::iter;

use heapless::Vec;

use crate::consts::{
    FRAME_OVERHEAD, MAX_FRAME_SYMBOLS, MAX_MESSAGE_LEN, MAX_PAYLOAD_LEN_USIZE, MIN_MESSAGE_LEN,
    SYMBOL_BITS,
};
use crate::crc::{CRC_INIT, checksum, crc_ccitt_update};
use crate::encoding::{decode_6b4b, decode_symbol, encode_4b6b};
use crate::error::{FrameCorruption, LinkError};

/// Payload storage sized for the largest frame.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN_USIZE>;

/// Encoded symbol storage sized for the largest frame.
pub type Symbols = Vec<u8, MAX_FRAME_SYMBOLS>;

/// An encoded frame, ready to be queued behind the preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    symbols: Symbols,
    length: u8,
    checksum: u16,
}

impl Frame {
    /// The frame's length byte.
    pub fn length(&self) -> u8 {
        self.length
    }

    /// The checksum carried at the end of the frame.
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// The encoded 6-bit symbols, in transmission order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// The frame's line bits, in transmission order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.symbols
            .iter()
            .flat_map(|&s| (0..SYMBOL_BITS).map(move |i| (s >> i) & 1 == 1))
    }
}

/// Builds the encoded frame for `payload`.
///
/// # Errors
/// [`LinkError::PayloadTooLarge`] if the payload is longer than
/// [`MAX_PAYLOAD_LEN`](crate::consts::MAX_PAYLOAD_LEN).
pub fn build(payload: &[u8]) -> Result<Frame, LinkError> {
    if payload.len() > MAX_PAYLOAD_LEN_USIZE {
        return Err(LinkError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN_USIZE,
        });
    }
    // Cannot truncate: checked against MAX_PAYLOAD_LEN above.
    let length = payload.len() as u8 + FRAME_OVERHEAD;
    let checksum = checksum(length, payload);

    let mut symbols = Symbols::new();
    // The checksum goes out low byte first.
    for byte in iter::once(length)
        .chain(payload.iter().copied())
        .chain(checksum.to_le_bytes())
    {
        // Capacity holds two symbols per byte of the largest frame.
        let _ = symbols.extend_from_slice(&encode_4b6b(byte));
    }

    Ok(Frame {
        symbols,
        length,
        checksum,
    })
}

/// A completely received frame.
///
/// The payload is delivered whether or not the checksum matched; callers
/// decide what to do with a corrupted one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    payload: Payload,
    checksum_valid: bool,
}

impl Message {
    /// Creates a message from its parts.
    pub fn new(payload: Payload, checksum_valid: bool) -> Self {
        Self {
            payload,
            checksum_valid,
        }
    }

    /// The received payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the received checksum matched the payload.
    pub fn checksum_valid(&self) -> bool {
        self.checksum_valid
    }

    /// Splits the message into its payload and checksum-valid flag.
    pub fn into_parts(self) -> (Payload, bool) {
        (self.payload, self.checksum_valid)
    }
}

/// Which part of the frame a [`FrameParser`] expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ParseStage {
    /// Waiting for the length byte.
    #[default]
    Length,
    /// Collecting payload bytes.
    Payload,
    /// Collecting the two checksum bytes.
    Checksum,
}

/// Incremental frame decoder, fed one byte at a time.
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    stage: ParseStage,
    length: u8,
    payload: Payload,
    crc: u16,
    received: u16,
    checksum_bytes: u8,
}

impl FrameParser {
    /// Creates a parser waiting for a length byte.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards any partial frame.
    pub fn reset(&mut self) {
        self.stage = ParseStage::Length;
        self.length = 0;
        self.payload.clear();
        self.crc = CRC_INIT;
        self.received = 0;
        self.checksum_bytes = 0;
    }

    /// The part of the frame expected next.
    pub fn stage(&self) -> ParseStage {
        self.stage
    }

    /// Whether a plausible length byte has been accepted for the current frame.
    pub fn length_accepted(&self) -> bool {
        self.stage != ParseStage::Length
    }

    /// Feeds the next decoded byte.
    ///
    /// Returns `Ok(Some(message))` once the checksum bytes are in, after which
    /// the parser is ready for the next frame.
    ///
    /// # Errors
    /// [`FrameCorruption::BadLength`] if the length byte is out of range. The
    /// parser resets itself.
    pub fn push_byte(&mut self, byte: u8) -> Result<Option<Message>, FrameCorruption> {
        match self.stage {
            ParseStage::Length => {
                if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&byte) {
                    self.reset();
                    return Err(FrameCorruption::BadLength(byte));
                }
                self.length = byte;
                self.crc = crc_ccitt_update(CRC_INIT, byte);
                self.stage = if byte == MIN_MESSAGE_LEN {
                    ParseStage::Checksum
                } else {
                    ParseStage::Payload
                };
            }
            ParseStage::Payload => {
                // Capacity matches the largest length byte accepted above.
                let _ = self.payload.push(byte);
                self.crc = crc_ccitt_update(self.crc, byte);
                if self.payload.len() + usize::from(FRAME_OVERHEAD) >= usize::from(self.length) {
                    self.stage = ParseStage::Checksum;
                }
            }
            ParseStage::Checksum => {
                if self.checksum_bytes == 0 {
                    self.received = u16::from(byte);
                    self.checksum_bytes = 1;
                } else {
                    self.received |= u16::from(byte) << 8;
                    return Ok(Some(self.finish()));
                }
            }
        }
        Ok(None)
    }

    fn finish(&mut self) -> Message {
        let expected = !self.crc;
        let checksum_valid = expected == self.received;
        if !checksum_valid {
            warn!(
                "{}",
                FrameCorruption::ChecksumMismatch {
                    expected,
                    received: self.received,
                }
            );
        }
        let message = Message::new(core::mem::take(&mut self.payload), checksum_valid);
        self.reset();
        message
    }
}

/// Decodes a complete sequence of frame symbols (without the preamble).
///
/// Symbols after the end of the frame are ignored.
///
/// # Errors
/// [`FrameCorruption::BadSymbol`] for a code outside the symbol table,
/// [`FrameCorruption::BadLength`] for an impossible length byte and
/// [`FrameCorruption::Truncated`] if the symbols run out first.
pub fn parse(symbols: &[u8]) -> Result<Message, FrameCorruption> {
    let mut parser = FrameParser::new();
    for pair in symbols.chunks_exact(2) {
        let byte = decode_6b4b(pair[0], pair[1]).ok_or_else(|| {
            let code = if decode_symbol(pair[0]).is_none() {
                pair[0]
            } else {
                pair[1]
            };
            FrameCorruption::BadSymbol { code }
        })?;
        if let Some(message) = parser.push_byte(byte)? {
            return Ok(message);
        }
    }
    Err(FrameCorruption::Truncated)
}
