//! Constants used across the link implementation.
//!
//! This module defines the protocol-wide constants used for buffer sizing,
//! frame layout, the training preamble, and the receiver's clock-recovery ramp.
//!
//! ## Key Concepts
//!
//! - **Message Limits**: a frame is at most 80 bytes, counting the length byte
//!   and the two checksum bytes, which leaves 77 bytes of payload.
//! - **Preamble**: 36 alternating training bits followed by a 12-bit start
//!   symbol, stored as eight 6-bit symbols so the transmitter can send them
//!   exactly like encoded data.
//! - **Ramp**: the receiver samples 8 times per bit and tracks its phase in a
//!   160-unit window, nudged early or late on every observed transition.
//! - **Buffer Sizing**: every byte becomes two symbols after 4b6b encoding.
//!
//! These values should be used wherever framing or buffer logic is implemented
//! so that both ends of the link agree on message boundaries and timing.

/// Maximum number of bytes in a frame, counting the length byte and checksum.
pub const MAX_MESSAGE_LEN: u8 = 80;

/// See [`MAX_MESSAGE_LEN`](crate::consts::MAX_MESSAGE_LEN)
pub const MAX_MESSAGE_LEN_USIZE: usize = MAX_MESSAGE_LEN as usize;

/// Bytes a frame adds around its payload: the length byte and a 2-byte checksum.
pub const FRAME_OVERHEAD: u8 = 3;

/// Smallest legal value of the length byte (an empty payload).
pub const MIN_MESSAGE_LEN: u8 = FRAME_OVERHEAD;

/// Maximum size (in bytes) of user payload carried by one frame.
pub const MAX_PAYLOAD_LEN: u8 = MAX_MESSAGE_LEN - FRAME_OVERHEAD;

/// See [`MAX_PAYLOAD_LEN`](crate::consts::MAX_PAYLOAD_LEN)
pub const MAX_PAYLOAD_LEN_USIZE: usize = MAX_PAYLOAD_LEN as usize;

/// Number of line bits carried by one encoded symbol.
pub const SYMBOL_BITS: u8 = 6;

/// Number of alternating training bits sent ahead of the start symbol.
pub const TRAINING_BITS: u8 = 36;

/// The start symbol as it appears in the receiver's 12-bit shift register.
///
/// It is sent as the two symbols `0x38`, `0x2c`, LSB first, so the first one
/// ends up in the low six bits.
pub const START_SYMBOL: u16 = 0xb38;

/// Width of the start symbol in bits.
pub const START_SYMBOL_BITS: u8 = 12;

/// Training preamble followed by the start symbol, as 6-bit symbols.
///
/// `0x2a` sent LSB first is `0 1 0 1 0 1`, so six of them give the 36
/// alternating training bits.
pub const PREAMBLE: [u8; PREAMBLE_LEN as usize] = [0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x38, 0x2c];

/// Length (in symbols) of [`PREAMBLE`](crate::consts::PREAMBLE).
pub const PREAMBLE_LEN: u8 = (TRAINING_BITS + START_SYMBOL_BITS) / SYMBOL_BITS;

/// Maximum number of encoded symbols in a frame.
pub const MAX_FRAME_SYMBOLS: usize = MAX_MESSAGE_LEN_USIZE * 2;

/// Maximum size (in symbols) of the full transmission buffer, preamble included.
pub const MAX_BUF_LEN_USIZE: usize = MAX_FRAME_SYMBOLS + PREAMBLE_LEN as usize;

/// Receiver samples taken per bit period.
pub const SAMPLES_PER_BIT: u8 = 8;

/// Size of the receiver ramp. The ramp wraps modulo this number, once per bit.
pub const RAMP_LEN: u16 = 160;

/// Ramp increment for a sample without a transition.
pub const RAMP_INC: u16 = RAMP_LEN / SAMPLES_PER_BIT as u16;

/// Transitions seen below this ramp value retard the ramp, at or above it advance it.
pub const RAMP_TRANSITION: u16 = RAMP_LEN / 2;

/// Correction applied to [`RAMP_INC`](crate::consts::RAMP_INC) on a transition.
pub const RAMP_ADJUST: u16 = 9;

/// Ramp increment for a transition in the first half of the window.
pub const RAMP_INC_RETARD: u16 = RAMP_INC - RAMP_ADJUST;

/// Ramp increment for a transition in the second half of the window.
pub const RAMP_INC_ADVANCE: u16 = RAMP_INC + RAMP_ADJUST;

/// High samples needed in one window for the bit to be read as a 1.
pub const INTEGRATOR_THRESHOLD: u8 = 5;

/// Samples without any transition after which the receiver drops lock.
///
/// 4b6b coding never produces more than four identical bits in a row, so
/// sixteen silent bit periods only happen once the transmitter has gone quiet.
pub const LOCK_TIMEOUT_TICKS: u16 = 16 * SAMPLES_PER_BIT as u16;

/// Default link speed in bits per second.
pub const DEFAULT_BIT_RATE: u16 = 2_000;

/// Length (in bytes) of the value record header: kind, source, digits, text length.
pub const VALUE_HEADER_LEN: u8 = 4;

/// Maximum length of the decimal text carried by a value record.
pub const MAX_VALUE_LEN: u8 = MAX_PAYLOAD_LEN - VALUE_HEADER_LEN;

/// See [`MAX_VALUE_LEN`](crate::consts::MAX_VALUE_LEN)
pub const MAX_VALUE_LEN_USIZE: usize = MAX_VALUE_LEN as usize;

/// Value record kind for temperature readings.
pub const TEMPERATURE_DATA_TYPE: u8 = 250;

/// Value record kind for light readings.
pub const LIGHT_DATA_TYPE: u8 = 251;
