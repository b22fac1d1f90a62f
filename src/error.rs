//! Error kinds for the link.
//!
//! Only [`LinkError`] and [`ValueError`] are ever returned to callers.
//! [`FrameCorruption`] describes why the receiver abandoned a frame; it is
//! handled inside the demodulator and only surfaces through the bad-frame
//! counter and the logs, because loss and corruption are the normal state of
//! an unreliable radio link.

use thiserror::Error;

/// Errors returned by the caller-facing link operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkError {
    /// The payload does not fit in a single frame.
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: usize,
        /// Largest payload a frame can carry.
        max: usize,
    },

    /// A transmission is already in flight.
    #[error("a transmission is already in progress")]
    Busy,

    /// The operation needs the receiver stopped and the transmitter idle.
    #[error("link must be stopped and idle")]
    Running,

    /// The requested bit rate cannot drive the tick timers.
    #[error("invalid bit rate {0} bps")]
    InvalidBitRate(u16),

    /// A value record could not be built.
    #[error("value record: {0}")]
    Value(#[from] ValueError),
}

/// Reasons the receiver drops or flags a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameCorruption {
    /// The length byte is outside the legal range.
    #[error("length byte {0} outside [3, 80]")]
    BadLength(u8),

    /// A 6-bit code that is not in the symbol table.
    #[error("unrecognised symbol {code:#04x}")]
    BadSymbol {
        /// The offending code.
        code: u8,
    },

    /// The received checksum does not match the payload.
    #[error("checksum mismatch: expected {expected:#06x}, received {received:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the received length and payload.
        expected: u16,
        /// Checksum carried by the frame.
        received: u16,
    },

    /// The symbol stream ended (or lock was lost) before the frame completed.
    #[error("frame truncated")]
    Truncated,
}

/// Errors building or reading a value record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ValueError {
    /// NaN and infinities have no decimal rendering.
    #[error("value is not finite")]
    NotFinite,

    /// The decimal rendering does not fit in one frame.
    #[error("rendered value too long")]
    TooLong,

    /// The payload is not a well-formed value record.
    #[error("malformed value record")]
    Malformed,
}
