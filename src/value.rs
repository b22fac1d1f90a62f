//! Typed sensor readings carried as datagram payloads.
//!
//! A value record is a small header followed by the decimal rendering of a
//! float:
//!
//! ```text
//! +----------+------------+------------+--------------+------------------+
//! | kind (1) | source (1) | digits (1) | text len (1) | text (0..=73)    |
//! +----------+------------+------------+--------------+------------------+
//! ```
//!
//! `digits` is the number of fractional digits the sender rendered. Text keeps
//! the record readable on any receiver without agreeing on a float layout.

use core::fmt::Write;

use heapless::String;

use crate::consts::{
    LIGHT_DATA_TYPE, MAX_VALUE_LEN_USIZE, TEMPERATURE_DATA_TYPE, VALUE_HEADER_LEN,
};
use crate::error::ValueError;
use crate::framer::Payload;

/// What a value record measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ValueKind {
    /// Temperature reading.
    Temperature,
    /// Light level reading.
    Light,
    /// Application-defined kind.
    Other(u8),
}

impl From<u8> for ValueKind {
    fn from(raw: u8) -> Self {
        match raw {
            TEMPERATURE_DATA_TYPE => Self::Temperature,
            LIGHT_DATA_TYPE => Self::Light,
            other => Self::Other(other),
        }
    }
}

impl From<ValueKind> for u8 {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Temperature => TEMPERATURE_DATA_TYPE,
            ValueKind::Light => LIGHT_DATA_TYPE,
            ValueKind::Other(raw) => raw,
        }
    }
}

/// A float reading tagged with its kind and source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    kind: ValueKind,
    source: u8,
    digits: u8,
    text: String<MAX_VALUE_LEN_USIZE>,
}

impl ValueRecord {
    /// Renders `value` with `digits` fractional digits.
    ///
    /// # Errors
    /// [`ValueError::NotFinite`] for NaN or infinities, [`ValueError::TooLong`]
    /// if the rendering does not fit in a frame.
    pub fn new(value: f32, digits: u8, kind: ValueKind, source: u8) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite);
        }
        let mut text = String::new();
        write!(text, "{:.*}", usize::from(digits), value).map_err(|_| ValueError::TooLong)?;
        Ok(Self {
            kind,
            source,
            digits,
            text,
        })
    }

    /// The record's kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Identifier of the sensor that produced the reading.
    pub fn source(&self) -> u8 {
        self.source
    }

    /// Fractional digits in the rendering.
    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// The decimal rendering as sent.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parses the rendering back into a float.
    pub fn value(&self) -> Option<f32> {
        self.text.parse().ok()
    }

    /// Lays the record out as a datagram payload.
    pub fn encode(&self) -> Payload {
        let mut payload = Payload::new();
        // Header plus text never exceeds the payload capacity.
        let _ = payload.extend_from_slice(&[
            self.kind.into(),
            self.source,
            self.digits,
            self.text.len() as u8,
        ]);
        let _ = payload.extend_from_slice(self.text.as_bytes());
        payload
    }

    /// Reads a record from a received payload.
    ///
    /// # Errors
    /// [`ValueError::Malformed`] if the header is short, the text length does
    /// not match the payload, or the text is not UTF-8.
    pub fn decode(payload: &[u8]) -> Result<Self, ValueError> {
        let (header, body) = payload
            .split_at_checked(usize::from(VALUE_HEADER_LEN))
            .ok_or(ValueError::Malformed)?;
        let &[kind, source, digits, len] = header else {
            return Err(ValueError::Malformed);
        };
        if usize::from(len) != body.len() {
            return Err(ValueError::Malformed);
        }
        let text = core::str::from_utf8(body).map_err(|_| ValueError::Malformed)?;
        Ok(Self {
            kind: kind.into(),
            source,
            digits,
            text: String::try_from(text).map_err(|_| ValueError::Malformed)?,
        })
    }
}
