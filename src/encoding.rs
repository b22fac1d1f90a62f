//! 4b6b symbol encoding and decoding.
//!
//! This module implements the DC-balanced 4-to-6 bit code used on the wire.
//! Every byte is carried as two 6-bit symbols, high nibble first.
//!
//! ## Purpose
//!
//! ASK/OOK links are susceptible to long runs of 0s or 1s, which starve the
//! receiver's clock recovery of transitions. 4b6b encoding:
//!
//! - Ensures **DC balance**: each 6-bit symbol has 3 ones and 3 zeroes
//! - Limits runs of identical bits to 3 inside a symbol and 4 across two
//! - Facilitates reliable ramp alignment on the receiver side
//!
//! ## Symbol Table
//!
//! The encoder maps each 4-bit nibble to a unique 6-bit balanced symbol taken
//! from a fixed lookup table. The decoder uses a reverse table built from it at
//! compile time. Only 16 of the 64 possible 6-bit values are valid; the rest
//! decode to `None`, which the receiver treats as frame corruption.

/// Nibble to symbol table.
pub const SYMBOLS: [u8; 16] = [
    0xd, 0xe, 0x13, 0x15, 0x16, 0x19, 0x1a, 0x1c, 0x23, 0x25, 0x26, 0x29, 0x2a, 0x2c, 0x32, 0x34,
];

static REV_SYMBOLS: [Option<u8>; 64] = reverse_table();

const fn reverse_table() -> [Option<u8>; 64] {
    let mut table = [None; 64];
    let mut nibble = 0;
    while nibble < SYMBOLS.len() {
        table[SYMBOLS[nibble] as usize] = Some(nibble as u8);
        nibble += 1;
    }
    table
}

/// Encodes the low four bits of `nibble` as a 6-bit symbol.
pub fn encode_nibble(nibble: u8) -> u8 {
    SYMBOLS[usize::from(nibble & 0x0f)]
}

/// Decodes a 6-bit symbol back to its nibble.
///
/// Returns `None` for any value that is not in the symbol table.
pub fn decode_symbol(code: u8) -> Option<u8> {
    REV_SYMBOLS.get(usize::from(code)).copied().flatten()
}

/// Encodes an 8-bit byte into two 6-bit symbols, high nibble first.
pub fn encode_4b6b(byte: u8) -> [u8; 2] {
    [encode_nibble(byte >> 4), encode_nibble(byte)]
}

/// Decodes two 6-bit symbols back into the original byte.
///
/// Returns `None` if either symbol is invalid (not part of the encoding table).
pub fn decode_6b4b(sym_hi: u8, sym_lo: u8) -> Option<u8> {
    let high = decode_symbol(sym_hi)?;
    let low = decode_symbol(sym_lo)?;
    Some((high << 4) | low)
}
