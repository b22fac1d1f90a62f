//! CCITT CRC-16 as used for the frame check sequence.
//!
//! The update step is the classic byte-wise form of the reflected CCITT
//! polynomial (0x8408). A frame's checksum is the ones complement of the CRC
//! over the length byte and payload, starting from `0xffff`, and is sent low
//! byte first.

/// Initial CRC register value.
pub(crate) const CRC_INIT: u16 = 0xffff;

pub(crate) fn crc_ccitt_update(crc: u16, data: u8) -> u16 {
    let mut d = u16::from(data);
    d ^= lo8(crc);
    d ^= d << 4;
    d &= 0xff;

    ((d << 8) | hi8(crc)) ^ (d >> 4) ^ (d << 3)
}

pub(crate) fn lo8(x: u16) -> u16 {
    x & 0xff
}

pub(crate) fn hi8(x: u16) -> u16 {
    x >> 8
}

/// Computes the checksum carried at the end of a frame with the given length
/// byte and payload.
pub fn checksum(length: u8, payload: &[u8]) -> u16 {
    !payload
        .iter()
        .fold(crc_ccitt_update(CRC_INIT, length), |crc, &b| {
            crc_ccitt_update(crc, b)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Register value after a whole frame, checksum included.
    const CRC_RESIDUE: u16 = 0xf0b8;

    #[test]
    fn test_check_value() {
        let crc = b"123456789"
            .iter()
            .fold(CRC_INIT, |crc, &b| crc_ccitt_update(crc, b));
        assert_eq!(!crc, 0x906e);
    }

    #[test]
    fn test_frame_checksum() {
        assert_eq!(checksum(6, &[0x01, 0x02, 0x03]), 0xecb3);
        assert_eq!(checksum(3, &[]), 0xc2e3);
    }

    #[test]
    fn test_residue_after_checksum() {
        let fcs = checksum(6, &[0x01, 0x02, 0x03]).to_le_bytes();
        let crc = [6, 0x01, 0x02, 0x03, fcs[0], fcs[1]]
            .iter()
            .fold(CRC_INIT, |crc, &b| crc_ccitt_update(crc, b));
        assert_eq!(crc, CRC_RESIDUE);
    }
}
