//! CRC-32C (Castagnoli) integrity codes.
//!
//! Detects accidental corruption only. An attacker who can rewrite a packet can
//! rewrite its checksum too.

use crate::config::CHECKSUM_LEN;

/// CRC-32C of `data` as a number.
#[inline]
pub fn crc32c_value(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// CRC-32C of `data` in wire order (little-endian).
#[inline]
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    crc32c_value(data).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(checksum(&[]), [0u8; 4]);
    }

    #[test]
    fn test_known_vector() {
        // RFC 3720 B.4 check value
        assert_eq!(crc32c_value(b"123456789"), 0xE306_9283);
        assert_eq!(checksum(b"123456789"), [0x83, 0x92, 0x06, 0xE3]);
    }

    #[test]
    fn test_deterministic_and_distinct() {
        let a = [0xFFu8; 4];
        let b = [0xDAu8; 4];
        assert_eq!(checksum(&a), checksum(&a));
        assert_ne!(checksum(&a), checksum(&b));
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(checksum(&[1, 2, 3, 4]), checksum(&[4, 3, 2, 1]));
    }
}
