//! Byte-level bit utilities: reversal, the word checksum, and formatting.
//!
//! The checksum of a payload byte is its complement with the bit order
//! reversed:
//!
//! ```text
//! payload   0110 1000
//! ~payload  1001 0111
//! checksum  1110 1001
//! ```
//!
//! Both steps are bijections on `u8`, so two payloads that differ in any bit
//! (in particular any single-bit flip) never share a checksum.

/// Reverse the bit order of a byte.
///
/// Swaps nibbles, then bit pairs, then single bits. Self-inverse.
pub const fn reverse_byte(b: u8) -> u8 {
    let b = (b & 0b1111_0000) >> 4 | (b & 0b0000_1111) << 4;
    let b = (b & 0b1100_1100) >> 2 | (b & 0b0011_0011) << 2;
    (b & 0b1010_1010) >> 1 | (b & 0b0101_0101) << 1
}

/// Checksum byte stored next to `payload` in a word.
pub const fn checksum_of(payload: u8) -> u8 {
    reverse_byte(!payload)
}

/// Check a `(payload, checksum)` pair.
pub const fn verify(payload: u8, checksum: u8) -> bool {
    checksum == checksum_of(payload)
}

/// Render a value as `0b` followed by its binary digits, left-padded with
/// zeros to a whole number of bytes.
///
/// Used for log output.
pub fn binary_string(value: u32) -> String {
    let digits = format!("{value:b}");
    let width = digits.len().div_ceil(8) * 8;
    format!("0b{digits:0>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_known_values() {
        assert_eq!(reverse_byte(0b1000_0000), 0b0000_0001);
        assert_eq!(reverse_byte(0b1101_0010), 0b0100_1011);
        assert_eq!(reverse_byte(0x00), 0x00);
        assert_eq!(reverse_byte(0xFF), 0xFF);
    }

    #[test]
    fn test_reverse_is_self_inverse() {
        for b in 0..=255u8 {
            assert_eq!(reverse_byte(reverse_byte(b)), b);
        }
    }

    #[test]
    fn test_checksum_example() {
        // 'h' = 0110 1000 -> complement 1001 0111 -> reversed 1110 1001
        assert_eq!(checksum_of(0b0110_1000), 0b1110_1001);
        assert_eq!(checksum_of(0x80), 0xFE);
    }

    #[test]
    fn test_single_bit_sensitivity() {
        for b in 0..=255u8 {
            for k in 0..8 {
                let flipped = b ^ (1 << k);
                assert_ne!(checksum_of(b), checksum_of(flipped), "b={b:#04x} k={k}");
                assert!(!verify(flipped, checksum_of(b)));
            }
        }
    }

    #[test]
    fn test_verify() {
        for b in 0..=255u8 {
            assert!(verify(b, checksum_of(b)));
        }
        assert!(!verify(0x68, 0x68));
    }

    #[test]
    fn test_binary_string() {
        assert_eq!(binary_string(0), "0b00000000");
        assert_eq!(binary_string(0x05), "0b00000101");
        assert_eq!(binary_string(0xFF), "0b11111111");
        assert_eq!(binary_string(0x1FF), "0b0000000111111111");
    }
}
