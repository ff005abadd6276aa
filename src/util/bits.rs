//! # Bit Packing Utilities
//!
//! Coils and discrete inputs travel on the wire eight to a byte. Bit `i` of the
//! logical sequence lives in bit `i % 8` (LSB first) of byte `i / 8`; unused high
//! bits of the final byte are zero.
//!
//! ## Usage
//!
//! ```rust
//! use modbus_rtu_slave::util::bits::{pack_bits, unpack_bits};
//!
//! let coils = [false, true, false, true, false];
//! assert_eq!(pack_bits(&coils), vec![0x0A]);
//! assert_eq!(unpack_bits(&[0x0A], 5), coils);
//! ```

/// Number of bytes needed to carry `count` bits
#[inline]
pub fn packed_len(count: usize) -> usize {
    (count + 7) / 8
}

/// Pack a boolean sequence into bytes, LSB first
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; packed_len(bits.len())];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            bytes[i >> 3] |= 1 << (i & 0x07);
        }
    }
    bytes
}

/// Unpack `count` bits from `bytes`, LSB first
///
/// Bits beyond the end of `bytes` read as `false`.
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| {
            bytes
                .get(i >> 3)
                .map_or(false, |byte| byte & (1 << (i & 0x07)) != 0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(0), 0);
        assert_eq!(packed_len(1), 1);
        assert_eq!(packed_len(8), 1);
        assert_eq!(packed_len(9), 2);
        assert_eq!(packed_len(2000), 250);
    }

    #[test]
    fn test_pack_lsb_first() {
        assert_eq!(pack_bits(&[true]), vec![0x01]);
        assert_eq!(pack_bits(&[false, false, false, false, false, false, false, true]), vec![0x80]);
        // Spans two bytes, unused high bits of the last one stay clear
        let bits = [true, false, true, true, false, false, true, true, true, false];
        assert_eq!(pack_bits(&bits), vec![0xCD, 0x01]);
    }

    #[test]
    fn test_pack_empty() {
        assert!(pack_bits(&[]).is_empty());
        assert!(unpack_bits(&[], 0).is_empty());
    }

    #[test]
    fn test_unpack_ignores_padding() {
        assert_eq!(unpack_bits(&[0xFF], 3), vec![true, true, true]);
    }

    #[test]
    fn test_unpack_short_input() {
        assert_eq!(unpack_bits(&[0x01], 10)[8..], [false, false]);
    }

    #[test]
    fn test_round_trip_every_length() {
        for n in 0..=2000usize {
            let bits: Vec<bool> = (0..n).map(|i| (i * 7 + n) % 3 == 0).collect();
            let packed = pack_bits(&bits);
            assert_eq!(packed.len(), packed_len(n));
            assert_eq!(unpack_bits(&packed, n), bits, "length {n}");
        }
    }

    proptest! {
        #[test]
        fn prop_pack_unpack(bits in proptest::collection::vec(any::<bool>(), 0..=2000)) {
            let packed = pack_bits(&bits);
            prop_assert_eq!(unpack_bits(&packed, bits.len()), bits);
        }
    }
}
