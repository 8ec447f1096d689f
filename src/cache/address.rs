//! Address decomposition

use crate::error::GeometryError;

pub fn get_log_2(value: u64) -> u32 {
    assert!(value > 0);
    63 - value.leading_zeros()
}

pub fn is_pow_2(value: u64) -> bool {
    value != 0 && value & (value - 1) == 0
}

pub fn get_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Splits addresses into set index and tag.
///
/// Addresses are 64-bit and look like this:
/// | tag | set index | block offset |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_bits: u32,
    index_mask: u64,
}

impl AddressDecoder {
    pub fn new(num_sets: u64, block_size: u64) -> Result<Self, GeometryError> {
        if !is_pow_2(num_sets) {
            return Err(GeometryError::SetsNotPowerOfTwo(num_sets));
        }
        if !is_pow_2(block_size) {
            return Err(GeometryError::BlockSizeNotPowerOfTwo(block_size));
        }
        let index_bits = get_log_2(num_sets);
        Ok(Self {
            offset_bits: get_log_2(block_size),
            index_bits,
            index_mask: get_mask(index_bits),
        })
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn get_index(&self, address: u64) -> usize {
        ((address >> self.offset_bits) & self.index_mask) as usize
    }

    /// All bits above the set index. Shifting out the whole word leaves 0.
    pub fn get_tag(&self, address: u64) -> u64 {
        address
            .checked_shr(self.offset_bits + self.index_bits)
            .unwrap_or(0)
    }

    /// Returns `(set_index, tag)`
    pub fn decode(&self, address: u64) -> (usize, u64) {
        (self.get_index(address), self.get_tag(address))
    }
}

/// One-shot decoding for callers that do not keep a decoder around
pub fn decode(
    address: u64,
    num_sets: u64,
    block_size: u64,
) -> Result<(usize, u64), GeometryError> {
    Ok(AddressDecoder::new(num_sets, block_size)?.decode(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_2() {
        for n in 1..123457u64 {
            let expected = {
                let mut count = 0;
                let mut t = n;
                while t > 1 {
                    count += 1;
                    t >>= 1;
                }
                count
            };
            assert_eq!(expected, get_log_2(n));
        }
        assert_eq!(get_log_2(1 << 63), 63);
    }

    #[test]
    fn test_is_pow_2() {
        assert!(!is_pow_2(0));
        assert!(is_pow_2(1));
        assert!(is_pow_2(64));
        assert!(!is_pow_2(48));
        assert!(is_pow_2(1 << 63));
    }

    #[test]
    fn test_decode_fields() {
        // 4 sets, 16-byte blocks: 4 offset bits, 2 index bits
        let decoder = AddressDecoder::new(4, 16).unwrap();
        assert_eq!(decoder.decode(0x10), (1, 0));
        assert_eq!(decoder.decode(0x110), (1, 4));
        assert_eq!(decoder.decode(0x3f), (3, 0));
        assert_eq!(decoder.decode(0x7ff000388), (0, 0x7ff000388 >> 6));
    }

    #[test]
    fn test_degenerate_geometry() {
        // One set and one-byte blocks: everything is tag
        let decoder = AddressDecoder::new(1, 1).unwrap();
        assert_eq!(decoder.decode(0xdead_beef), (0, 0xdead_beef));
        assert_eq!(decoder.decode(u64::MAX), (0, u64::MAX));
    }

    #[test]
    fn test_tag_of_full_width_shift_is_zero() {
        let decoder = AddressDecoder::new(1 << 32, 1 << 32).unwrap();
        assert_eq!(decoder.get_tag(u64::MAX), 0);
        assert_eq!(decoder.get_index(u64::MAX), u32::MAX as usize);
    }

    #[test]
    fn test_invalid_geometry() {
        assert_eq!(
            AddressDecoder::new(3, 16),
            Err(GeometryError::SetsNotPowerOfTwo(3))
        );
        assert_eq!(
            AddressDecoder::new(4, 0),
            Err(GeometryError::BlockSizeNotPowerOfTwo(0))
        );
        assert_eq!(
            decode(0x10, 0, 16),
            Err(GeometryError::SetsNotPowerOfTwo(0))
        );
        assert_eq!(decode(0x10, 4, 16), Ok((1, 0)));
    }
}
