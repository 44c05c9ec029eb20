//! The self-describing length prefix used ahead of every variable-width
//! field's payload: a 1-bit extension flag followed by either 7 or 15
//! value bits.

use crate::bitbuffer;
use crate::constants::{LENGTH_PREFIX_MAX, LENGTH_PREFIX_SHORT_MAX};
use crate::result::{Error, Result};

/// Appends the length prefix for `length` to `buffer` at `bit_offset`,
/// choosing the 7-bit (flag=0) or 15-bit (flag=1) form automatically.
/// Returns the bit offset immediately after the prefix.
pub fn encode(length: usize, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
    if length > LENGTH_PREFIX_MAX {
        return Err(Error::Range(format!(
            "length {length} exceeds the maximum length-prefix value {LENGTH_PREFIX_MAX}"
        )));
    }
    let mut bits = Vec::with_capacity(16);
    if length <= LENGTH_PREFIX_SHORT_MAX {
        bits.push(0);
        bits.extend(bitbuffer::bits_from_uint(length as u64, 7));
    } else {
        bits.push(1);
        bits.extend(bitbuffer::bits_from_uint(length as u64, 15));
    }
    bitbuffer::append_bits(&bits, buffer, bit_offset)
}

/// Reads a length prefix at `bit_offset`. Returns `(length, bit offset
/// after the prefix)`.
pub fn decode(buffer: &[u8], bit_offset: usize) -> Result<(usize, usize)> {
    let flag = bitbuffer::extract(buffer, bit_offset, 1, false)?;
    if flag == 0 {
        let length = bitbuffer::extract(buffer, bit_offset + 1, 7, false)?;
        Ok((length as usize, bit_offset + 8))
    } else {
        let length = bitbuffer::extract(buffer, bit_offset + 1, 15, false)?;
        Ok((length as usize, bit_offset + 16))
    }
}

/// The number of bits a prefix for `length` will occupy on the wire.
pub fn prefix_bits(length: usize) -> usize {
    if length <= LENGTH_PREFIX_SHORT_MAX {
        8
    } else {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_short_form_under_128() {
        let mut buffer = Vec::new();
        let end = encode(100, &mut buffer, 0).unwrap();
        assert_eq!(end, 8);
        assert_eq!(decode(&buffer, 0).unwrap(), (100, 8));
    }

    #[test]
    fn uses_extended_form_at_and_above_128() {
        let mut buffer = Vec::new();
        let end = encode(128, &mut buffer, 0).unwrap();
        assert_eq!(end, 16);
        assert_eq!(decode(&buffer, 0).unwrap(), (128, 16));
    }

    #[test]
    fn rejects_lengths_above_the_maximum() {
        let mut buffer = Vec::new();
        assert!(encode(LENGTH_PREFIX_MAX + 1, &mut buffer, 0).is_err());
    }

    #[test]
    fn encodes_from_a_misaligned_offset() {
        let mut buffer = Vec::new();
        bitbuffer::append_bits(&[1, 0, 1], &mut buffer, 0).unwrap();
        let end = encode(5, &mut buffer, 3).unwrap();
        assert_eq!(decode(&buffer, 3).unwrap(), (5, end));
    }
}
