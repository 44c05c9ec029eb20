//! Property-based round-trip tests (spec.md §8 "Property tests"):
//! randomized field sizes/values and randomized bit offsets must
//! round-trip identically, and truncated buffers must fail with a
//! `BufferError` rather than silently producing a wrong value.

use cbc_codec::field::{BoolField, FieldCommon, IntField, UintField};
use cbc_codec::Error;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn uint_field_round_trips_any_in_range_value(size_seed: u8, value_seed: u64) -> bool {
    let size = (size_seed % 64) as u32 + 1;
    let field = UintField::new(FieldCommon::new("x").unwrap(), size).unwrap();
    let max: u64 = if size >= 64 { u64::MAX } else { (1u64 << size) - 1 };
    let value = if max == u64::MAX { value_seed } else { value_seed % (max + 1) };

    let mut buffer = Vec::new();
    let offset = field.encode(&cbc_codec::Value::UInt(value), &mut buffer, 0).unwrap();
    let (decoded, end) = field.decode(&buffer, 0).unwrap();
    end == offset && decoded.as_u64() == Some(value)
}

#[quickcheck]
fn int_field_round_trips_any_in_range_value(size_seed: u8, value_seed: i64) -> bool {
    let size = (size_seed % 62) as u32 + 2;
    let field = IntField::new(FieldCommon::new("x").unwrap(), size).unwrap();
    let min = -(1i64 << (size - 1));
    let max = (1i64 << (size - 1)) - 1;
    let span = (max - min + 1) as i128;
    let value = min + (((value_seed as i128).rem_euclid(span)) as i64);

    let mut buffer = Vec::new();
    let offset = field.encode(&cbc_codec::Value::Int(value), &mut buffer, 0).unwrap();
    let (decoded, end) = field.decode(&buffer, 0).unwrap();
    end == offset && decoded == cbc_codec::Value::Int(value)
}

#[quickcheck]
fn bool_field_round_trips_at_any_bit_offset(prefix_len: u8, value: bool) -> bool {
    let offset = (prefix_len % 8) as usize;
    let field = BoolField::new(FieldCommon::new("x").unwrap());

    let mut buffer = Vec::new();
    let end = field.encode(&cbc_codec::Value::Bool(value), &mut buffer, offset).unwrap();
    let (decoded, decoded_end) = field.decode(&buffer, offset).unwrap();
    decoded_end == end && decoded == cbc_codec::Value::Bool(value)
}

#[test]
fn truncated_buffer_is_a_buffer_error_for_every_offset_in_a_byte() {
    let field = UintField::new(FieldCommon::new("x").unwrap(), 16).unwrap();
    for offset in 0..8usize {
        let buffer = vec![0u8; 1];
        let result = field.decode(&buffer, offset);
        assert!(matches!(result, Err(Error::Buffer(_))), "offset {offset} should fail to extract 16 bits from a 1-byte buffer");
    }
}
