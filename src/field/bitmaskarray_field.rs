use std::collections::BTreeMap;

use derive_getters::Getters;

use super::{decode_fields, encode_fields, EnumTable, FieldCommon, Fields};
use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// A `size`-bit mask selecting which enum-keyed categories are present,
/// followed by one row per set bit in ascending bit-index order (no
/// per-category count on the wire — popcount of the mask equals the
/// total row count, per the documented resolution of the mask/row
/// ambiguity in the source this codec is modeled on).
///
/// Each present category carries exactly one row, expressed as a
/// single-element list to match the outward API shape of an ordinary
/// array field; a category needing more than one row should nest an
/// `array` field inside its row instead.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct BitmaskArrayField {
    pub(super) common: FieldCommon,
    size: u32,
    variants: EnumTable,
    fields: Fields,
}

impl BitmaskArrayField {
    pub fn new(common: FieldCommon, size: u32, variants: EnumTable, fields: Fields) -> Self {
        Self { common, size, variants, fields }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a mapping", self.common.name)))?;

        let mut present: Vec<(i64, &Value)> = Vec::with_capacity(map.len());
        let mut mask: i64 = 0;
        for (name, rows) in map {
            let key = self.variants.key_for(name).ok_or_else(|| {
                Error::Input(format!(
                    "field '{}' has no bitmaskarray category named '{name}'",
                    self.common.name
                ))
            })?;
            mask |= 1 << key;
            present.push((key, rows));
        }
        present.sort_by_key(|(key, _)| *key);

        let bits = bitbuffer::bits_from_uint(mask as u64, self.size as usize);
        let mut offset = bitbuffer::append_bits(&bits, buffer, bit_offset)?;

        for (_, rows) in present {
            let list = rows.as_list().ok_or_else(|| {
                Error::Input(format!(
                    "field '{}' category value must be a one-element list",
                    self.common.name
                ))
            })?;
            if list.len() != 1 {
                return Err(Error::Input(format!(
                    "field '{}' category must carry exactly one row, got {}",
                    self.common.name,
                    list.len()
                )));
            }
            let row_map = list[0].as_map().cloned().ok_or_else(|| {
                Error::Input(format!("field '{}' row must be a mapping", self.common.name))
            })?;
            offset = encode_fields(&self.fields, &row_map, buffer, offset)?;
        }
        Ok(offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let mask = bitbuffer::extract(buffer, bit_offset, self.size as usize, false)?;
        let mut offset = bit_offset + self.size as usize;
        let mut out = BTreeMap::new();

        for bit in 0..self.size {
            if mask & (1 << bit) == 0 {
                continue;
            }
            let name = self.variants.name_for(bit as i64).ok_or_else(|| {
                Error::Buffer(format!(
                    "field '{}' decoded mask bit {bit} with no declared category",
                    self.common.name
                ))
            })?;
            let (row_map, next) = decode_fields(&self.fields, buffer, offset)?;
            out.insert(name.to_string(), Value::List(vec![Value::Map(row_map)]));
            offset = next;
        }
        Ok((Value::Map(out), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, UintField};

    fn three_category_field() -> BitmaskArrayField {
        let variants = EnumTable::new(
            [(0, "c1".to_string()), (1, "c2".to_string()), (2, "c3".to_string())],
            3,
        )
        .unwrap();
        let fields = Fields::new(vec![
            Field::Uint(UintField::new(FieldCommon::new("s").unwrap(), 4).unwrap()),
            Field::Uint(UintField::new(FieldCommon::new("f").unwrap(), 4).unwrap()),
        ])
        .unwrap();
        BitmaskArrayField::new(FieldCommon::new("ba").unwrap(), 3, variants, fields)
    }

    #[test]
    fn encodes_the_documented_example() {
        let field = three_category_field();
        let mut row = BTreeMap::new();
        row.insert("s".to_string(), Value::Int(3));
        row.insert("f".to_string(), Value::Int(1));
        let mut value = BTreeMap::new();
        value.insert("c1".to_string(), Value::List(vec![Value::Map(row)]));

        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Map(value.clone()), &mut buffer, 0).unwrap();
        assert_eq!(offset, 3 + 8);
        // mask 0b001 then the row 0x31, packed MSB-first across 2 bytes.
        assert_eq!(buffer, vec![0b0010_0110, 0b0010_0000]);
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Map(value), offset));
    }

    #[test]
    fn row_count_on_wire_equals_popcount() {
        let field = three_category_field();
        let mut row = BTreeMap::new();
        row.insert("s".to_string(), Value::Int(1));
        row.insert("f".to_string(), Value::Int(2));
        let mut value = BTreeMap::new();
        value.insert("c1".to_string(), Value::List(vec![Value::Map(row.clone())]));
        value.insert("c3".to_string(), Value::List(vec![Value::Map(row)]));

        let mut buffer = Vec::new();
        field.encode(&Value::Map(value), &mut buffer, 0).unwrap();
        let mask = bitbuffer::extract(&buffer, 0, 3, false).unwrap();
        assert_eq!(mask.count_ones(), 2);
    }
}
