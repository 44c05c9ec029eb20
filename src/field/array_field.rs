use std::collections::BTreeMap;

use derive_getters::Getters;

use super::{decode_fields, encode_fields, FieldCommon, Fields};
use crate::length_prefix;
use crate::result::{Error, Result};
use crate::value::Value;

/// A sequence of up to `size` rows, each row a concatenation of the
/// same inner field list. Length-prefixed unless `fixed`, in which case
/// exactly `size` rows are always present on the wire (short input
/// sequences are padded with all-absent rows).
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ArrayField {
    pub(super) common: FieldCommon,
    size: u32,
    fixed: bool,
    fields: Fields,
}

impl ArrayField {
    pub fn new(common: FieldCommon, size: u32, fixed: bool, fields: Fields) -> Self {
        Self { common, size, fixed, fields }
    }

    /// A row may be given as a bare scalar when the array has exactly
    /// one inner field; otherwise it must be a mapping.
    fn normalize_row(&self, row: &Value) -> Result<BTreeMap<String, Value>> {
        if self.fields.len() == 1 && !matches!(row, Value::Map(_)) {
            let only = self.fields.iter().next().expect("length checked above");
            let mut map = BTreeMap::new();
            map.insert(only.name().to_string(), row.clone());
            return Ok(map);
        }
        row.as_map()
            .cloned()
            .ok_or_else(|| Error::Input(format!("field '{}' row must be a mapping", self.common.name)))
    }

    fn denormalize_row(&self, map: BTreeMap<String, Value>) -> Value {
        if self.fields.len() == 1 {
            let only_name = self.fields.iter().next().expect("length checked above").name();
            if let Some(value) = map.into_iter().find(|(k, _)| k == only_name).map(|(_, v)| v) {
                return value;
            }
        }
        Value::Map(map)
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let rows = value
            .as_list()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a list", self.common.name)))?;
        let limit = self.size as usize;
        if !self.fixed && rows.len() > limit {
            return Err(Error::Input(format!(
                "field '{}' has {} rows, exceeds max {}",
                self.common.name,
                rows.len(),
                self.size
            )));
        }
        let rows = if rows.len() > limit { &rows[..limit] } else { rows };

        let mut offset = bit_offset;
        if !self.fixed {
            offset = length_prefix::encode(rows.len(), buffer, offset)?;
        }
        for row in rows {
            let row_map = self.normalize_row(row)?;
            offset = encode_fields(&self.fields, &row_map, buffer, offset)?;
        }
        if self.fixed {
            for _ in rows.len()..limit {
                offset = encode_fields(&self.fields, &BTreeMap::new(), buffer, offset)?;
            }
        }
        Ok(offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let (row_count, mut offset) = if self.fixed {
            (self.size as usize, bit_offset)
        } else {
            length_prefix::decode(buffer, bit_offset)?
        };

        let mut rows = Vec::with_capacity(row_count);
        for _ in 0..row_count {
            let (map, next) = decode_fields(&self.fields, buffer, offset)?;
            rows.push(self.denormalize_row(map));
            offset = next;
        }
        Ok((Value::List(rows), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, UintField};

    fn single_field_array(size: u32, fixed: bool) -> ArrayField {
        let inner_common = if fixed {
            FieldCommon::new("n").unwrap().optional(true)
        } else {
            FieldCommon::new("n").unwrap()
        };
        let fields = Fields::new(vec![Field::Uint(UintField::new(inner_common, 4).unwrap())]).unwrap();
        ArrayField::new(FieldCommon::new("arr").unwrap(), size, fixed, fields)
    }

    #[test]
    fn single_inner_field_rows_accept_scalars() {
        let field = single_field_array(4, false);
        let value = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let mut buffer = Vec::new();
        let offset = field.encode(&value, &mut buffer, 0).unwrap();
        assert_eq!(field.decode(&buffer, 0).unwrap(), (value, offset));
    }

    #[test]
    fn fixed_arrays_pad_short_input_with_empty_rows() {
        let field = single_field_array(3, true);
        let value = Value::List(vec![Value::Int(1)]);
        let mut buffer = Vec::new();
        let offset = field.encode(&value, &mut buffer, 0).unwrap();
        let (decoded, end) = field.decode(&buffer, 0).unwrap();
        assert_eq!(end, offset);
        assert_eq!(decoded, Value::List(vec![Value::Int(1), Value::Map(BTreeMap::new()), Value::Map(BTreeMap::new())]));
    }

    #[test]
    fn fixed_arrays_truncate_excess_rows_instead_of_rejecting() {
        let field = single_field_array(2, true);
        let value = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let mut buffer = Vec::new();
        let offset = field.encode(&value, &mut buffer, 0).unwrap();
        let (decoded, end) = field.decode(&buffer, 0).unwrap();
        assert_eq!(end, offset);
        assert_eq!(decoded, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn rejects_more_rows_than_size() {
        let field = single_field_array(1, false);
        let value = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let mut buffer = Vec::new();
        assert!(field.encode(&value, &mut buffer, 0).is_err());
    }
}
