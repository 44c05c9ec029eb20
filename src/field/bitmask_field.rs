use derive_getters::Getters;

use super::{EnumTable, FieldCommon};
use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// `size` bits, one per declared named bit position; accepts either an
/// integer mask or a list of set value names at encode time and always
/// decodes to the sorted list of set names.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct BitmaskField {
    pub(super) common: FieldCommon,
    size: u32,
    variants: EnumTable,
}

impl BitmaskField {
    pub fn new(common: FieldCommon, size: u32, variants: EnumTable) -> Self {
        Self { common, size, variants }
    }

    fn mask_from_value(&self, value: &Value) -> Result<u64> {
        match value {
            Value::Int(mask) if *mask >= 0 => Ok(*mask as u64),
            Value::UInt(mask) => Ok(*mask),
            Value::List(names) => {
                let mut mask: u64 = 0;
                for name in names {
                    let name = name.as_str().ok_or_else(|| {
                        Error::Input(format!("field '{}' expects a list of strings", self.common.name))
                    })?;
                    let key = self.variants.key_for(name).ok_or_else(|| {
                        Error::Input(format!(
                            "field '{}' has no bitmask value named '{name}'",
                            self.common.name
                        ))
                    })?;
                    mask |= 1u64 << key;
                }
                Ok(mask)
            }
            _ => Err(Error::Input(format!(
                "field '{}' expects a non-negative integer mask or a list of value names",
                self.common.name
            ))),
        }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let mask = self.mask_from_value(value)?;
        let max = if self.size >= 64 { u64::MAX } else { (1u64 << self.size) - 1 };
        if mask > max {
            return Err(Error::Range(format!(
                "field '{}' mask {mask} out of range 0..={max}",
                self.common.name
            )));
        }
        let bits = bitbuffer::bits_from_uint(mask, self.size as usize);
        bitbuffer::append_bits(&bits, buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let mask = bitbuffer::extract_u64(buffer, bit_offset, self.size as usize)?;
        let mut names = Vec::new();
        for bit in 0..self.size {
            if mask & (1u64 << bit) != 0 {
                if let Some(name) = self.variants.name_for(bit as i64) {
                    names.push(Value::Str(name.to_string()));
                }
            }
        }
        Ok((Value::List(names), bit_offset + self.size as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_list_of_names() {
        let variants =
            EnumTable::new([(0, "a".to_string()), (1, "b".to_string()), (2, "c".to_string())], 3).unwrap();
        let field = BitmaskField::new(FieldCommon::new("x").unwrap(), 3, variants);
        let mut buffer = Vec::new();
        let value = Value::List(vec![Value::Str("a".into()), Value::Str("c".into())]);
        let offset = field.encode(&value, &mut buffer, 0).unwrap();
        let (decoded, end) = field.decode(&buffer, 0).unwrap();
        assert_eq!(end, offset);
        assert_eq!(decoded, Value::List(vec![Value::Str("a".into()), Value::Str("c".into())]));
    }

    #[test]
    fn size_64_accepts_a_mask_with_bit_63_set() {
        let variants = EnumTable::new([(63, "top".to_string())], 64).unwrap();
        let field = BitmaskField::new(FieldCommon::new("x").unwrap(), 64, variants);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::UInt(1u64 << 63), &mut buffer, 0).unwrap();
        let (decoded, end) = field.decode(&buffer, 0).unwrap();
        assert_eq!(end, offset);
        assert_eq!(decoded, Value::List(vec![Value::Str("top".into())]));
    }
}
