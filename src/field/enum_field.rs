use derive_getters::Getters;

use super::{EnumTable, FieldCommon};
use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// `size` bits holding the ordinal of one of a declared set of named
/// values.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct EnumField {
    pub(super) common: FieldCommon,
    size: u32,
    variants: EnumTable,
}

impl EnumField {
    pub fn new(common: FieldCommon, size: u32, variants: EnumTable) -> Self {
        Self { common, size, variants }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let name = value
            .as_str()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a string", self.common.name)))?;
        let key = self.variants.key_for(name).ok_or_else(|| {
            Error::Input(format!("field '{}' has no enum value named '{name}'", self.common.name))
        })?;
        let bits = bitbuffer::bits_from_uint(key as u64, self.size as usize);
        bitbuffer::append_bits(&bits, buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let key = bitbuffer::extract(buffer, bit_offset, self.size as usize, false)?;
        let name = self.variants.name_for(key).ok_or_else(|| {
            Error::Buffer(format!(
                "field '{}' decoded undeclared enum ordinal {key}",
                self.common.name
            ))
        })?;
        Ok((Value::Str(name.to_string()), bit_offset + self.size as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_known_variant() {
        let variants = EnumTable::new([(0, "zero".to_string()), (1, "one".to_string())], 5).unwrap();
        let field = EnumField::new(FieldCommon::new("x").unwrap(), 5, variants);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Str("one".into()), &mut buffer, 0).unwrap();
        assert_eq!(offset, 5);
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Str("one".into()), 5));
    }

    #[test]
    fn rejects_unknown_ordinal_on_decode() {
        let variants = EnumTable::new([(0, "zero".to_string())], 5).unwrap();
        let field = EnumField::new(FieldCommon::new("x").unwrap(), 5, variants);
        let buffer = vec![0b00001000];
        assert!(field.decode(&buffer, 0).is_err());
    }
}
