use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::length_prefix;
use crate::result::{Error, Result};
use crate::value::Value;

/// Raw bytes, either length-prefixed or zero-padded to a fixed byte
/// width. Carried as `Value::Bytes` in core; base64 only at the JSON
/// boundary (see [`crate::value::Value::to_json`]).
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DataField {
    pub(super) common: FieldCommon,
    size: u32,
    fixed: bool,
}

impl DataField {
    pub fn new(common: FieldCommon, size: u32, fixed: bool) -> Self {
        Self { common, size, fixed }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let data = value
            .as_bytes()
            .ok_or_else(|| Error::Input(format!("field '{}' expects bytes", self.common.name)))?;
        let mut bytes = data.to_vec();
        let limit = self.size as usize;
        bytes.truncate(limit);

        if self.fixed {
            bytes.resize(limit, 0x00);
            Ok(bitbuffer::append_bytes(&bytes, buffer, bit_offset))
        } else {
            let offset = length_prefix::encode(bytes.len(), buffer, bit_offset)?;
            Ok(bitbuffer::append_bytes(&bytes, buffer, offset))
        }
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let (len, offset) = if self.fixed {
            (self.size as usize, bit_offset)
        } else {
            length_prefix::decode(buffer, bit_offset)?
        };
        let bytes = bitbuffer::extract_bytes(buffer, offset, len)?;
        Ok((Value::Bytes(bytes), offset + len * 8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_data_is_zero_padded() {
        let field = DataField::new(FieldCommon::new("x").unwrap(), 4, true);
        let mut buffer = Vec::new();
        field.encode(&Value::Bytes(vec![1, 2]), &mut buffer, 0).unwrap();
        assert_eq!(buffer, vec![1, 2, 0, 0]);
    }

    #[test]
    fn variable_data_truncates_overflow_instead_of_rejecting() {
        let field = DataField::new(FieldCommon::new("x").unwrap(), 2, false);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Bytes(vec![0xAB, 0xCD, 0xEF]), &mut buffer, 0).unwrap();
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Bytes(vec![0xAB, 0xCD]), offset));
    }

    #[test]
    fn variable_data_roundtrips() {
        let field = DataField::new(FieldCommon::new("x").unwrap(), 255, false);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Bytes(vec![0xAB, 0xCD, 0xEF]), &mut buffer, 0).unwrap();
        assert_eq!(
            field.decode(&buffer, 0).unwrap(),
            (Value::Bytes(vec![0xAB, 0xCD, 0xEF]), offset)
        );
    }
}
