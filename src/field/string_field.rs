use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::length_prefix;
use crate::result::{Error, Result};
use crate::value::Value;

const PAD_BYTE: u8 = 0x20;

/// UTF-8 text, either length-prefixed or space-padded to a fixed byte
/// width.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct StringField {
    pub(super) common: FieldCommon,
    size: u32,
    fixed: bool,
}

impl StringField {
    pub fn new(common: FieldCommon, size: u32, fixed: bool) -> Self {
        Self { common, size, fixed }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let text = value
            .as_str()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a string", self.common.name)))?;
        let mut bytes = text.as_bytes().to_vec();
        let limit = self.size as usize;
        bytes.truncate(limit);

        if self.fixed {
            bytes.resize(limit, PAD_BYTE);
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
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::Buffer(format!("field '{}' is not valid UTF-8: {e}", self.common.name)))?;
        Ok((Value::Str(text), offset + len * 8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strings_are_space_padded() {
        let field = StringField::new(FieldCommon::new("x").unwrap(), 5, true);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Str("hi".into()), &mut buffer, 0).unwrap();
        assert_eq!(offset, 40);
        assert_eq!(buffer, b"hi   ");
    }

    #[test]
    fn variable_strings_carry_a_length_prefix() {
        let field = StringField::new(FieldCommon::new("x").unwrap(), 50, false);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Str("hello".into()), &mut buffer, 0).unwrap();
        assert_eq!(offset, 8 + 40);
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Str("hello".into()), offset));
    }

    #[test]
    fn variable_strings_truncate_overflow_instead_of_rejecting() {
        let field = StringField::new(FieldCommon::new("x").unwrap(), 2, false);
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Str("hello".into()), &mut buffer, 0).unwrap();
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Str("he".into()), offset));
    }
}
