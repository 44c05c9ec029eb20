use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// A single wire bit, `1` meaning true.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct BoolField {
    pub(super) common: FieldCommon,
}

impl BoolField {
    pub fn new(common: FieldCommon) -> Self {
        Self { common }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let b = value
            .as_bool()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a bool", self.common.name)))?;
        bitbuffer::append_bits(&[b as u8], buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let bit = bitbuffer::extract(buffer, bit_offset, 1, false)?;
        Ok((Value::Bool(bit != 0), bit_offset + 1))
    }
}
