use derive_getters::Getters;

use super::{decode_fields, encode_fields, FieldCommon, Fields};
use crate::result::{Error, Result};
use crate::value::Value;

/// A fixed, declared list of inner fields emitted back-to-back; the
/// value is a mapping keyed by inner field name.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct StructField {
    pub(super) common: FieldCommon,
    fields: Fields,
}

impl StructField {
    pub fn new(common: FieldCommon, fields: Fields) -> Self {
        Self { common, fields }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a mapping", self.common.name)))?;
        encode_fields(&self.fields, map, buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let (map, offset) = decode_fields(&self.fields, buffer, bit_offset)?;
        Ok((Value::Map(map), offset))
    }
}
