use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// IEEE-754 big-endian, 32 or 64 bits. `precision`, when set, rounds
/// (ties to even) only the user-facing decoded value; the wire
/// encoding is always the exact bit pattern of the input.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct FloatField {
    pub(super) common: FieldCommon,
    size: u32,
    precision: Option<u32>,
}

impl FloatField {
    pub fn new(common: FieldCommon, size: u32) -> Result<Self> {
        if size != 32 && size != 64 {
            return Err(Error::Schema(format!(
                "float field '{}' has invalid size {size}, expected 32 or 64",
                common.name
            )));
        }
        Ok(Self { common, size, precision: None })
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let raw = value
            .as_f64()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a number", self.common.name)))?;
        let bytes: Vec<u8> = if self.size == 32 {
            (raw as f32).to_be_bytes().to_vec()
        } else {
            raw.to_be_bytes().to_vec()
        };
        Ok(bitbuffer::append_bytes(&bytes, buffer, bit_offset))
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let byte_len = (self.size / 8) as usize;
        let bytes = bitbuffer::extract_bytes(buffer, bit_offset, byte_len)?;
        let mut raw = if self.size == 32 {
            f32::from_be_bytes(bytes.try_into().expect("byte_len matches f32 width")) as f64
        } else {
            f64::from_be_bytes(bytes.try_into().expect("byte_len matches f64 width"))
        };
        if let Some(places) = self.precision {
            raw = round_to_places(raw, places);
        }
        Ok((Value::Float(raw), bit_offset + self.size as usize))
    }
}

fn round_to_places(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let scaled = value * scale;
    let floor = scaled.floor();
    let diff = scaled - floor;
    let rounded = if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_a_32_bit_float() {
        let field = FloatField::new(FieldCommon::new("x").unwrap(), 32).unwrap();
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Float(42.125), &mut buffer, 0).unwrap();
        assert_eq!(offset, 32);
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Float(42.125), 32));
    }

    #[test]
    fn precision_rounds_only_on_decode() {
        let field = FloatField::new(FieldCommon::new("x").unwrap(), 64).unwrap().with_precision(3);
        let mut buffer = Vec::new();
        field.encode(&Value::Float(42.1234), &mut buffer, 0).unwrap();
        let (value, _) = field.decode(&buffer, 0).unwrap();
        assert_eq!(value, Value::Float(42.123));
    }
}
