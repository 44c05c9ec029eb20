use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::calc::{self, Expr};
use crate::result::{Error, Result};
use crate::value::Value;

/// A two's-complement signed integer of `size` bits.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct IntField {
    pub(super) common: FieldCommon,
    size: u32,
    encalc: Option<Expr>,
    decalc: Option<Expr>,
    clip: bool,
}

impl IntField {
    pub fn new(common: FieldCommon, size: u32) -> Result<Self> {
        if size == 0 || size as usize > crate::constants::MAX_INT_BITS {
            return Err(Error::Schema(format!("int field '{}' has invalid size {size}", common.name)));
        }
        Ok(Self { common, size, encalc: None, decalc: None, clip: false })
    }

    pub fn with_encalc(mut self, expr: &str) -> Result<Self> {
        self.encalc = Some(calc::parse(expr)?);
        Ok(self)
    }

    pub fn with_decalc(mut self, expr: &str) -> Result<Self> {
        self.decalc = Some(calc::parse(expr)?);
        Ok(self)
    }

    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    fn range(&self) -> (i64, i64) {
        if self.size >= 64 {
            (i64::MIN, i64::MAX)
        } else {
            (-(1i64 << (self.size - 1)), (1i64 << (self.size - 1)) - 1)
        }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let raw = value
            .as_f64()
            .ok_or_else(|| Error::Input(format!("field '{}' expects a number", self.common.name)))?;

        let mut transformed = match &self.encalc {
            Some(expr) => calc::eval(expr, raw)?.trunc() as i64,
            None => {
                if raw.fract() != 0.0 {
                    return Err(Error::Input(format!(
                        "field '{}' requires an integer value, got {raw}",
                        self.common.name
                    )));
                }
                raw as i64
            }
        };

        let (min, max) = self.range();
        if transformed < min || transformed > max {
            if self.clip {
                transformed = transformed.clamp(min, max);
            } else {
                return Err(Error::Range(format!(
                    "field '{}' value {transformed} out of range {min}..={max}",
                    self.common.name
                )));
            }
        }

        let bits = bitbuffer::bits_from_int(transformed, self.size as usize);
        bitbuffer::append_bits(&bits, buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let raw = bitbuffer::extract(buffer, bit_offset, self.size as usize, true)?;
        let value = match &self.decalc {
            Some(expr) => Value::Float(calc::eval(expr, raw as f64)?),
            None => Value::Int(raw),
        };
        Ok((value, bit_offset + self.size as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_negative_values() {
        let field = IntField::new(FieldCommon::new("x").unwrap(), 8).unwrap();
        let mut buffer = Vec::new();
        let offset = field.encode(&Value::Int(-5), &mut buffer, 0).unwrap();
        assert_eq!(field.decode(&buffer, 0).unwrap(), (Value::Int(-5), offset));
    }

    #[test]
    fn rejects_values_outside_signed_range() {
        let field = IntField::new(FieldCommon::new("x").unwrap(), 4).unwrap();
        let mut buffer = Vec::new();
        assert!(field.encode(&Value::Int(8), &mut buffer, 0).is_err());
        assert!(field.encode(&Value::Int(-9), &mut buffer, 0).is_err());
    }
}
