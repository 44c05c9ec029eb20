use derive_getters::Getters;

use super::FieldCommon;
use crate::bitbuffer;
use crate::calc::{self, Expr};
use crate::result::{Error, Result};
use crate::value::Value;

/// An unsigned integer of `size` bits, optionally scaled by a
/// [`calc`](crate::calc) expression at the API boundary.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct UintField {
    pub(super) common: FieldCommon,
    size: u32,
    encalc: Option<Expr>,
    decalc: Option<Expr>,
    /// Saturate to the representable range on encode instead of
    /// rejecting out-of-range values.
    clip: bool,
}

impl UintField {
    pub fn new(common: FieldCommon, size: u32) -> Result<Self> {
        if size == 0 || size as usize > crate::constants::MAX_INT_BITS {
            return Err(Error::Schema(format!(
                "uint field '{}' has invalid size {size}",
                common.name
            )));
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

    fn max_value(&self) -> u64 {
        if self.size >= 64 {
            u64::MAX
        } else {
            (1u64 << self.size) - 1
        }
    }

    /// The value as a wide signed integer, precise across the entire
    /// `u64` range `as_f64` alone (53-bit mantissa) cannot carry.
    fn wide_value(&self, value: &Value) -> Result<i128> {
        match value {
            Value::Int(i) => Ok(i128::from(*i)),
            Value::UInt(u) => Ok(i128::from(*u)),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i128),
            _ => Err(Error::Input(format!("field '{}' requires an integer value", self.common.name))),
        }
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        let max = self.max_value();

        // encalc is float-scaled and so can't carry the full u64 range
        // exactly; that precision limit is inherent to the calc design.
        let mut transformed: i128 = match &self.encalc {
            Some(expr) => {
                let raw = value
                    .as_f64()
                    .ok_or_else(|| Error::Input(format!("field '{}' expects a number", self.common.name)))?;
                calc::eval(expr, raw)?.trunc() as i128
            }
            None => self.wide_value(value)?,
        };

        if transformed < 0 || transformed > max as i128 {
            if self.clip {
                transformed = transformed.clamp(0, max as i128);
            } else {
                return Err(Error::Range(format!(
                    "field '{}' value {transformed} out of range 0..={max}",
                    self.common.name
                )));
            }
        }

        let bits = bitbuffer::bits_from_uint(transformed as u64, self.size as usize);
        bitbuffer::append_bits(&bits, buffer, bit_offset)
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        let raw = bitbuffer::extract_u64(buffer, bit_offset, self.size as usize)?;
        let value = match &self.decalc {
            Some(expr) => Value::Float(calc::eval(expr, raw as f64)?),
            None if raw <= i64::MAX as u64 => Value::Int(raw as i64),
            None => Value::UInt(raw),
        };
        Ok((value, bit_offset + self.size as usize))
    }
}
