//! The twelve field kinds and the list driver that walks them.

mod array_field;
mod bitmask_field;
mod bitmaskarray_field;
mod bool_field;
mod data_field;
mod enum_field;
mod float_field;
mod int_field;
mod string_field;
mod struct_field;
mod uint_field;

pub use array_field::ArrayField;
pub use bitmask_field::BitmaskField;
pub use bitmaskarray_field::BitmaskArrayField;
pub use bool_field::BoolField;
pub use data_field::DataField;
pub use enum_field::EnumField;
pub use float_field::FloatField;
pub use int_field::IntField;
pub use string_field::StringField;
pub use struct_field::StructField;
pub use uint_field::UintField;

use std::collections::BTreeMap;

use crate::bitbuffer;
use crate::result::{Error, Result};
use crate::value::Value;

/// Attributes shared by every field kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCommon {
    pub name: String,
    pub description: Option<String>,
    pub optional: bool,
}

impl FieldCommon {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Schema("field name must not be empty".into()));
        }
        Ok(Self { name, description: None, optional: false })
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A declared enum/bitmask value table: integer key (bit position for
/// `bitmask`/`bitmaskarray`, ordinal for `enum`) to unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    by_key: BTreeMap<i64, String>,
}

impl EnumTable {
    pub fn new(entries: impl IntoIterator<Item = (i64, String)>, size: u32) -> Result<Self> {
        let by_key: BTreeMap<i64, String> = entries.into_iter().collect();
        // i128 avoids both the overflow panic and the under-acceptance of
        // valid keys a `1i64 << size` would hit for size 63/64.
        let limit: i128 = 1i128 << size.min(63);
        let mut seen_names = std::collections::HashSet::new();
        for (&key, name) in &by_key {
            if (key as i128) < 0 || (key as i128) >= limit {
                return Err(Error::Schema(format!(
                    "enum key {key} out of range 0..{limit} for a {size}-bit field"
                )));
            }
            if !seen_names.insert(name.as_str()) {
                return Err(Error::Schema(format!("duplicate enum value name '{name}'")));
            }
        }
        Ok(Self { by_key })
    }

    pub fn name_for(&self, key: i64) -> Option<&str> {
        self.by_key.get(&key).map(|s| s.as_str())
    }

    pub fn key_for(&self, name: &str) -> Option<i64> {
        self.by_key.iter().find(|(_, v)| v.as_str() == name).map(|(&k, _)| k)
    }

    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.by_key.keys().copied()
    }
}

/// The tagged union over the twelve field kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Bool(BoolField),
    Uint(UintField),
    Int(IntField),
    Enum(EnumField),
    Bitmask(BitmaskField),
    String(StringField),
    Data(DataField),
    Float(FloatField),
    Struct(StructField),
    Array(ArrayField),
    BitmaskArray(BitmaskArrayField),
}

impl Field {
    pub fn common(&self) -> &FieldCommon {
        match self {
            Field::Bool(f) => &f.common,
            Field::Uint(f) => &f.common,
            Field::Int(f) => &f.common,
            Field::Enum(f) => &f.common,
            Field::Bitmask(f) => &f.common,
            Field::String(f) => &f.common,
            Field::Data(f) => &f.common,
            Field::Float(f) => &f.common,
            Field::Struct(f) => &f.common,
            Field::Array(f) => &f.common,
            Field::BitmaskArray(f) => &f.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn is_optional(&self) -> bool {
        self.common().optional
    }

    pub fn encode(&self, value: &Value, buffer: &mut Vec<u8>, bit_offset: usize) -> Result<usize> {
        match self {
            Field::Bool(f) => f.encode(value, buffer, bit_offset),
            Field::Uint(f) => f.encode(value, buffer, bit_offset),
            Field::Int(f) => f.encode(value, buffer, bit_offset),
            Field::Enum(f) => f.encode(value, buffer, bit_offset),
            Field::Bitmask(f) => f.encode(value, buffer, bit_offset),
            Field::String(f) => f.encode(value, buffer, bit_offset),
            Field::Data(f) => f.encode(value, buffer, bit_offset),
            Field::Float(f) => f.encode(value, buffer, bit_offset),
            Field::Struct(f) => f.encode(value, buffer, bit_offset),
            Field::Array(f) => f.encode(value, buffer, bit_offset),
            Field::BitmaskArray(f) => f.encode(value, buffer, bit_offset),
        }
    }

    pub fn decode(&self, buffer: &[u8], bit_offset: usize) -> Result<(Value, usize)> {
        match self {
            Field::Bool(f) => f.decode(buffer, bit_offset),
            Field::Uint(f) => f.decode(buffer, bit_offset),
            Field::Int(f) => f.decode(buffer, bit_offset),
            Field::Enum(f) => f.decode(buffer, bit_offset),
            Field::Bitmask(f) => f.decode(buffer, bit_offset),
            Field::String(f) => f.decode(buffer, bit_offset),
            Field::Data(f) => f.decode(buffer, bit_offset),
            Field::Float(f) => f.decode(buffer, bit_offset),
            Field::Struct(f) => f.decode(buffer, bit_offset),
            Field::Array(f) => f.decode(buffer, bit_offset),
            Field::BitmaskArray(f) => f.decode(buffer, bit_offset),
        }
    }
}

/// An ordered, uniquely-named list of fields; the unit every `struct`,
/// `array`, `bitmaskarray` and `Message` owns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(Error::Schema(format!("duplicate field name '{}'", field.name())));
            }
        }
        Ok(Self(fields))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.name() == name)
    }
}

/// Encodes `value`'s entries against `fields` in declared order,
/// emitting a presence bit ahead of each optional field.
pub fn encode_fields(
    fields: &Fields,
    value: &BTreeMap<String, Value>,
    buffer: &mut Vec<u8>,
    bit_offset: usize,
) -> Result<usize> {
    let mut offset = bit_offset;
    for field in fields.iter() {
        let present = value.contains_key(field.name());
        if field.is_optional() {
            offset = bitbuffer::append_bits(&[present as u8], buffer, offset)?;
            if !present {
                continue;
            }
        } else if !present {
            return Err(Error::Input(format!("missing required field '{}'", field.name())));
        }
        let field_value = value.get(field.name()).expect("presence checked above");
        offset = field.encode(field_value, buffer, offset)?;
    }
    Ok(offset)
}

/// Decodes `fields` in declared order starting at `bit_offset`. Absent
/// optional fields are omitted from the returned map.
pub fn decode_fields(
    fields: &Fields,
    buffer: &[u8],
    bit_offset: usize,
) -> Result<(BTreeMap<String, Value>, usize)> {
    let mut offset = bit_offset;
    let mut out = BTreeMap::new();
    for field in fields.iter() {
        if field.is_optional() {
            let present = bitbuffer::extract(buffer, offset, 1, false)? != 0;
            offset += 1;
            if !present {
                continue;
            }
        }
        let (value, next_offset) = field.decode(buffer, offset)?;
        out.insert(field.name().to_string(), value);
        offset = next_offset;
    }
    Ok((out, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_field_names() {
        let a = Field::Bool(BoolField::new(FieldCommon::new("x").unwrap()));
        let b = Field::Bool(BoolField::new(FieldCommon::new("x").unwrap()));
        assert!(Fields::new(vec![a, b]).is_err());
    }
}
