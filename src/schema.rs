//! The JSON schema document loader/exporter named as an external
//! collaborator in spec.md §6: it is the only place in the crate that
//! knows the on-disk document shape (`{messages, application?}`, field
//! objects tagged by `type`). Everything it produces is a validated
//! `Message`/`Field`/`MessageRegistry` — by the time core code sees a
//! value, the document format is gone.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::calc;
use crate::field::{
    ArrayField, BitmaskArrayField, BitmaskField, BoolField, DataField, EnumField, EnumTable, Field, FieldCommon,
    Fields, FloatField, IntField, StringField, StructField, UintField,
};
use crate::message::{Direction, KeyPolicy, Message, MessageBuilder};
use crate::registry::MessageRegistry;
use crate::result::{Error, Result};

#[derive(Debug, Deserialize)]
struct RawDocument {
    messages: Vec<RawMessage>,
    /// Application-level metadata the schema document may carry
    /// alongside `messages`; opaque to this codec (spec.md §6).
    #[serde(default)]
    #[allow(dead_code)]
    application: Option<Json>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    name: String,
    #[serde(default)]
    description: Option<String>,
    direction: String,
    message_key: u16,
    fields: Vec<RawField>,
    #[serde(default)]
    coap_compatible: Option<bool>,
    #[serde(default)]
    vsat_reserved: Option<bool>,
    #[serde(default)]
    nimo_compatible: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    optional: bool,
    #[serde(flatten)]
    kind: RawFieldKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawFieldKind {
    Bool,
    Uint {
        size: u32,
        #[serde(default)]
        encalc: Option<String>,
        #[serde(default)]
        decalc: Option<String>,
        #[serde(default)]
        clip: bool,
    },
    Int {
        size: u32,
        #[serde(default)]
        encalc: Option<String>,
        #[serde(default)]
        decalc: Option<String>,
        #[serde(default)]
        clip: bool,
    },
    Enum {
        size: u32,
        #[serde(rename = "enum")]
        variants: BTreeMap<String, String>,
    },
    Bitmask {
        size: u32,
        #[serde(rename = "enum")]
        variants: BTreeMap<String, String>,
    },
    String {
        size: u32,
        #[serde(default)]
        fixed: bool,
    },
    Data {
        size: u32,
        #[serde(default)]
        fixed: bool,
    },
    Float {
        size: u32,
        #[serde(default)]
        precision: Option<u32>,
    },
    Struct {
        fields: Vec<RawField>,
    },
    Array {
        size: u32,
        #[serde(default)]
        fixed: bool,
        fields: Vec<RawField>,
    },
    Bitmaskarray {
        size: u32,
        #[serde(rename = "enum")]
        variants: BTreeMap<String, String>,
        fields: Vec<RawField>,
    },
}

fn parse_variants(raw: BTreeMap<String, String>, size: u32) -> Result<EnumTable> {
    let mut entries = Vec::with_capacity(raw.len());
    for (key, name) in raw {
        let key: i64 = key
            .parse()
            .map_err(|_| Error::Schema(format!("enum key '{key}' is not an integer")))?;
        entries.push((key, name));
    }
    EnumTable::new(entries, size)
}

fn build_field(raw: RawField) -> Result<Field> {
    let mut common = FieldCommon::new(raw.name)?.optional(raw.optional);
    if let Some(description) = raw.description {
        common = common.description(description);
    }
    Ok(match raw.kind {
        RawFieldKind::Bool => Field::Bool(BoolField::new(common)),
        RawFieldKind::Uint { size, encalc, decalc, clip } => {
            let mut field = UintField::new(common, size)?;
            if let Some(expr) = encalc {
                field = field.with_encalc(&expr)?;
            }
            if let Some(expr) = decalc {
                field = field.with_decalc(&expr)?;
            }
            Field::Uint(field.with_clip(clip))
        }
        RawFieldKind::Int { size, encalc, decalc, clip } => {
            let mut field = IntField::new(common, size)?;
            if let Some(expr) = encalc {
                field = field.with_encalc(&expr)?;
            }
            if let Some(expr) = decalc {
                field = field.with_decalc(&expr)?;
            }
            Field::Int(field.with_clip(clip))
        }
        RawFieldKind::Enum { size, variants } => {
            Field::Enum(EnumField::new(common, size, parse_variants(variants, size)?))
        }
        RawFieldKind::Bitmask { size, variants } => {
            Field::Bitmask(BitmaskField::new(common, size, parse_variants(variants, size)?))
        }
        RawFieldKind::String { size, fixed } => Field::String(StringField::new(common, size, fixed)),
        RawFieldKind::Data { size, fixed } => Field::Data(DataField::new(common, size, fixed)),
        RawFieldKind::Float { size, precision } => {
            let mut field = FloatField::new(common, size)?;
            if let Some(places) = precision {
                field = field.with_precision(places);
            }
            Field::Float(field)
        }
        RawFieldKind::Struct { fields } => Field::Struct(StructField::new(common, build_fields(fields)?)),
        RawFieldKind::Array { size, fixed, fields } => {
            Field::Array(ArrayField::new(common, size, fixed, build_fields(fields)?))
        }
        RawFieldKind::Bitmaskarray { size, variants, fields } => Field::BitmaskArray(BitmaskArrayField::new(
            common,
            size,
            parse_variants(variants, size)?,
            build_fields(fields)?,
        )),
    })
}

fn build_fields(raw: Vec<RawField>) -> Result<Fields> {
    let fields = raw.into_iter().map(build_field).collect::<Result<Vec<_>>>()?;
    Fields::new(fields)
}

fn build_message(raw: RawMessage, policy: KeyPolicy) -> Result<Message> {
    let direction: Direction = raw.direction.parse()?;
    let fields = build_fields(raw.fields)?;
    let mut builder = MessageBuilder::new(raw.name, direction, raw.message_key, fields)?;
    if let Some(description) = raw.description {
        builder = builder.description(description);
    }
    if let Some(value) = raw.coap_compatible {
        builder = builder.coap_compatible(value);
    }
    if let Some(value) = raw.vsat_reserved {
        builder = builder.vsat_reserved(value);
    }
    if let Some(value) = raw.nimo_compatible {
        builder = builder.nimo_compatible(value);
    }
    builder.build(policy)
}

/// Parses a schema document's JSON text into a [`MessageRegistry`],
/// validating every message and field against the invariants in
/// spec.md §3 and rejecting `message_key` conflicts per `policy`.
pub fn load(document: &str, policy: KeyPolicy) -> Result<MessageRegistry> {
    let raw: RawDocument = serde_json::from_str(document)?;
    let messages = raw
        .messages
        .into_iter()
        .map(|m| build_message(m, policy))
        .collect::<Result<Vec<_>>>()?;
    MessageRegistry::new(messages)
}

/// Exports a [`MessageRegistry`] back to the schema document shape.
pub fn export(registry: &MessageRegistry) -> Json {
    let messages: Vec<Json> = registry.iter().map(export_message).collect();
    let mut doc = Map::new();
    doc.insert("messages".to_string(), Json::Array(messages));
    Json::Object(doc)
}

fn export_message(message: &Message) -> Json {
    let mut obj = Map::new();
    obj.insert("name".to_string(), Json::String(message.name.clone()));
    obj.insert("direction".to_string(), Json::String(message.direction.as_str().to_string()));
    obj.insert("messageKey".to_string(), Json::from(message.message_key));
    if let Some(description) = &message.description {
        obj.insert("description".to_string(), Json::String(description.clone()));
    }
    obj.insert(
        "fields".to_string(),
        Json::Array(message.fields.iter().map(export_field).collect()),
    );
    if !message.coap_compatible {
        obj.insert("coapCompatible".to_string(), Json::Bool(false));
    }
    if message.vsat_reserved {
        obj.insert("vsatReserved".to_string(), Json::Bool(true));
    }
    if message.nimo_compatible {
        obj.insert("nimoCompatible".to_string(), Json::Bool(true));
    }
    Json::Object(obj)
}

fn export_common(obj: &mut Map<String, Json>, common: &FieldCommon) {
    obj.insert("name".to_string(), Json::String(common.name.clone()));
    if let Some(description) = &common.description {
        obj.insert("description".to_string(), Json::String(description.clone()));
    }
    if common.optional {
        obj.insert("optional".to_string(), Json::Bool(true));
    }
}

fn export_variants(variants: &EnumTable) -> Json {
    let mut map = Map::new();
    for key in variants.keys() {
        if let Some(name) = variants.name_for(key) {
            map.insert(key.to_string(), Json::String(name.to_string()));
        }
    }
    Json::Object(map)
}

fn export_field(field: &Field) -> Json {
    let mut obj = Map::new();
    export_common(&mut obj, field.common());
    match field {
        Field::Bool(_) => {
            obj.insert("type".to_string(), Json::String("bool".to_string()));
        }
        Field::Uint(f) => {
            obj.insert("type".to_string(), Json::String("uint".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if let Some(expr) = f.encalc() {
                obj.insert("encalc".to_string(), Json::String(calc::unparse(expr)));
            }
            if let Some(expr) = f.decalc() {
                obj.insert("decalc".to_string(), Json::String(calc::unparse(expr)));
            }
            if *f.clip() {
                obj.insert("clip".to_string(), Json::Bool(true));
            }
        }
        Field::Int(f) => {
            obj.insert("type".to_string(), Json::String("int".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if let Some(expr) = f.encalc() {
                obj.insert("encalc".to_string(), Json::String(calc::unparse(expr)));
            }
            if let Some(expr) = f.decalc() {
                obj.insert("decalc".to_string(), Json::String(calc::unparse(expr)));
            }
            if *f.clip() {
                obj.insert("clip".to_string(), Json::Bool(true));
            }
        }
        Field::Enum(f) => {
            obj.insert("type".to_string(), Json::String("enum".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            obj.insert("enum".to_string(), export_variants(f.variants()));
        }
        Field::Bitmask(f) => {
            obj.insert("type".to_string(), Json::String("bitmask".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            obj.insert("enum".to_string(), export_variants(f.variants()));
        }
        Field::String(f) => {
            obj.insert("type".to_string(), Json::String("string".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if *f.fixed() {
                obj.insert("fixed".to_string(), Json::Bool(true));
            }
        }
        Field::Data(f) => {
            obj.insert("type".to_string(), Json::String("data".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if *f.fixed() {
                obj.insert("fixed".to_string(), Json::Bool(true));
            }
        }
        Field::Float(f) => {
            obj.insert("type".to_string(), Json::String("float".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if let Some(places) = f.precision() {
                obj.insert("precision".to_string(), Json::from(*places));
            }
        }
        Field::Struct(f) => {
            obj.insert("type".to_string(), Json::String("struct".to_string()));
            obj.insert("fields".to_string(), Json::Array(f.fields().iter().map(export_field).collect()));
        }
        Field::Array(f) => {
            obj.insert("type".to_string(), Json::String("array".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            if *f.fixed() {
                obj.insert("fixed".to_string(), Json::Bool(true));
            }
            obj.insert("fields".to_string(), Json::Array(f.fields().iter().map(export_field).collect()));
        }
        Field::BitmaskArray(f) => {
            obj.insert("type".to_string(), Json::String("bitmaskarray".to_string()));
            obj.insert("size".to_string(), Json::from(*f.size()));
            obj.insert("enum".to_string(), export_variants(f.variants()));
            obj.insert("fields".to_string(), Json::Array(f.fields().iter().map(export_field).collect()));
        }
    }
    Json::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIVIAL_DOC: &str = r#"{
        "messages": [
            {
                "name": "trivialUint",
                "direction": "UPLINK",
                "messageKey": 49152,
                "fields": [
                    {"name": "x", "type": "uint", "size": 4}
                ]
            }
        ]
    }"#;

    #[test]
    fn loads_a_minimal_document() {
        let registry = load(TRIVIAL_DOC, KeyPolicy::Strict).unwrap();
        let message = registry.by_name("trivialUint").unwrap();
        assert_eq!(message.message_key, 0xC000);
        assert_eq!(message.fields.len(), 1);
    }

    #[test]
    fn rejects_a_key_outside_the_coap_reserved_range_by_default() {
        let doc = TRIVIAL_DOC.replace("49152", "100");
        assert!(load(&doc, KeyPolicy::Strict).is_err());
    }

    #[test]
    fn export_then_load_round_trips_the_message_shape() {
        let registry = load(TRIVIAL_DOC, KeyPolicy::Strict).unwrap();
        let exported = export(&registry);
        let text = exported.to_string();
        let reloaded = load(&text, KeyPolicy::Strict).unwrap();
        let message = reloaded.by_name("trivialUint").unwrap();
        assert_eq!(message.message_key, 0xC000);
        assert_eq!(message.fields.get("x").unwrap().name(), "x");
    }

    #[test]
    fn loads_the_bitmaskarray_example_from_the_spec() {
        let doc = r#"{
            "messages": [
                {
                    "name": "withBitmaskArray",
                    "direction": "UPLINK",
                    "messageKey": 49152,
                    "fields": [
                        {
                            "name": "ba",
                            "type": "bitmaskarray",
                            "size": 3,
                            "enum": {"0": "c1", "1": "c2", "2": "c3"},
                            "fields": [
                                {"name": "s", "type": "uint", "size": 4},
                                {"name": "f", "type": "uint", "size": 4}
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let registry = load(doc, KeyPolicy::Strict).unwrap();
        assert_eq!(registry.by_name("withBitmaskArray").unwrap().fields.len(), 1);
    }
}
