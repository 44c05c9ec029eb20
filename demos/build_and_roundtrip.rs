//! Builds a small message registry by hand, encodes a value under
//! `nim` framing, decodes it back, and prints both the wire bytes and
//! the recovered value.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use cbc_codec::field::{Field, FieldCommon, Fields, StringField, UintField};
use cbc_codec::message::{Direction, KeyPolicy, MessageBuilder};
use cbc_codec::{decode, encode, DecodeInput, DecodeOptions, EncodeOutput, Framing, MessageSelector, MessageSource};
use cbc_codec::{MessageRegistry, Value};

fn main() -> Result<()> {
    let fields = Fields::new(vec![
        Field::Uint(UintField::new(FieldCommon::new("battery_mv")?, 16)?),
        Field::String(StringField::new(
            FieldCommon::new("note")?.optional(true),
            16,
            false,
        )),
    ])?;

    let message = MessageBuilder::new("status", Direction::Uplink, 0xC001, fields)?.build(KeyPolicy::Strict)?;
    let registry = MessageRegistry::new(vec![message])?;

    let mut value = BTreeMap::new();
    value.insert("battery_mv".to_string(), Value::Int(3700));
    value.insert("note".to_string(), Value::Str("ok".to_string()));
    let value = Value::Map(value);

    let encoded = encode(MessageSource::Registry(&registry), "status", &value, Framing::Nim)
        .context("encoding the status message")?;
    let bytes = match &encoded {
        EncodeOutput::Bytes(b) => b.clone(),
        EncodeOutput::Coap(_) => unreachable!("nim framing never produces a CoAP envelope"),
    };
    println!("wire bytes: {bytes:02x?}");

    let decoded = decode(
        MessageSource::Registry(&registry),
        Some(MessageSelector::Name("status")),
        DecodeInput::Bytes(&bytes),
        Framing::Nim,
        DecodeOptions { incl_dir: true, incl_key: true, incl_desc: false },
    )
    .context("decoding the status message")?;
    println!("decoded: {:?} (direction={:?}, key={:?})", decoded.value, decoded.direction, decoded.message_key);

    Ok(())
}
