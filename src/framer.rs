//! The nim/CoAP/raw envelope and the encode/decode dispatch built on
//! top of it. A `Framer` never interprets field bits itself; it only
//! decides where the field list's bit cursor starts and, for `nim`/
//! `coap`, how the 16-bit message key rides alongside the payload.

use std::collections::BTreeMap;

use crate::bitbuffer;
use crate::coap::CoapEnvelope;
use crate::field::{decode_fields, encode_fields};
use crate::message::{Direction, Message};
use crate::registry::MessageRegistry;
use crate::result::{Error, Result};
use crate::value::Value;

/// The three mutually exclusive framing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Raw,
    Nim,
    Coap,
}

/// Either a single resolved `Message` or a registry to resolve one from.
#[derive(Debug, Clone, Copy)]
pub enum MessageSource<'a> {
    Direct(&'a Message),
    Registry(&'a MessageRegistry),
}

/// How to pick a `Message` out of a [`MessageSource::Registry`] on decode.
/// Not needed when the source is [`MessageSource::Direct`].
#[derive(Debug, Clone, Copy)]
pub enum MessageSelector<'a> {
    Name(&'a str),
    Key(u16, Direction),
    /// Valid only under `nim`/`coap` framing, where the key comes from
    /// the envelope and only the direction need be supplied.
    Direction(Direction),
}

/// The decode input, shaped by the chosen [`Framing`].
#[derive(Debug, Clone, Copy)]
pub enum DecodeInput<'a> {
    Bytes(&'a [u8]),
    Coap(&'a CoapEnvelope),
}

/// What `encode` produces: plain bytes under `raw`/`nim`, a CoAP
/// envelope bearing the codec bytes as its payload under `coap`.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeOutput {
    Bytes(Vec<u8>),
    Coap(CoapEnvelope),
}

impl EncodeOutput {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            EncodeOutput::Bytes(b) => b,
            EncodeOutput::Coap(env) => env.payload,
        }
    }
}

/// Output-shaping flags for `decode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub incl_dir: bool,
    pub incl_key: bool,
    pub incl_desc: bool,
}

/// A decoded message: the resolved name plus whatever optional
/// metadata `DecodeOptions` asked to be surfaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub name: String,
    pub direction: Option<Direction>,
    pub message_key: Option<u16>,
    pub description: Option<String>,
    pub value: Value,
    /// CoAP options the codec does not interpret, present only when
    /// decoding under `coap` framing.
    pub coap_options: Option<BTreeMap<u16, Vec<u8>>>,
}

/// Encodes `value` against the message named `name` (or the message's
/// own name, if resolved directly), framed per `framing`.
pub fn encode(source: MessageSource, name: &str, value: &Value, framing: Framing) -> Result<EncodeOutput> {
    let message = match source {
        MessageSource::Direct(m) => {
            if m.name != name {
                return Err(Error::Input(format!(
                    "content name '{name}' does not match message '{}'",
                    m.name
                )));
            }
            m
        }
        MessageSource::Registry(registry) => registry.by_name(name)?,
    };
    let map = value
        .as_map()
        .ok_or_else(|| Error::Input("encode value must be a mapping".into()))?;

    let mut buffer = Vec::new();
    let bit_offset = match framing {
        Framing::Nim => bitbuffer::append_bytes(&message.message_key.to_be_bytes(), &mut buffer, 0),
        Framing::Raw | Framing::Coap => 0,
    };
    encode_fields(&message.fields, map, &mut buffer, bit_offset)?;

    Ok(match framing {
        Framing::Coap => EncodeOutput::Coap(CoapEnvelope::new(message.message_key, buffer)),
        Framing::Raw | Framing::Nim => EncodeOutput::Bytes(buffer),
    })
}

/// Decodes a message from `input`, resolving it via `source` and, for a
/// registry source, `selector`. `framing` must agree with the shape of
/// `input` (`Coap` input only under `Framing::Coap`, and vice versa).
pub fn decode(
    source: MessageSource,
    selector: Option<MessageSelector>,
    input: DecodeInput,
    framing: Framing,
    options: DecodeOptions,
) -> Result<DecodedMessage> {
    let (buffer, bit_offset, envelope_key, coap_options): (&[u8], usize, Option<u16>, Option<BTreeMap<u16, Vec<u8>>>) =
        match (framing, input) {
            (Framing::Raw, DecodeInput::Bytes(b)) => (b, 0, None, None),
            (Framing::Nim, DecodeInput::Bytes(b)) => {
                let key = bitbuffer::extract(b, 0, 16, false)? as u16;
                (b, 16, Some(key), None)
            }
            (Framing::Coap, DecodeInput::Coap(env)) => {
                (&env.payload, 0, Some(env.mid), Some(env.options.clone()))
            }
            _ => {
                return Err(Error::Framing(
                    "decode input shape does not match the requested framing mode".into(),
                ))
            }
        };

    let message = resolve(source, selector, envelope_key)?;
    if let Some(key) = envelope_key {
        if key != message.message_key {
            return Err(Error::Framing(format!(
                "envelope message_key {key} does not match resolved message '{}' (key {})",
                message.name, message.message_key
            )));
        }
    }

    let (map, _) = decode_fields(&message.fields, buffer, bit_offset)?;
    Ok(DecodedMessage {
        name: message.name.clone(),
        direction: options.incl_dir.then_some(message.direction),
        message_key: options.incl_key.then_some(message.message_key),
        description: (options.incl_desc).then(|| message.description.clone()).flatten(),
        value: Value::Map(map),
        coap_options,
    })
}

fn resolve<'a>(
    source: MessageSource<'a>,
    selector: Option<MessageSelector>,
    envelope_key: Option<u16>,
) -> Result<&'a Message> {
    match source {
        MessageSource::Direct(m) => Ok(m),
        MessageSource::Registry(registry) => match selector {
            Some(MessageSelector::Name(name)) => registry.by_name(name),
            Some(MessageSelector::Key(key, direction)) => registry.by_key(key, direction),
            Some(MessageSelector::Direction(direction)) => {
                let key = envelope_key.ok_or_else(|| {
                    Error::Framing("a bare direction selector requires nim/coap framing to supply the key".into())
                })?;
                registry.by_key(key, direction)
            }
            None => Err(Error::Input("a message selector is required when decoding via a registry".into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldCommon, Fields, UintField};
    use crate::message::{KeyPolicy, MessageBuilder};
    use std::collections::BTreeMap as Map;

    fn trivial_message() -> Message {
        let fields = Fields::new(vec![Field::Uint(UintField::new(FieldCommon::new("x").unwrap(), 4).unwrap())]).unwrap();
        MessageBuilder::new("trivial", Direction::Uplink, 0xC000, fields)
            .unwrap()
            .build(KeyPolicy::Strict)
            .unwrap()
    }

    #[test]
    fn nim_framing_prepends_the_big_endian_key() {
        let message = trivial_message();
        let mut value = Map::new();
        value.insert("x".to_string(), Value::Int(3));
        let out = encode(MessageSource::Direct(&message), "trivial", &Value::Map(value), Framing::Nim).unwrap();
        assert_eq!(out.into_bytes(), vec![0xC0, 0x00, 0x30]);
    }

    #[test]
    fn nim_roundtrip_recovers_the_original_value() {
        let message = trivial_message();
        let mut value = Map::new();
        value.insert("x".to_string(), Value::Int(3));
        let bytes = encode(MessageSource::Direct(&message), "trivial", &Value::Map(value.clone()), Framing::Nim)
            .unwrap()
            .into_bytes();
        let decoded = decode(
            MessageSource::Direct(&message),
            None,
            DecodeInput::Bytes(&bytes),
            Framing::Nim,
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(decoded.value, Value::Map(value));
        assert_eq!(decoded.name, "trivial");
    }

    #[test]
    fn mismatched_envelope_key_is_a_framing_error() {
        let message = trivial_message();
        let registry = MessageRegistry::new(vec![message]).unwrap();
        let bytes = vec![0xC0, 0x01, 0x30]; // key 0xC001, not registered
        let result = decode(
            MessageSource::Registry(&registry),
            Some(MessageSelector::Name("trivial")),
            DecodeInput::Bytes(&bytes),
            Framing::Nim,
            DecodeOptions::default(),
        );
        assert!(matches!(result, Err(Error::Framing(_))));
    }

    #[test]
    fn coap_framing_carries_the_key_as_mid() {
        let message = trivial_message();
        let mut value = Map::new();
        value.insert("x".to_string(), Value::Int(5));
        let out = encode(MessageSource::Direct(&message), "trivial", &Value::Map(value), Framing::Coap).unwrap();
        match out {
            EncodeOutput::Coap(env) => {
                assert_eq!(env.mid, 0xC000);
                assert_eq!(env.payload, vec![0x50]);
            }
            EncodeOutput::Bytes(_) => panic!("expected a CoAP envelope"),
        }
    }

    #[test]
    fn direction_only_selector_derives_the_key_from_the_envelope() {
        let message = trivial_message();
        let registry = MessageRegistry::new(vec![message]).unwrap();
        let mut value = Map::new();
        value.insert("x".to_string(), Value::Int(2));
        let bytes = encode(
            MessageSource::Registry(&registry),
            "trivial",
            &Value::Map(value),
            Framing::Nim,
        )
        .unwrap()
        .into_bytes();
        let decoded = decode(
            MessageSource::Registry(&registry),
            Some(MessageSelector::Direction(Direction::Uplink)),
            DecodeInput::Bytes(&bytes),
            Framing::Nim,
            DecodeOptions::default(),
        )
        .unwrap();
        assert_eq!(decoded.name, "trivial");
    }
}
