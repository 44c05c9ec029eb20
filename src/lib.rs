//! A bit-packed, schema-driven message codec for narrowband satellite
//! IoT links: given a schema document describing a set of messages as
//! ordered field lists, encodes/decodes application values to and from
//! the compact wire representation, optionally framed for a `nim`
//! transport or carried inside a CoAP payload.
//!
//! The core pipeline, outside in:
//! - [`schema`] loads/exports a JSON schema document into a [`registry::MessageRegistry`].
//! - [`framer`] dispatches `encode`/`decode` against a [`message::Message`], choosing
//!   a [`framer::Framing`] and driving [`field::encode_fields`]/[`field::decode_fields`].
//! - [`field`] holds the twelve field kinds and the bit-level encoding for each.
//! - [`bitbuffer`] and [`length_prefix`] are the bit-addressed primitives everything
//!   else is built on.
//! - [`value`] is the dynamic, JSON-friendly type application values move through.

mod bitbuffer;
mod calc;
pub mod coap;
mod constants;
pub mod field;
pub mod framer;
pub mod length_prefix;
pub mod message;
pub mod registry;
pub mod result;
pub mod schema;
pub mod value;

pub use coap::CoapEnvelope;
pub use framer::{decode, encode, DecodeInput, DecodeOptions, DecodedMessage, EncodeOutput, Framing, MessageSelector, MessageSource};
pub use message::{Direction, KeyPolicy, Message, MessageBuilder};
pub use registry::MessageRegistry;
pub use result::{Error, Result};
pub use value::Value;
