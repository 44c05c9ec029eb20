//! The external CoAP collaborator's contract, reduced to the three
//! things the framer touches: the message identifier, the payload, and
//! any options the caller wants surfaced. Parsing/building the rest of
//! a CoAP header (version, type, token, retransmission) is entirely out
//! of scope here — a real deployment wires a CoAP library in at this
//! boundary and only ever exchanges `CoapEnvelope` values with it.

use std::collections::BTreeMap;

/// A minimal CoAP message: just enough structure for the framer to
/// carry a codec payload across a CoAP transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoapEnvelope {
    /// CoAP `MessageID`; doubles as the CBC `message_key` under `coap` framing.
    pub mid: u16,
    pub payload: Vec<u8>,
    /// Options this codec does not interpret, keyed by CoAP option number.
    pub options: BTreeMap<u16, Vec<u8>>,
}

impl CoapEnvelope {
    pub fn new(mid: u16, payload: Vec<u8>) -> Self {
        Self { mid, payload, options: BTreeMap::new() }
    }
}
