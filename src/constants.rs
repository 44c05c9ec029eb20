//! Wire-level constants shared by the field codecs, the message
//! registry, and the framer.

/// Above this value a `LengthPrefix` must use the 2-byte (extended)
/// form.
pub const LENGTH_PREFIX_SHORT_MAX: usize = 127;

/// The largest length a `LengthPrefix` can express (15 value bits).
pub const LENGTH_PREFIX_MAX: usize = (1 << 15) - 1;

/// The largest bit width this codec extracts/appends as a single
/// integer (`uint`/`int` fields, `LengthPrefix` fields). Wider values
/// would not fit an `i64`/`u64` accumulator.
pub const MAX_INT_BITS: usize = 64;

/// Reserved `message_key` range for CoAP-compatible messages: CoAP's
/// `MessageID` is a 16-bit field and its upper range is reserved for
/// protocol use, so `coap_compatible` messages must stay below this.
pub const COAP_RESERVED_MIN: u16 = 0xC000;

/// Reserved `message_key` range set aside for the VSAT link layer.
pub const VSAT_RESERVED_MIN: u16 = 0xFF00;

/// `message_key` range reserved for interoperability with the legacy
/// NIMO message catalog (not implemented by this crate; the range is
/// still honored by `nimo_compatible` validation).
pub const NIMO_RESERVED_RANGE: std::ops::Range<u16> = 0x8000..0xFF00;
