//! A single message definition: a direction, a 16-bit dispatch key, and
//! an ordered field list.

use crate::constants::{COAP_RESERVED_MIN, NIMO_RESERVED_RANGE, VSAT_RESERVED_MIN};
use crate::field::Fields;
use crate::result::{Error, Result};

/// Logical flow a message travels: device-to-cloud or cloud-to-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// Device to cloud, a.k.a. Mobile-Originated (MO).
    Uplink,
    /// Cloud to device, a.k.a. Mobile-Terminated (MT).
    Downlink,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Uplink => "UPLINK",
            Direction::Downlink => "DOWNLINK",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UPLINK" => Ok(Direction::Uplink),
            "DOWNLINK" => Ok(Direction::Downlink),
            other => Err(Error::Schema(format!("invalid message direction '{other}'"))),
        }
    }
}

/// Whether `message_key` range conflicts with the advisory flags in
/// [`Message::new`] are rejected outright or merely logged. The spec
/// defaults to strict rejection at construction; lenient mode is an
/// Open Question resolution some source variants take instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    #[default]
    Strict,
    Lenient,
}

/// A named, directed, keyed, ordered field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub description: Option<String>,
    pub direction: Direction,
    pub message_key: u16,
    pub fields: Fields,
    pub coap_compatible: bool,
    pub vsat_reserved: bool,
    pub nimo_compatible: bool,
}

/// Builds a `Message`, validating `message_key` against the advisory
/// flags per `policy`.
#[allow(clippy::too_many_arguments)]
pub struct MessageBuilder {
    name: String,
    description: Option<String>,
    direction: Direction,
    message_key: u16,
    fields: Fields,
    coap_compatible: bool,
    vsat_reserved: bool,
    nimo_compatible: bool,
}

impl MessageBuilder {
    pub fn new(name: impl Into<String>, direction: Direction, message_key: u16, fields: Fields) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Schema("message name must not be empty".into()));
        }
        Ok(Self {
            name,
            description: None,
            direction,
            message_key,
            fields,
            coap_compatible: true,
            vsat_reserved: false,
            nimo_compatible: false,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn coap_compatible(mut self, value: bool) -> Self {
        self.coap_compatible = value;
        self
    }

    pub fn vsat_reserved(mut self, value: bool) -> Self {
        self.vsat_reserved = value;
        self
    }

    pub fn nimo_compatible(mut self, value: bool) -> Self {
        self.nimo_compatible = value;
        self
    }

    pub fn build(self, policy: KeyPolicy) -> Result<Message> {
        for violation in self.key_violations() {
            match policy {
                KeyPolicy::Strict => {
                    return Err(Error::Schema(format!(
                        "message '{}' message_key {} {violation}",
                        self.name, self.message_key
                    )))
                }
                KeyPolicy::Lenient => {
                    tracing::warn!(
                        message = %self.name,
                        message_key = self.message_key,
                        "{violation}"
                    );
                }
            }
        }
        Ok(Message {
            name: self.name,
            description: self.description,
            direction: self.direction,
            message_key: self.message_key,
            fields: self.fields,
            coap_compatible: self.coap_compatible,
            vsat_reserved: self.vsat_reserved,
            nimo_compatible: self.nimo_compatible,
        })
    }

    fn key_violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if self.coap_compatible && self.message_key < COAP_RESERVED_MIN {
            violations.push("conflicts with coap_compatible (must be >= 49152)");
        }
        if !self.vsat_reserved && self.message_key >= VSAT_RESERVED_MIN {
            violations.push("conflicts with vsat_reserved=false (must be <= 65279)");
        }
        if self.nimo_compatible && !NIMO_RESERVED_RANGE.contains(&self.message_key) {
            violations.push("conflicts with nimo_compatible (must be in 32768..65280)");
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{BoolField, Field, FieldCommon};

    fn fields() -> Fields {
        Fields::new(vec![Field::Bool(BoolField::new(FieldCommon::new("x").unwrap()))]).unwrap()
    }

    #[test]
    fn strict_policy_rejects_a_key_outside_the_coap_reserved_range() {
        let builder = MessageBuilder::new("m", Direction::Uplink, 100, fields()).unwrap();
        assert!(builder.build(KeyPolicy::Strict).is_err());
    }

    #[test]
    fn lenient_policy_accepts_and_warns() {
        let builder = MessageBuilder::new("m", Direction::Uplink, 100, fields()).unwrap();
        assert!(builder.build(KeyPolicy::Lenient).is_ok());
    }

    #[test]
    fn a_coap_compatible_key_in_range_is_accepted_strictly() {
        let builder = MessageBuilder::new("m", Direction::Uplink, 0xC000, fields()).unwrap();
        assert!(builder.build(KeyPolicy::Strict).is_ok());
    }
}
