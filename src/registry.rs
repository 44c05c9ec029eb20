//! The immutable, read-only-after-load catalog of messages, indexed
//! both by name and by `(message_key, direction)`.

use std::collections::BTreeMap;

use crate::message::{Direction, Message};
use crate::result::{Error, Result};

/// An ordered collection of [`Message`]s with two uniqueness indices.
/// Built once from a schema document (or by hand via [`MessageRegistry::new`])
/// and consulted read-only thereafter; there is no mutation API.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    messages: Vec<Message>,
    by_name: BTreeMap<String, usize>,
    by_key: BTreeMap<(u16, Direction), usize>,
}

impl MessageRegistry {
    /// Builds a registry from `messages`, failing on any duplicate name
    /// or duplicate `(message_key, direction)` pair.
    pub fn new(messages: Vec<Message>) -> Result<Self> {
        let mut registry = MessageRegistry::default();
        for message in messages {
            registry.insert(message)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, message: Message) -> Result<()> {
        if self.by_name.contains_key(&message.name) {
            return Err(Error::Schema(format!("duplicate message name '{}'", message.name)));
        }
        let key = (message.message_key, message.direction);
        if self.by_key.contains_key(&key) {
            return Err(Error::Schema(format!(
                "duplicate message_key {} for direction {:?}",
                message.message_key, message.direction
            )));
        }
        let index = self.messages.len();
        self.by_name.insert(message.name.clone(), index);
        self.by_key.insert(key, index);
        self.messages.push(message);
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Result<&Message> {
        self.by_name
            .get(name)
            .map(|&i| &self.messages[i])
            .ok_or_else(|| Error::Input(format!("no message named '{name}'")))
    }

    pub fn by_key(&self, message_key: u16, direction: Direction) -> Result<&Message> {
        self.by_key
            .get(&(message_key, direction))
            .map(|&i| &self.messages[i])
            .ok_or_else(|| {
                Error::Input(format!("no message with key {message_key} for direction {direction:?}"))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
