//! Loads a schema document from an inline JSON literal, prints a
//! summary of the messages it declares, then exports the registry
//! back to JSON to show the format round-trips.

use anyhow::{Context, Result};
use cbc_codec::message::KeyPolicy;
use cbc_codec::schema;

const DOCUMENT: &str = r#"{
    "messages": [
        {
            "name": "heartbeat",
            "direction": "UPLINK",
            "messageKey": 49152,
            "description": "periodic liveness report",
            "fields": [
                {"name": "uptimeMinutes", "type": "uint", "size": 16},
                {
                    "name": "mode",
                    "type": "enum",
                    "size": 2,
                    "enum": {"0": "sleep", "1": "idle", "2": "active"}
                }
            ]
        },
        {
            "name": "setMode",
            "direction": "DOWNLINK",
            "messageKey": 49153,
            "fields": [
                {
                    "name": "mode",
                    "type": "enum",
                    "size": 2,
                    "enum": {"0": "sleep", "1": "idle", "2": "active"}
                }
            ]
        }
    ]
}"#;

fn main() -> Result<()> {
    let registry = schema::load(DOCUMENT, KeyPolicy::Strict).context("loading the schema document")?;

    for message in registry.iter() {
        println!(
            "{} ({:?}, key=0x{:04X}): {} field(s)",
            message.name,
            message.direction,
            message.message_key,
            message.fields.len()
        );
    }

    let exported = schema::export(&registry);
    println!("\nre-exported document:\n{}", serde_json::to_string_pretty(&exported)?);

    Ok(())
}
