//! JSON payloads for transports without a correlation property.
//!
//! On SQS the correlation key travels inside the message body:
//! requests are `{room_id, command, reply_to}` and responses are
//! `{room_id, result_text}`. The room id is written as a number when the key
//! is numeric. Decoding also accepts the `RoomID`/`Message` field names used by
//! older workers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transport::Envelope;
use crate::Result;

#[derive(Serialize)]
struct RequestPayload<'a> {
    room_id: Value,
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Serialize)]
struct ResponsePayload<'a> {
    room_id: Value,
    result_text: &'a str,
}

#[derive(Deserialize)]
struct IncomingPayload {
    #[serde(alias = "RoomID", deserialize_with = "key_from_string_or_number")]
    room_id: String,
    #[serde(alias = "command", alias = "result_text", alias = "Message")]
    text: String,
    #[serde(default)]
    reply_to: Option<String>,
}

fn key_value(key: &str) -> Value {
    match key.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(key),
    }
}

fn key_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "room_id must be a string or number, got {other}"
        ))),
    }
}

/// Encode an envelope as a JSON body.
///
/// Envelopes with a reply destination are requests; the rest are responses.
pub fn encode(envelope: &Envelope) -> Result<String> {
    let room_id = key_value(&envelope.correlation_key);
    let json = match envelope.reply_to.as_deref() {
        Some(reply_to) => serde_json::to_string(&RequestPayload {
            room_id,
            command: &envelope.body,
            reply_to: Some(reply_to),
        })?,
        None => serde_json::to_string(&ResponsePayload {
            room_id,
            result_text: &envelope.body,
        })?,
    };
    Ok(json)
}

/// Decode a JSON body into an envelope.
pub fn decode(body: &str) -> Result<Envelope> {
    let payload: IncomingPayload = serde_json::from_str(body)?;
    Ok(Envelope {
        correlation_key: payload.room_id,
        body: payload.text,
        reply_to: payload.reply_to,
    })
}
