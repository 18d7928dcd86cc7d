//! Message records as they arrive from history and the live channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{RoomCode, errors::Result};

/// Timestamp exactly as the server sent it.
///
/// Resolution to epoch milliseconds happens in the formatter, which owns the
/// fallback rules for unparseable values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// JSON integer.
    Integer(i64),
    /// JSON number with a fractional part or outside `i64`.
    Float(f64),
    /// JSON string, e.g. `"1700000000000"` from `created_at`.
    Text(String),
}

/// A chat message record in canonical form.
///
/// Decoding accepts every historical field name. For each canonical field the
/// first present, non-empty key wins, in this order:
///
/// | canonical   | wire keys                                 |
/// |-------------|-------------------------------------------|
/// | `author`    | `author`, `user_screen_name`, `username`  |
/// | `timestamp` | `timestamp`, `created_at`                 |
/// | `text`      | `text`, `message_text`, `data`            |
///
/// Field values of the wrong JSON type are treated as absent rather than
/// failing the record. Encoding always uses the canonical names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct WireMessage {
    /// Display name of the sender. `None` when no author key was usable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Send time as reported by the server. `None` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    /// Message body. Empty when no text key was usable.
    pub text: String,
    /// Room the server says this message belongs to, if it said.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_code: Option<RoomCode>,
}

const AUTHOR_KEYS: [&str; 3] = ["author", "user_screen_name", "username"];
const TIMESTAMP_KEYS: [&str; 2] = ["timestamp", "created_at"];
const TEXT_KEYS: [&str; 3] = ["text", "message_text", "data"];

impl WireMessage {
    /// Build a message from canonical fields.
    pub fn new(author: Option<&str>, timestamp: Option<RawTimestamp>, text: &str) -> Self {
        Self {
            author: author.map(str::to_string),
            timestamp,
            text: text.to_string(),
            room_code: None,
        }
    }

    /// Decode a `/last-msgs` body, preserving server order.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonDecode` if the body is not a JSON array of
    ///   objects.
    pub fn parse_history(body: &[u8]) -> Result<Vec<Self>> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl From<Map<String, Value>> for WireMessage {
    fn from(fields: Map<String, Value>) -> Self {
        let author = first_string(&fields, &AUTHOR_KEYS);
        let timestamp = TIMESTAMP_KEYS.iter().find_map(|key| fields.get(*key).and_then(raw_timestamp));
        let text = first_string(&fields, &TEXT_KEYS).unwrap_or_default();
        let room_code = fields.get("room_code").and_then(loose_string).map(RoomCode::from);

        Self { author, timestamp, text, room_code }
    }
}

fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(loose_string))
        .find(|value| !value.is_empty())
}

fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn raw_timestamp(value: &Value) -> Option<RawTimestamp> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(RawTimestamp::Integer(i)),
            None => n.as_f64().map(RawTimestamp::Float),
        },
        Value::String(s) => Some(RawTimestamp::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> WireMessage {
        serde_json::from_str(json).expect("decode")
    }

    #[test]
    fn canonical_fields_decode() {
        let msg = decode(r#"{"author":"ana","timestamp":1700000000000,"text":"hi"}"#);

        assert_eq!(msg.author.as_deref(), Some("ana"));
        assert_eq!(msg.timestamp, Some(RawTimestamp::Integer(1_700_000_000_000)));
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn broadcast_fields_map_to_canonical() {
        let msg = decode(
            r#"{"created_at":"1700000000000","username":"yc","user_screen_name":"Yang",
                "message_text":"hello","room_code":"r1"}"#,
        );

        assert_eq!(msg.author.as_deref(), Some("Yang"));
        assert_eq!(msg.timestamp, Some(RawTimestamp::Text("1700000000000".into())));
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.room_code, Some(RoomCode::new("r1")));
    }

    #[test]
    fn empty_screen_name_falls_through_to_username() {
        let msg = decode(r#"{"user_screen_name":"","username":"yc","data":"x"}"#);
        assert_eq!(msg.author.as_deref(), Some("yc"));
    }

    #[test]
    fn legacy_data_field_is_text() {
        let msg = decode(r#"{"data":"yc connected"}"#);

        assert_eq!(msg.text, "yc connected");
        assert!(msg.author.is_none());
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn wrong_types_are_treated_as_absent() {
        let msg = decode(r#"{"author":{"x":1},"timestamp":null,"text":["no"]}"#);

        assert!(msg.author.is_none());
        assert!(msg.timestamp.is_none());
        assert_eq!(msg.text, "");
    }

    #[test]
    fn fractional_timestamp_is_kept_as_float() {
        let msg = decode(r#"{"created_at":1700000000000.5,"text":"t"}"#);
        assert_eq!(msg.timestamp, Some(RawTimestamp::Float(1_700_000_000_000.5)));
    }

    #[test]
    fn history_body_keeps_order() {
        let body = br#"[{"text":"one"},{"message_text":"two"}]"#;
        let msgs = WireMessage::parse_history(body).expect("parse");

        let texts: Vec<_> = msgs.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn encoding_uses_canonical_names() {
        let msg = WireMessage::new(Some("ana"), Some(RawTimestamp::Integer(5)), "hi");
        let json = serde_json::to_value(&msg).expect("encode");

        assert_eq!(json, serde_json::json!({"author":"ana","timestamp":5,"text":"hi"}));
        assert_eq!(decode(&json.to_string()), msg);
    }
}
