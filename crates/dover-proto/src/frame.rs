//! Channel frames.
//!
//! Every frame on the persistent channel is one JSON text message:
//!
//! ```text
//! {"event": "<name>", "data": <payload>, "ack": <id>}
//! ```
//!
//! `data` is omitted for events without a payload and `ack` is present only on
//! inbound messages the server wants acknowledged. Outbound acknowledgments
//! are themselves frames (`{"event": "ack", "data": {"id": <id>}}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    RoomCode, WireMessage,
    errors::{ProtocolError, Result},
};

/// Server-assigned token identifying a delivery that expects an ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AckId(pub u64);

/// Frames the client emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Greeting sent once the channel reports `connect`.
    #[serde(rename = "chat_connect_event")]
    ChatConnect {
        /// Free-form greeting text.
        data: String,
    },

    /// Subscribe to a room's live messages.
    Join {
        /// Room to join.
        room_code: RoomCode,
    },

    /// Unsubscribe from a room.
    Leave {
        /// Room to leave.
        room_code: RoomCode,
    },

    /// Publish a message to a room.
    #[serde(rename = "broadcast_event")]
    Broadcast {
        /// Message body, sent verbatim.
        message_text: String,
        /// Room the message is addressed to.
        room_code: RoomCode,
    },

    /// Acknowledge an inbound delivery.
    Ack {
        /// Token from the inbound frame.
        id: AckId,
    },

    /// Explicit client-initiated disconnect.
    Disconnect,
}

impl ClientFrame {
    /// Wire event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ChatConnect { .. } => "chat_connect_event",
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Broadcast { .. } => "broadcast_event",
            Self::Ack { .. } => "ack",
            Self::Disconnect => "disconnect",
        }
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonDecode` if serialization fails. Cannot happen for
    ///   the current variants; kept fallible for forward compatibility.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON text frame. Used by servers and test harnesses.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonDecode` on malformed JSON or unknown events.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Frames the server delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// Transport (re)connected.
    Connect,

    /// Transport lost. Reconnection is the transport's job.
    Disconnect,

    /// Someone entered a room. Informational only.
    UserJoined {
        /// Human-readable notice from the server.
        notice: String,
    },

    /// Someone left a room. Informational only.
    UserLeft {
        /// Human-readable notice from the server.
        notice: String,
    },

    /// A chat message for the feed.
    MyResponse {
        /// Message record.
        message: WireMessage,
        /// Present when the server expects an acknowledgment.
        ack: Option<AckId>,
    },
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ack: Option<AckId>,
}

impl ServerFrame {
    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonDecode` if the text is not a JSON object with a
    ///   string `event` field.
    /// - `ProtocolError::MalformedEnvelope` if a `my_response` payload is not
    ///   an object.
    /// - `ProtocolError::UnknownEvent` for unrecognized event names.
    pub fn from_json(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;

        match envelope.event.as_str() {
            "connect" => Ok(Self::Connect),
            "disconnect" => Ok(Self::Disconnect),
            "user_joined" => Ok(Self::UserJoined { notice: notice_text(envelope.data) }),
            "user_left" => Ok(Self::UserLeft { notice: notice_text(envelope.data) }),
            "my_response" => {
                if !envelope.data.is_object() {
                    return Err(ProtocolError::MalformedEnvelope(
                        "my_response payload must be an object".to_string(),
                    ));
                }
                let message = serde_json::from_value(envelope.data)?;
                Ok(Self::MyResponse { message, ack: envelope.ack })
            },
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Encode as a JSON text frame. Used by servers and test harnesses.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonDecode` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let envelope = match self {
            Self::Connect => Envelope { event: "connect".into(), data: Value::Null, ack: None },
            Self::Disconnect => {
                Envelope { event: "disconnect".into(), data: Value::Null, ack: None }
            },
            Self::UserJoined { notice } => {
                Envelope { event: "user_joined".into(), data: notice.clone().into(), ack: None }
            },
            Self::UserLeft { notice } => {
                Envelope { event: "user_left".into(), data: notice.clone().into(), ack: None }
            },
            Self::MyResponse { message, ack } => Envelope {
                event: "my_response".into(),
                data: serde_json::to_value(message)?,
                ack: *ack,
            },
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

fn notice_text(data: Value) -> String {
    match data {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
