//! The wire message shape: a JSON object with a `header` and a `body`,
//! carried as one UTF-8 text frame.

use chrono::{SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Reserved `header.type` codes, plus a fallback for embedder-defined
/// string types carried under `MESSAGE`/`CUSTOM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Helo,
    Trusted,
    Confirm,
    Peers,
    Message,
    /// A user-defined event name, sent as a JSON string rather than one of
    /// the reserved numeric codes.
    Custom(String),
}

impl MessageType {
    fn code(&self) -> Option<u8> {
        match self {
            MessageType::Helo => Some(0),
            MessageType::Trusted => Some(1),
            MessageType::Confirm => Some(2),
            MessageType::Peers => Some(3),
            MessageType::Message => Some(4),
            MessageType::Custom(_) => None,
        }
    }

    fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(MessageType::Helo),
            1 => Some(MessageType::Trusted),
            2 => Some(MessageType::Confirm),
            3 => Some(MessageType::Peers),
            4 => Some(MessageType::Message),
            _ => None,
        }
    }

    /// A stable label used as the hash input: `hash` is deterministic over
    /// (type, body, timestamp). Reserved types hash their numeric code;
    /// custom types hash their name.
    pub fn label(&self) -> String {
        match self.code() {
            Some(code) => code.to_string(),
            None => match self {
                MessageType::Custom(name) => name.clone(),
                _ => unreachable!(),
            },
        }
    }
}

impl Serialize for MessageType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.code() {
            Some(code) => serializer.serialize_u8(code),
            None => match self {
                MessageType::Custom(name) => serializer.serialize_str(name),
                _ => unreachable!(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(n) => {
                let code = n
                    .as_u64()
                    .ok_or_else(|| de::Error::custom("header.type code must be a non-negative integer"))?;
                MessageType::from_code(code)
                    .ok_or_else(|| de::Error::custom(format!("unknown header.type code {code}")))
            }
            serde_json::Value::String(s) => Ok(MessageType::Custom(s)),
            other => Err(de::Error::custom(format!(
                "header.type must be an integer or string, got {other}"
            ))),
        }
    }
}

/// The `header.confirm` field, present only on CONFIRM frames: the
/// (hash, timestamp) of the message being acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRef {
    pub hash: String,
    pub timestamp: String,
}

/// The message envelope. `signature` is absent only before it has been
/// signed (construction time); every frame that is actually sent carries
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub hash: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<ConfirmRef>,
}

/// A complete wire message: header plus body. `body` is a plain JSON
/// object for HELO/TRUSTED, and a base64-encoded ciphertext string for
/// MESSAGE/CONFIRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub header: Header,
    pub body: serde_json::Value,
}

impl Message {
    /// Build a message with a fresh hash and timestamp over the given
    /// type and body. The header has no signature yet; callers sign after
    /// serializing the body.
    pub fn new(message_type: MessageType, body: serde_json::Value) -> Self {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let body_json = body.to_string();
        let hash = ringnet_crypto::hash::message_hash(&message_type.label(), &body_json, &timestamp);
        Self {
            header: Header {
                message_type,
                hash,
                timestamp,
                signature: None,
                confirm: None,
            },
            body,
        }
    }

    /// Attach a signature to the header (base64, over the serialized body).
    pub fn with_signature(mut self, signature: String) -> Self {
        self.header.signature = Some(signature);
        self
    }

    /// Attach a `confirm` reference, turning this into a CONFIRM frame's
    /// payload pointer.
    pub fn with_confirm(mut self, confirm: ConfirmRef) -> Self {
        self.header.confirm = Some(confirm);
        self
    }

    /// Serialize to the JSON text frame sent over the transport.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a received text frame.
    pub fn from_frame(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_types_round_trip_through_numeric_codes() {
        for (ty, code) in [
            (MessageType::Helo, 0),
            (MessageType::Trusted, 1),
            (MessageType::Confirm, 2),
            (MessageType::Peers, 3),
            (MessageType::Message, 4),
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, code.to_string());
            let back: MessageType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ty);
        }
    }

    #[test]
    fn custom_type_round_trips_through_its_name() {
        let ty = MessageType::Custom("CustomX".to_string());
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"CustomX\"");
        let back: MessageType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn unknown_numeric_code_is_rejected() {
        let err = serde_json::from_str::<MessageType>("99");
        assert!(err.is_err());
    }

    #[test]
    fn message_hash_is_deterministic_over_type_body_timestamp() {
        let body = serde_json::json!({"hello": "world"});
        let a = Message::new(MessageType::Message, body.clone());
        let b = Message::new(MessageType::Message, body);
        // Same type/body but (almost certainly) different timestamps.
        assert_ne!(a.header.hash, b.header.hash);
    }

    #[test]
    fn full_message_round_trips_through_a_frame() {
        let msg = Message::new(MessageType::Peers, serde_json::json!({"a": 1}))
            .with_signature("c2ln".to_string());
        let frame = msg.to_frame().unwrap();
        let back = Message::from_frame(&frame).unwrap();
        assert_eq!(back.header.message_type, MessageType::Peers);
        assert_eq!(back.header.signature.as_deref(), Some("c2ln"));
    }

    #[test]
    fn confirm_ref_round_trips_inside_header() {
        let confirm = ConfirmRef {
            hash: "abc123".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let msg = Message::new(MessageType::Confirm, serde_json::json!("ignored"))
            .with_confirm(confirm.clone());
        let frame = msg.to_frame().unwrap();
        let back = Message::from_frame(&frame).unwrap();
        assert_eq!(back.header.confirm, Some(confirm));
    }
}
