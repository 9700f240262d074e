// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Wire messages and the two JSON serializers spoken by Phoenix endpoints.

use sensorlog_error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const TOPIC_PHOENIX: &str = "phoenix";

/// One frame exchanged over a socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl Message {
    pub fn new(topic: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            msg_ref: None,
            join_ref: None,
        }
    }

    #[must_use]
    pub fn with_ref(mut self, msg_ref: impl Into<String>) -> Self {
        self.msg_ref = Some(msg_ref.into());
        self
    }

    #[must_use]
    pub fn with_join_ref(mut self, join_ref: impl Into<String>) -> Self {
        self.join_ref = Some(join_ref.into());
        self
    }

    /// Whether this frame is a reply correlated by `ref` to an earlier push.
    pub fn is_reply(&self) -> bool {
        self.event == EVENT_REPLY
    }
}

/// Serializer version, sent to the server as the `vsn` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// JSON object `{"topic", "event", "payload", "ref"}`.
    #[default]
    V1,
    /// JSON array `[join_ref, ref, topic, event, payload]`.
    V2,
}

type ArrayFrame = (Option<String>, Option<String>, String, String, Value);

impl ProtocolVersion {
    pub const fn vsn(self) -> &'static str {
        match self {
            Self::V1 => "1.0.0",
            Self::V2 => "2.0.0",
        }
    }

    /// Encode a message into a text frame.
    ///
    /// # Errors
    /// Returns `SensorLogError::Codec` if the payload cannot be serialized.
    pub fn encode(self, message: &Message) -> Result<String> {
        let text = match self {
            Self::V1 => serde_json::to_string(message)?,
            Self::V2 => serde_json::to_string(&(
                &message.join_ref,
                &message.msg_ref,
                &message.topic,
                &message.event,
                &message.payload,
            ))?,
        };
        Ok(text)
    }

    /// Decode a text frame into a message.
    ///
    /// # Errors
    /// Returns `SensorLogError::Codec` if the frame is not valid for this version.
    pub fn decode(self, frame: &str) -> Result<Message> {
        match self {
            Self::V1 => Ok(serde_json::from_str(frame)?),
            Self::V2 => {
                let (join_ref, msg_ref, topic, event, payload): ArrayFrame =
                    serde_json::from_str(frame)?;
                Ok(Message {
                    topic,
                    event,
                    payload,
                    msg_ref,
                    join_ref,
                })
            }
        }
    }
}
