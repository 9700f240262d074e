// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use sensorlog_channel::{Message, ProtocolVersion, Reply, ReplyStatus};
use sensorlog_error::SensorLogError;
use serde_json::{json, Value};

#[test]
fn test_v1_encodes_object_with_ref() -> anyhow::Result<()> {
    // Arrange
    let message = Message::new("loggers:42", "new_log", json!({ "measurements": [] })).with_ref("3");

    // Act
    let frame = ProtocolVersion::V1.encode(&message)?;

    // Assert
    let value: Value = serde_json::from_str(&frame)?;
    assert_eq!(
        value,
        json!({
            "topic": "loggers:42",
            "event": "new_log",
            "payload": { "measurements": [] },
            "ref": "3"
        })
    );
    Ok(())
}

#[test]
fn test_v1_decodes_server_reply_with_null_ref() -> anyhow::Result<()> {
    let frame = r#"{"topic":"loggers:42","event":"phx_close","payload":{},"ref":null}"#;

    let message = ProtocolVersion::V1.decode(frame)?;

    assert_eq!(message.topic, "loggers:42");
    assert_eq!(message.event, "phx_close");
    assert_eq!(message.msg_ref, None);
    assert_eq!(message.join_ref, None);
    Ok(())
}

#[test]
fn test_v2_encodes_array_in_wire_order() -> anyhow::Result<()> {
    let message = Message::new("loggers:1", "phx_join", json!({}))
        .with_ref("1")
        .with_join_ref("1");

    let frame = ProtocolVersion::V2.encode(&message)?;

    assert_eq!(frame, r#"["1","1","loggers:1","phx_join",{}]"#);
    Ok(())
}

#[test]
fn test_v2_decodes_broadcast_without_refs() -> anyhow::Result<()> {
    let frame = r#"[null,null,"loggers:1","config_changed",{"delay":500}]"#;

    let message = ProtocolVersion::V2.decode(frame)?;

    assert_eq!(message.event, "config_changed");
    assert_eq!(message.payload, json!({ "delay": 500 }));
    assert!(message.msg_ref.is_none());
    Ok(())
}

#[test]
fn test_decode_rejects_wrong_shape() {
    let result = ProtocolVersion::V2.decode(r#"{"topic":"t","event":"e","payload":{}}"#);
    assert!(matches!(result, Err(SensorLogError::Codec(_))));

    let result = ProtocolVersion::V1.decode("[1,2,3]");
    assert!(matches!(result, Err(SensorLogError::Codec(_))));
}

#[test]
fn test_vsn_strings() {
    assert_eq!(ProtocolVersion::V1.vsn(), "1.0.0");
    assert_eq!(ProtocolVersion::V2.vsn(), "2.0.0");
}

#[test]
fn test_reply_from_payload() {
    let reply = Reply::from_payload(&json!({ "status": "ok", "response": { "id": 7 } }));
    assert!(reply.is_ok());
    assert_eq!(reply.response, json!({ "id": 7 }));

    let reply = Reply::from_payload(&json!({ "status": "error", "response": { "reason": "unauthorized" } }));
    assert_eq!(reply.status, ReplyStatus::Error);
    assert_eq!(reply.status.as_str(), "error");
}

#[test]
fn test_reply_from_malformed_payload_is_error() {
    let payload = json!({ "unexpected": true });

    let reply = Reply::from_payload(&payload);

    assert_eq!(reply.status, ReplyStatus::Error);
    assert_eq!(reply.response, payload);
}
