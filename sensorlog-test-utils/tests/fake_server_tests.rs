// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{stream, SinkExt, StreamExt};
use sensorlog_channel::{Connector, Message, ProtocolVersion};
use sensorlog_test_utils::{assert_no_element_emitted, unwrap_stream, FakeServer};
use serde_json::{json, Value};

#[tokio::test]
async fn test_assert_no_element_emitted_on_empty_stream() {
    let mut empty = stream::empty::<i32>();
    assert_no_element_emitted(&mut empty, 10).await;
}

#[tokio::test]
async fn test_unwrap_stream_returns_next_item() {
    let mut items = stream::iter(vec![1, 2]);

    assert_eq!(unwrap_stream(&mut items, 10).await, Some(1));
    assert_eq!(unwrap_stream(&mut items, 10).await, Some(2));
    assert_eq!(unwrap_stream(&mut items, 10).await, None);
}

#[tokio::test]
async fn test_server_replies_to_join_and_records_it() -> anyhow::Result<()> {
    // Arrange
    let (connector, mut server) = FakeServer::start();
    let (mut sink, mut frames) = connector.connect("memory://raw").await?;
    let join = Message::new("loggers:1", "phx_join", json!({}))
        .with_ref("1")
        .with_join_ref("1");

    // Act
    sink.send(ProtocolVersion::V1.encode(&join)?).await?;

    // Assert
    let frame = frames.next().await.expect("reply frame")?;
    let reply = ProtocolVersion::V1.decode(&frame)?;
    assert_eq!(reply.event, "phx_reply");
    assert_eq!(reply.msg_ref.as_deref(), Some("1"));
    assert_eq!(reply.payload["status"], "ok");

    let recorded = server.expect_next(100).await;
    assert_eq!(recorded.message, join);
    assert_eq!(server.urls(), vec!["memory://raw".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_heartbeats_are_answered_but_not_recorded() -> anyhow::Result<()> {
    let (connector, mut server) = FakeServer::start();
    let (mut sink, mut frames) = connector.connect("memory://raw").await?;
    let heartbeat = Message::new("phoenix", "heartbeat", json!({})).with_ref("9");

    sink.send(ProtocolVersion::V1.encode(&heartbeat)?).await?;

    let frame = frames.next().await.expect("reply frame")?;
    let reply = ProtocolVersion::V1.decode(&frame)?;
    assert_eq!(reply.topic, "phoenix");
    assert_eq!(reply.payload["response"], Value::Object(Default::default()));
    assert_eq!(server.heartbeats(), 1);
    assert_no_element_emitted(server.received(), 20).await;
    Ok(())
}
