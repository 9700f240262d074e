// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use sensorlog_channel::{ChannelState, ReplyStatus, Socket, SocketOptions};
use sensorlog_error::SensorLogError;
use sensorlog_test_utils::{assert_no_element_emitted, FakeServer, FakeServerConfig, JoinPolicy};
use serde_json::json;
use std::time::Duration;

async fn connected(config: FakeServerConfig) -> anyhow::Result<(Socket, FakeServer)> {
    let (connector, server) = FakeServer::start_with(config);
    let socket = Socket::new(
        "memory://sockets/logger",
        SocketOptions::default().with_timeout(Duration::from_millis(200)),
    );
    socket.connect(&connector).await?;
    Ok((socket, server))
}

#[tokio::test]
async fn test_join_ok_moves_channel_to_joined() -> anyhow::Result<()> {
    // Arrange
    let (socket, mut server) = connected(FakeServerConfig::default()).await?;
    let mut channel = socket.channel("loggers:42", json!({}));
    assert_eq!(channel.state(), ChannelState::Closed);

    // Act
    let reply = channel.join().await?;

    // Assert
    assert_eq!(reply.status, ReplyStatus::Ok);
    assert!(channel.is_joined());
    let join = server.expect_next(100).await.message;
    assert_eq!(join.topic, "loggers:42");
    assert_eq!(join.event, "phx_join");
    assert!(join.msg_ref.is_some());
    Ok(())
}

#[tokio::test]
async fn test_join_rejected_leaves_channel_errored() -> anyhow::Result<()> {
    let (socket, _server) = connected(FakeServerConfig {
        join: JoinPolicy::Reject(json!({ "reason": "unauthorized" })),
        ..FakeServerConfig::default()
    })
    .await?;
    let mut channel = socket.channel("loggers:42", json!({}));

    let reply = channel.join().await?;

    assert_eq!(reply.status, ReplyStatus::Error);
    assert_eq!(reply.response, json!({ "reason": "unauthorized" }));
    assert_eq!(channel.state(), ChannelState::Errored);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_join_without_reply_times_out() -> anyhow::Result<()> {
    let (socket, _server) = connected(FakeServerConfig {
        join: JoinPolicy::Ignore,
        ..FakeServerConfig::default()
    })
    .await?;
    let mut channel = socket.channel("loggers:42", json!({}));

    let reply = channel.join().await?;

    assert_eq!(reply.status, ReplyStatus::Timeout);
    assert_eq!(channel.state(), ChannelState::Errored);
    Ok(())
}

#[tokio::test]
async fn test_join_twice_is_invalid_state() -> anyhow::Result<()> {
    let (socket, _server) = connected(FakeServerConfig::default()).await?;
    let mut channel = socket.channel("loggers:42", json!({}));
    channel.join().await?;

    let result = channel.join().await;

    assert!(matches!(result, Err(SensorLogError::InvalidState { .. })));
    Ok(())
}

#[tokio::test]
async fn test_push_before_join_is_invalid_state() -> anyhow::Result<()> {
    let (socket, mut server) = connected(FakeServerConfig::default()).await?;
    let channel = socket.channel("loggers:42", json!({}));

    let result = channel.push("new_log", json!({ "measurements": [] }));

    assert!(matches!(result, Err(SensorLogError::InvalidState { .. })));
    assert_no_element_emitted(server.received(), 50).await;
    Ok(())
}

#[tokio::test]
async fn test_push_reaches_server_with_join_ref() -> anyhow::Result<()> {
    // Arrange
    let (socket, mut server) = connected(FakeServerConfig {
        ack_pushes: true,
        ..FakeServerConfig::default()
    })
    .await?;
    let mut channel = socket.channel("loggers:42", json!({}));
    channel.join().await?;
    let join = server.expect_next(100).await.message;

    // Act
    let push = channel.push("new_log", json!({ "measurements": [{ "sensor_id": "s1" }] }))?;
    let reply = push.receive().await?;

    // Assert
    assert!(reply.is_ok());
    let pushed = server.expect_next(100).await.message;
    assert_eq!(pushed.event, "new_log");
    assert_eq!(pushed.payload["measurements"][0]["sensor_id"], "s1");
    assert_eq!(pushed.join_ref, join.join_ref);
    assert_ne!(pushed.msg_ref, join.msg_ref);
    Ok(())
}

#[tokio::test]
async fn test_leave_closes_channel() -> anyhow::Result<()> {
    let (socket, mut server) = connected(FakeServerConfig::default()).await?;
    let mut channel = socket.channel("loggers:42", json!({}));
    channel.join().await?;

    let reply = channel.leave().await?;

    assert!(reply.is_ok());
    assert_eq!(channel.state(), ChannelState::Closed);
    server.expect_event("phx_leave", 100).await;
    assert!(matches!(
        channel.push("new_log", json!({})),
        Err(SensorLogError::InvalidState { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_leave_unjoined_channel_sends_nothing() -> anyhow::Result<()> {
    let (socket, mut server) = connected(FakeServerConfig::default()).await?;
    let mut channel = socket.channel("loggers:42", json!({}));

    let reply = channel.leave().await?;

    assert!(reply.is_ok());
    assert_no_element_emitted(server.received(), 50).await;
    Ok(())
}

#[tokio::test]
async fn test_broadcast_routed_to_channel_by_topic() -> anyhow::Result<()> {
    // Arrange
    let (socket, server) = connected(FakeServerConfig::default()).await?;
    let mut first = socket.channel("loggers:1", json!({}));
    let mut second = socket.channel("loggers:2", json!({}));
    first.join().await?;
    second.join().await?;

    // Act
    server.broadcast("loggers:2", "calibrate", json!({ "offset": 3 }));
    server.broadcast("loggers:1", "phx_error", json!({}));

    // Assert
    let message = second.next_message().await.expect("broadcast for second");
    assert_eq!(message.event, "calibrate");
    assert_eq!(message.payload, json!({ "offset": 3 }));
    assert!(second.is_joined());

    let message = first.next_message().await.expect("error for first");
    assert_eq!(message.event, "phx_error");
    assert_eq!(first.state(), ChannelState::Errored);
    Ok(())
}
