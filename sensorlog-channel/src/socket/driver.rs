// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::{next_ref, Command};
use crate::message::{Message, ProtocolVersion, EVENT_HEARTBEAT, TOPIC_PHOENIX};
use crate::reply::Reply;
use crate::transport::{FrameSink, FrameStream};
use futures::{SinkExt, StreamExt};
use sensorlog_error::Result;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Owns the transport for one connection.
///
/// Replies are matched to their pushes by `ref`; every other inbound message
/// goes to the channel subscribed to its topic.
pub(super) struct Driver {
    version: ProtocolVersion,
    heartbeat_interval: Duration,
    refs: Arc<AtomicU64>,
    sink: FrameSink,
    stream: FrameStream,
    commands: mpsc::UnboundedReceiver<Command>,
    pending: HashMap<String, oneshot::Sender<Reply>>,
    topics: HashMap<String, mpsc::UnboundedSender<Message>>,
}

impl Driver {
    pub(super) fn new(
        version: ProtocolVersion,
        heartbeat_interval: Duration,
        refs: Arc<AtomicU64>,
        sink: FrameSink,
        stream: FrameStream,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        Self {
            version,
            heartbeat_interval,
            refs,
            sink,
            stream,
            commands,
            pending: HashMap::new(),
            topics: HashMap::new(),
        }
    }

    pub(super) async fn run(mut self, cancel: CancellationToken) {
        let mut heartbeat = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                _ = cancel.cancelled() => break,
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if let Err(err) = self.handle_command(command).await {
                        warn!(kind = "transport", error = %err, "send failed, closing socket");
                        break;
                    }
                }
                frame = self.stream.next() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(err)) => {
                        warn!(kind = "transport", error = %err, "receive failed, closing socket");
                        break;
                    }
                    None => {
                        debug!(kind = "transport", "peer closed the connection");
                        break;
                    }
                },
                _ = heartbeat.tick() => {
                    // Drop reply slots nobody is waiting on any more.
                    self.pending.retain(|_, reply| !reply.is_closed());
                    let message = Message::new(TOPIC_PHOENIX, EVENT_HEARTBEAT, json!({}))
                        .with_ref(next_ref(&self.refs));
                    if let Err(err) = self.write(&message).await {
                        warn!(kind = "transport", error = %err, "heartbeat failed, closing socket");
                        break;
                    }
                }
            }
        }

        self.commands.close();
        if let Err(err) = self.sink.close().await {
            debug!(kind = "transport", error = %err, "close failed");
        }
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Send { message, reply } => {
                if let (Some(msg_ref), Some(reply)) = (message.msg_ref.clone(), reply) {
                    self.pending.insert(msg_ref, reply);
                }
                self.write(&message).await
            }
            Command::Subscribe { topic, inbound } => {
                self.topics.insert(topic, inbound);
                Ok(())
            }
            Command::Unsubscribe { topic } => {
                self.topics.remove(&topic);
                Ok(())
            }
        }
    }

    async fn write(&mut self, message: &Message) -> Result<()> {
        let frame = self.version.encode(message)?;
        debug!(
            kind = "push",
            topic = %message.topic,
            event = %message.event,
            msg_ref = ?message.msg_ref,
            "{frame}"
        );
        self.sink.send(frame).await
    }

    fn dispatch(&mut self, frame: &str) {
        let message = match self.version.decode(frame) {
            Ok(message) => message,
            Err(err) => {
                warn!(kind = "receive", error = %err, "dropping undecodable frame");
                return;
            }
        };
        debug!(
            kind = "receive",
            topic = %message.topic,
            event = %message.event,
            msg_ref = ?message.msg_ref,
            "{frame}"
        );

        if message.is_reply() {
            let waiting = message
                .msg_ref
                .as_ref()
                .and_then(|msg_ref| self.pending.remove(msg_ref));
            if let Some(reply) = waiting {
                let _ = reply.send(Reply::from_payload(&message.payload));
                return;
            }
        }

        let closed = match self.topics.get(&message.topic) {
            Some(inbound) => inbound.send(message.clone()).is_err(),
            None => false,
        };
        if closed {
            self.topics.remove(&message.topic);
        }
    }
}
