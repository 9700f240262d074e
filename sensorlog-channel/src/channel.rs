// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::message::{Message, EVENT_CLOSE, EVENT_ERROR, EVENT_JOIN, EVENT_LEAVE};
use crate::push::Push;
use crate::reply::Reply;
use crate::socket::Socket;
use sensorlog_error::{Result, SensorLogError};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Joining,
    Joined,
    Leaving,
    Errored,
}

/// One topic multiplexed over a [`Socket`].
#[derive(Debug)]
pub struct Channel {
    socket: Socket,
    topic: String,
    params: Value,
    state: ChannelState,
    join_ref: Option<String>,
    inbound: Option<mpsc::UnboundedReceiver<Message>>,
}

impl Channel {
    pub(crate) fn new(socket: Socket, topic: String, params: Value) -> Self {
        Self {
            socket,
            topic,
            params,
            state: ChannelState::Closed,
            join_ref: None,
            inbound: None,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == ChannelState::Joined
    }

    /// Send `phx_join` and wait for the server's answer.
    ///
    /// The returned reply carries the status: `Ok` moves the channel to
    /// `Joined`, `Error` and `Timeout` leave it `Errored`.
    ///
    /// # Errors
    /// `InvalidState` if already joined or joining, `ChannelClosed` if the
    /// socket is not running.
    pub async fn join(&mut self) -> Result<Reply> {
        if matches!(self.state, ChannelState::Joined | ChannelState::Joining) {
            return Err(SensorLogError::invalid_state(format!(
                "channel {} is already joined",
                self.topic
            )));
        }

        let join_ref = self.socket.make_ref();
        self.inbound = Some(self.socket.subscribe(&self.topic)?);
        self.join_ref = Some(join_ref.clone());
        self.state = ChannelState::Joining;

        let message = Message::new(&self.topic, EVENT_JOIN, self.params.clone())
            .with_ref(join_ref.clone())
            .with_join_ref(join_ref);
        let reply = match self.socket.send(message) {
            Ok(push) => push.receive().await,
            Err(err) => Err(err),
        };

        match &reply {
            Ok(reply) if reply.is_ok() => {
                self.state = ChannelState::Joined;
                info!(topic = %self.topic, "joined channel");
            }
            Ok(reply) => {
                self.state = ChannelState::Errored;
                warn!(topic = %self.topic, status = ?reply.status, response = %reply.response, "join failed");
            }
            Err(_) => self.state = ChannelState::Errored,
        }
        reply
    }

    /// Push an event to the joined topic.
    ///
    /// # Errors
    /// `InvalidState` unless the channel is joined.
    pub fn push(&self, event: impl Into<String>, payload: Value) -> Result<Push> {
        if self.state != ChannelState::Joined {
            return Err(SensorLogError::invalid_state(format!(
                "cannot push to {} while {:?}",
                self.topic, self.state
            )));
        }

        let mut message = Message::new(&self.topic, event, payload).with_ref(self.socket.make_ref());
        message.join_ref = self.join_ref.clone();
        self.socket.send(message)
    }

    /// Send `phx_leave` and wait for the acknowledgement.
    ///
    /// The channel ends up `Closed` whatever the server answers. Leaving a
    /// channel that never joined resolves to an `Ok` reply without any traffic.
    ///
    /// # Errors
    /// `ChannelClosed` if the socket went away before the reply.
    pub async fn leave(&mut self) -> Result<Reply> {
        if matches!(self.state, ChannelState::Closed) {
            return Ok(Reply::ok(Value::Null));
        }

        self.state = ChannelState::Leaving;
        let mut message =
            Message::new(&self.topic, EVENT_LEAVE, Value::Object(Default::default()))
                .with_ref(self.socket.make_ref());
        message.join_ref = self.join_ref.clone();

        let reply = match self.socket.send(message) {
            Ok(push) => push.receive().await,
            Err(err) => Err(err),
        };

        self.close_locally();
        if let Ok(reply) = &reply {
            debug!(topic = %self.topic, status = ?reply.status, "left channel");
        }
        reply
    }

    /// Next message the server broadcast on this topic.
    ///
    /// `phx_error` and `phx_close` update the channel state before being
    /// returned. `None` once the socket stops or the channel was never joined.
    pub async fn next_message(&mut self) -> Option<Message> {
        let message = self.inbound.as_mut()?.recv().await?;
        match message.event.as_str() {
            EVENT_ERROR => self.state = ChannelState::Errored,
            EVENT_CLOSE => self.state = ChannelState::Closed,
            _ => {}
        }
        Some(message)
    }

    fn close_locally(&mut self) {
        self.state = ChannelState::Closed;
        self.join_ref = None;
        self.inbound = None;
        self.socket.unsubscribe(&self.topic);
    }
}
