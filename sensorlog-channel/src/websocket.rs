// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::transport::{Connector, FrameSink, FrameStream};
use async_trait::async_trait;
use futures::future::ready;
use futures::{SinkExt, StreamExt};
use sensorlog_error::{Result, SensorLogError};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// WebSocket transport speaking text frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|err| SensorLogError::connection(url, err.to_string()))?;
        let (write, read) = ws.split();

        let sink = write
            .sink_map_err(|err| SensorLogError::transport(format!("websocket send: {err}")))
            .with(|frame: String| ready(Ok::<_, SensorLogError>(WsMessage::Text(frame))));

        // Control frames are answered by tungstenite itself.
        let stream = read.filter_map(|frame| {
            ready(match frame {
                Ok(WsMessage::Text(text)) => Some(Ok(text)),
                Ok(_) => None,
                Err(err) => Some(Err(SensorLogError::transport(format!(
                    "websocket receive: {err}"
                )))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
