//! Thin websocket text sink over tokio-tungstenite. No reconnect policy
//! lives here; the bridge consumes an already-established channel.

use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::publisher::{SinkError, TextSink};

pub struct WebSocketSink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketSink {
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        info!("Connecting to websocket at {}", url);

        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        debug!("Websocket handshake complete: {}", response.status());

        Ok(Self { stream })
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

impl TextSink for WebSocketSink {
    async fn send(&mut self, text: &str) -> Result<(), SinkError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => SinkError::Closed,
                other => SinkError::Transport(other.to_string()),
            })
    }
}
