use super::messages::{Inbound, ServerMessage};
use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

/// Bidirectional, ordered message transport for one connection
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Wait for the next inbound message.
    /// Must resolve to `Inbound::Disconnect` once the peer is gone, and be cancel-safe.
    async fn recv(&mut self) -> Inbound;

    async fn send(&mut self, message: &ServerMessage) -> Result<()>;
}

/// Raw client frame, before classification
#[derive(Debug, Clone)]
pub enum ClientFrame {
    Binary(Vec<u8>),
    Text(String),
    Close,
}

impl From<ClientFrame> for Inbound {
    fn from(frame: ClientFrame) -> Self {
        match frame {
            ClientFrame::Binary(bytes) => Inbound::from_binary(bytes),
            ClientFrame::Text(text) => Inbound::from_text(&text),
            ClientFrame::Close => Inbound::Disconnect,
        }
    }
}

/// In-process transport over tokio channels
pub struct ChannelTransport {
    inbound: mpsc::Receiver<ClientFrame>,
    outbound: mpsc::Sender<ServerMessage>,
}

/// Client side of a `ChannelTransport`. Dropping `frames` disconnects.
pub struct ChannelClient {
    pub frames: mpsc::Sender<ClientFrame>,
    pub messages: mpsc::Receiver<ServerMessage>,
}

impl ChannelTransport {
    pub fn pair(buffer: usize) -> (ChannelTransport, ChannelClient) {
        let (frame_tx, frame_rx) = mpsc::channel(buffer);
        let (message_tx, message_rx) = mpsc::channel(buffer);

        (
            ChannelTransport {
                inbound: frame_rx,
                outbound: message_tx,
            },
            ChannelClient {
                frames: frame_tx,
                messages: message_rx,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn recv(&mut self) -> Inbound {
        match self.inbound.recv().await {
            Some(frame) => frame.into(),
            None => Inbound::Disconnect,
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        self.outbound
            .send(message.clone())
            .await
            .map_err(|_| anyhow!("client receiver dropped"))
    }
}
