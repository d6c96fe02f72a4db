//! Socket abstraction under [`crate::WsClient`].

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::ClientError;

pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// Outbound half of an open socket.
pub trait FrameSink: Send {
    fn send_text<'a>(&'a mut self, text: String) -> TransportFuture<'a, ()>;

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()>;
}

/// Inbound half of an open socket.
pub trait FrameStream: Send {
    /// Next text frame. `None` once the peer closed the connection.
    fn next_frame<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<String, ClientError>>> + Send + 'a>>;
}

pub struct WsConnection {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

/// Opens sockets.
pub trait WsTransport: Send + Sync + 'static {
    fn connect<'a>(&'a self, url: &'a str) -> TransportFuture<'a, WsConnection>;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Plain `ws://` transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl WsTransport for TungsteniteTransport {
    fn connect<'a>(&'a self, url: &'a str) -> TransportFuture<'a, WsConnection> {
        Box::pin(async move {
            let (socket, _) = connect_async(url)
                .await
                .map_err(|e| ClientError::Transport(format!("failed to connect to {url}: {e}")))?;
            let (write, read) = socket.split();
            Ok(WsConnection {
                sink: Box::new(TungsteniteSink(write)),
                stream: Box::new(TungsteniteStream(read)),
            })
        })
    }
}

struct TungsteniteSink(SplitSink<Socket, Message>);

impl FrameSink for TungsteniteSink {
    fn send_text<'a>(&'a mut self, text: String) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.0
                .send(Message::Text(text))
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))
        })
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.0
                .close()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))
        })
    }
}

struct TungsteniteStream(SplitStream<Socket>);

impl FrameStream for TungsteniteStream {
    fn next_frame<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<String, ClientError>>> + Send + 'a>> {
        Box::pin(async move {
            loop {
                match self.0.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => {
                        return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(frame) = frame {
                            tracing::debug!(code = u16::from(frame.code), reason = %frame.reason, "Server closed connection");
                        }
                        return None;
                    }
                    // Pings are answered by tungstenite itself.
                    Ok(_) => continue,
                    Err(e) => return Some(Err(ClientError::Transport(e.to_string()))),
                }
            }
        })
    }
}
