use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// In-process WebSocket server standing in for the exchange stream
///
/// Connections are served one after another. Text frames from the client
/// land in `received`; pongs arrive as `pong:<payload>`. Anything pushed
/// into `outbound` is written to the current connection.
pub struct TestServer {
    pub url: String,
    pub received: mpsc::UnboundedReceiver<String>,
    pub outbound: mpsc::UnboundedSender<Message>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received) = mpsc::unbounded_channel();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws_stream) = accept_async(stream).await else {
                    continue;
                };
                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        inbound = read.next() => match inbound {
                            Some(Ok(Message::Text(text))) => {
                                let _ = received_tx.send(text);
                            }
                            Some(Ok(Message::Pong(data))) => {
                                let _ = received_tx
                                    .send(format!("pong:{}", String::from_utf8_lossy(&data)));
                            }
                            Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                        outgoing = outbound_rx.recv() => match outgoing {
                            Some(message) => {
                                let closing = matches!(message, Message::Close(_));
                                if write.send(message).await.is_err() || closing {
                                    break;
                                }
                            }
                            None => return,
                        },
                    }
                }
            }
        });

        Self {
            url: format!("ws://{}/ws", addr),
            received,
            outbound,
        }
    }

    pub fn send_text(&self, text: &str) {
        self.outbound
            .send(Message::Text(text.to_string()))
            .unwrap();
    }

    /// Next frame the client sent, failing the test after two seconds
    pub async fn next_received(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("server task ended")
    }
}
