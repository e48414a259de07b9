use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use crate::core::types::Subscription;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Dial + handshake timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
        }
    }
}

/// Client-side subscription id source
///
/// Shared by every connection a facade opens, so ids stay unique across
/// close/reopen.
#[derive(Debug, Default)]
pub struct SubscriptionIds {
    next: AtomicU64,
}

impl SubscriptionIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The id the next subscription will get
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

/// One open duplex stream
///
/// Open on construction, Closed after [`close`](Self::close) and terminal from
/// then on. Meant for one writer issuing subscriptions and one reader draining
/// frames; both may run concurrently since the halves are locked separately.
pub struct StreamConnection<C: WsCodec> {
    url: String,
    exchange_name: String,
    codec: C,
    write: Mutex<SplitSink<WsStream, Message>>,
    read: Mutex<SplitStream<WsStream>>,
    ids: Arc<SubscriptionIds>,
    subscriptions: std::sync::Mutex<Vec<Subscription>>,
    closed: watch::Sender<bool>,
    reader_claimed: AtomicBool,
}

impl<C: WsCodec> std::fmt::Debug for StreamConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("exchange", &self.exchange_name)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl<C: WsCodec> StreamConnection<C> {
    /// Dial `url` and return an open connection
    ///
    /// Server pings are answered with pongs from inside [`receive`](Self::receive).
    #[instrument(skip(codec, config, ids), fields(exchange = %exchange_name))]
    pub async fn open(
        url: &str,
        exchange_name: &str,
        codec: C,
        config: &WsConfig,
        ids: Arc<SubscriptionIds>,
    ) -> Result<Self, ExchangeError> {
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                ExchangeError::Stream(format!(
                    "WebSocket connection timeout after {}ms",
                    config.connect_timeout_ms
                ))
            })?
            .map_err(|e| ExchangeError::Stream(format!("WebSocket connection failed: {}", e)))?;

        let (write, read) = ws_stream.split();
        let (closed, _) = watch::channel(false);

        info!("WebSocket connection opened");

        Ok(Self {
            url: url.to_string(),
            exchange_name: exchange_name.to_string(),
            codec,
            write: Mutex::new(write),
            read: Mutex::new(read),
            ids,
            subscriptions: std::sync::Mutex::new(Vec::new()),
            closed,
            reader_claimed: AtomicBool::new(false),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Subscriptions sent on this connection, oldest first
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions
            .lock()
            .map(|subs| subs.clone())
            .unwrap_or_default()
    }

    /// Claim the connection for a long-running reader
    ///
    /// Returns `false` if a reader already holds it; the claim lasts for the
    /// lifetime of the connection.
    pub fn claim_reader(&self) -> bool {
        self.reader_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn ensure_open(&self) -> Result<(), ExchangeError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ExchangeError::StreamClosed)
        }
    }

    fn mark_closed(&self) {
        self.closed.send_replace(true);
    }

    /// Send a raw frame
    #[instrument(skip(self, msg), fields(exchange = %self.exchange_name))]
    pub async fn send_raw(&self, msg: Message) -> Result<(), ExchangeError> {
        self.ensure_open()?;

        let mut write = self.write.lock().await;
        write
            .send(msg)
            .await
            .map_err(|e| ExchangeError::Stream(format!("Failed to send WebSocket message: {}", e)))
    }

    /// Subscribe to `<symbol>@<stream_type>`
    ///
    /// The id is consumed before the write, so a failed write still uses it up.
    /// Nothing is retried.
    #[instrument(skip(self), fields(exchange = %self.exchange_name))]
    pub async fn subscribe(
        &self,
        symbol: &str,
        stream_type: &str,
    ) -> Result<Subscription, ExchangeError> {
        self.ensure_open()?;

        let subscription = Subscription {
            id: self.ids.next_id(),
            symbol: symbol.to_string(),
            stream_type: stream_type.to_string(),
        };

        let message = self
            .codec
            .encode_subscription(&[subscription.stream_name()], subscription.id)?;

        if let Err(e) = self.send_raw(message).await {
            warn!(id = subscription.id, "Failed to send subscribe message: {}", e);
            return Err(e);
        }

        debug!(id = subscription.id, stream = %subscription.stream_name(), "subscribed");
        if let Ok(mut subs) = self.subscriptions.lock() {
            subs.push(subscription.clone());
        }
        Ok(subscription)
    }

    /// Unsubscribe from `<symbol>@<stream_type>`, returning the id used
    #[instrument(skip(self), fields(exchange = %self.exchange_name))]
    pub async fn unsubscribe(&self, symbol: &str, stream_type: &str) -> Result<u64, ExchangeError> {
        self.ensure_open()?;

        let id = self.ids.next_id();
        let stream = crate::core::types::stream_name(symbol, stream_type);
        let message = self.codec.encode_unsubscription(&[stream.as_str()], id)?;
        self.send_raw(message).await?;

        if let Ok(mut subs) = self.subscriptions.lock() {
            subs.retain(|sub| sub.stream_name() != stream);
        }
        Ok(id)
    }

    /// Wait for the next data frame (text or binary)
    ///
    /// Returns an error once the connection is closed, locally or by the
    /// server, or the socket fails. A pending call is woken by [`close`](Self::close).
    pub async fn receive(&self) -> Result<Message, ExchangeError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(ExchangeError::StreamClosed);
        }

        let mut read = self.read.lock().await;
        loop {
            let next = tokio::select! {
                biased;
                _ = closed.changed() => return Err(ExchangeError::StreamClosed),
                next = read.next() => next,
            };

            match next {
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.send_raw(Message::Pong(data)).await {
                        warn!("Failed to send pong response: {}", e);
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    self.mark_closed();
                    // Flushes the queued close reply
                    let _ = self.write.lock().await.close().await;
                    return Err(ExchangeError::Stream(format!(
                        "Connection closed by server: {:?}",
                        frame
                    )));
                }
                Some(Ok(message)) => return Ok(message),
                Some(Err(e)) => {
                    self.mark_closed();
                    return Err(ExchangeError::Stream(format!("WebSocket error: {}", e)));
                }
                None => {
                    self.mark_closed();
                    return Err(ExchangeError::StreamClosed);
                }
            }
        }
    }

    /// Wait for the next frame the codec decodes to a message
    ///
    /// Decode failures come back as `ExchangeError::Decode` without closing
    /// the connection; callers may keep reading.
    pub async fn next_message(&self) -> Result<C::Message, ExchangeError> {
        loop {
            let raw = self.receive().await?;
            if let Some(decoded) = self.codec.decode_message(raw)? {
                return Ok(decoded);
            }
        }
    }

    /// Close the connection; idempotent
    #[instrument(skip(self), fields(exchange = %self.exchange_name))]
    pub async fn close(&self) -> Result<(), ExchangeError> {
        if self.closed.send_replace(true) {
            return Ok(());
        }

        let mut write = self.write.lock().await;
        if let Err(e) = write.send(Message::Close(None)).await {
            debug!("Close frame not delivered: {}", e);
        }
        let _ = write.close().await;

        info!("WebSocket connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_ids_strictly_increase() {
        let ids = SubscriptionIds::new();
        assert_eq!(ids.peek(), 0);
        let taken: Vec<u64> = (0..5).map(|_| ids.next_id()).collect();
        assert_eq!(taken, vec![0, 1, 2, 3, 4]);
        assert_eq!(ids.peek(), 5);
    }

    #[test]
    fn test_subscription_ids_shared_across_threads() {
        let ids = Arc::new(SubscriptionIds::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..100).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
    }
}
