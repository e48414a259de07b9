use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use crate::core::kernel::ws::StreamConnection;
use crate::exchanges::binance_futures::codec::StreamFrame;
use crate::exchanges::binance_futures::types::{
    EventEnvelope, EVENT_ACCOUNT, EVENT_ORDER, EVENT_SYMBOL_TICKER, REASON_ORDER,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Output channel a frame is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Price,
    Order,
    Position,
}

/// Decide where a frame goes; `None` means drop it
pub fn classify(envelope: &EventEnvelope) -> Option<EventClass> {
    match envelope.event_type.as_deref()? {
        EVENT_SYMBOL_TICKER => Some(EventClass::Price),
        EVENT_ORDER => Some(EventClass::Order),
        EVENT_ACCOUNT if envelope.reason_type.as_deref() == Some(REASON_ORDER) => {
            Some(EventClass::Position)
        }
        _ => None,
    }
}

/// Receiving ends of the router's three outputs
///
/// Each carries the original frame text; decode it with
/// [`decode_event`](super::types::decode_event).
#[derive(Debug)]
pub struct RouterOutputs {
    pub prices: mpsc::Receiver<String>,
    pub orders: mpsc::Receiver<String>,
    pub positions: mpsc::Receiver<String>,
}

/// Fans decoded frames out to price, order and position channels
///
/// Channels are bounded; a slow consumer stalls the router, which in turn
/// stops reading the socket.
#[derive(Debug, Clone)]
pub struct EventRouter {
    prices: mpsc::Sender<String>,
    orders: mpsc::Sender<String>,
    positions: mpsc::Sender<String>,
}

impl EventRouter {
    /// Create a router with three channels of `buffer` capacity each
    pub fn new(buffer: usize) -> (Self, RouterOutputs) {
        let buffer = buffer.max(1);
        let (prices_tx, prices) = mpsc::channel(buffer);
        let (orders_tx, orders) = mpsc::channel(buffer);
        let (positions_tx, positions) = mpsc::channel(buffer);

        (
            Self::from_senders(prices_tx, orders_tx, positions_tx),
            RouterOutputs {
                prices,
                orders,
                positions,
            },
        )
    }

    /// Route into caller-owned channels
    pub const fn from_senders(
        prices: mpsc::Sender<String>,
        orders: mpsc::Sender<String>,
        positions: mpsc::Sender<String>,
    ) -> Self {
        Self {
            prices,
            orders,
            positions,
        }
    }

    /// Forward one frame, waiting for channel capacity
    ///
    /// Returns the class the frame was delivered to, or `None` if it was
    /// dropped because it matched nothing or the consumer is gone.
    pub async fn route(&self, frame: StreamFrame) -> Option<EventClass> {
        let Some(class) = classify(&frame.envelope) else {
            trace!(event = ?frame.envelope.event_type, "dropping unrouted frame");
            return None;
        };

        let sender = match class {
            EventClass::Price => &self.prices,
            EventClass::Order => &self.orders,
            EventClass::Position => &self.positions,
        };

        if sender.send(frame.raw).await.is_err() {
            warn!(?class, "output channel closed, dropping frame");
            return None;
        }
        Some(class)
    }

    /// Decode a raw frame and route it
    pub async fn route_raw(&self, raw: &str) -> Result<Option<EventClass>, ExchangeError> {
        let envelope: EventEnvelope = serde_json::from_str(raw)?;
        Ok(self
            .route(StreamFrame {
                envelope,
                raw: raw.to_string(),
            })
            .await)
    }

    /// Drain `connection` until it closes or fails
    ///
    /// Undecodable frames are logged and skipped. Returns the error that
    /// ended the loop.
    pub async fn run<C>(self, connection: Arc<StreamConnection<C>>) -> ExchangeError
    where
        C: WsCodec<Message = StreamFrame>,
    {
        info!(url = %connection.url(), "event router started");
        loop {
            match connection.next_message().await {
                Ok(frame) => {
                    if let Some(class) = self.route(frame).await {
                        debug!(?class, "frame routed");
                    }
                }
                Err(ExchangeError::Decode(reason)) => {
                    warn!("skipping undecodable frame: {}", reason);
                }
                Err(e) => {
                    info!("event router stopped: {}", e);
                    return e;
                }
            }
        }
    }
}
