use crate::core::errors::ExchangeError;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for exchange-specific WebSocket message encoding/decoding
///
/// Control frames (ping, pong, close) never reach the codec; the transport
/// answers or consumes them.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this exchange
    type Message: Send + Sync;

    /// Encode a subscription request carrying the client-assigned `id`
    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError>;

    /// Encode an unsubscription request carrying the client-assigned `id`
    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError>;

    /// Decode a raw data frame
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Frame carries nothing for this codec
    /// - `Err(ExchangeError::Decode(_))` - Malformed frame
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ExchangeError>;
}
