use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use crate::exchanges::binance_futures::types::EventEnvelope;
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;

/// A decoded frame: its routing metadata plus the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame {
    pub envelope: EventEnvelope,
    pub raw: String,
}

#[derive(Serialize)]
struct ControlFrame<'a> {
    method: &'a str,
    params: Vec<&'a str>,
    id: u64,
}

/// Codec for Binance futures market and user streams
#[derive(Debug, Clone, Copy, Default)]
pub struct FuturesCodec;

impl FuturesCodec {
    fn control(
        method: &str,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError> {
        let frame = ControlFrame {
            method,
            params: streams.iter().map(AsRef::as_ref).collect(),
            id,
        };
        Ok(Message::Text(serde_json::to_string(&frame)?))
    }
}

impl WsCodec for FuturesCodec {
    type Message = StreamFrame;

    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError> {
        Self::control("SUBSCRIBE", streams, id)
    }

    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError> {
        Self::control("UNSUBSCRIBE", streams, id)
    }

    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ExchangeError> {
        let raw = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8(bytes)
                .map_err(|e| ExchangeError::Decode(format!("Binary frame is not UTF-8: {}", e)))?,
            _ => return Ok(None),
        };

        let envelope: EventEnvelope = serde_json::from_str(&raw)
            .map_err(|e| ExchangeError::Decode(format!("Failed to parse stream frame: {}", e)))?;

        Ok(Some(StreamFrame { envelope, raw }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_subscription_frame() {
        let codec = FuturesCodec;
        let msg = codec.encode_subscription(&["btcusdt@ticker"], 7).unwrap();
        let Message::Text(text) = msg else {
            panic!("expected text frame");
        };

        assert_eq!(
            text,
            r#"{"method":"SUBSCRIBE","params":["btcusdt@ticker"],"id":7}"#
        );
    }

    #[test]
    fn test_unsubscription_frame() {
        let codec = FuturesCodec;
        let msg = codec
            .encode_unsubscription(&["btcusdt@ticker".to_string()], 3)
            .unwrap();
        let Message::Text(text) = msg else {
            panic!("expected text frame");
        };

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["method"], "UNSUBSCRIBE");
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn test_decode_keeps_raw_frame() {
        let codec = FuturesCodec;
        let raw = r#"{"e":"24hrTicker","E":123,"s":"BTCUSDT","c":"27000.1"}"#;
        let frame = codec
            .decode_message(Message::Text(raw.to_string()))
            .unwrap()
            .unwrap();

        assert_eq!(frame.raw, raw);
        assert_eq!(frame.envelope.event_type.as_deref(), Some("24hrTicker"));
        assert_eq!(frame.envelope.event_time, Some(123));
    }

    #[test]
    fn test_decode_binary_frame() {
        let codec = FuturesCodec;
        let frame = codec
            .decode_message(Message::Binary(br#"{"e":"forceOrder","E":1}"#.to_vec()))
            .unwrap()
            .unwrap();
        assert_eq!(frame.envelope.event_type.as_deref(), Some("forceOrder"));
    }

    #[test]
    fn test_decode_malformed() {
        let codec = FuturesCodec;
        let result = codec.decode_message(Message::Text("not json".to_string()));
        assert!(matches!(result, Err(ExchangeError::Decode(_))));
    }
}
