use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use serde::de::{self, DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Event types carried in the `e` field of stream frames
pub const EVENT_SYMBOL_TICKER: &str = "24hrTicker";
pub const EVENT_ORDER: &str = "ORDER_TRADE_UPDATE";
pub const EVENT_ACCOUNT: &str = "ACCOUNT_UPDATE";
pub const EVENT_LIQUIDATION: &str = "forceOrder";

// Reason types carried in `a.m` of account updates
pub const REASON_ORDER: &str = "ORDER";
pub const REASON_FUNDING: &str = "FUNDING_FEE";

// Stream types for subscriptions
pub const STREAM_SYMBOL_TICKER: &str = "ticker";
pub const STREAM_BOOK_TICKER: &str = "bookTicker";
pub const STREAM_LIQUIDATION: &str = "forceOrder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    StopMarket,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::StopMarket => "STOP_MARKET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancel
    #[serde(rename = "GTC")]
    GoodTillCancel,
    /// Good till crossing: post-only, rejected if it would take liquidity
    #[serde(rename = "GTX")]
    GoodTillCrossing,
}

impl TimeInForce {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoodTillCancel => "GTC",
            Self::GoodTillCrossing => "GTX",
        }
    }
}

/// Ephemeral token gating the private stream; expires 60 minutes after the
/// last obtain or keep-alive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenKey {
    #[serde(rename = "listenKey")]
    pub listen_key: String,
}

/// Accepts either a single object or an array of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// 24 hour rolling window statistics
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    pub weighted_avg_price: Decimal,
    pub last_price: Decimal,
    #[serde(default)]
    pub price_change_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BookLevel(pub Decimal, pub Decimal);

impl BookLevel {
    pub const fn price(&self) -> Decimal {
        self.0
    }

    pub const fn quantity(&self) -> Decimal {
        self.1
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub last_update_id: u64,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub price_precision: Option<u32>,
    #[serde(default)]
    pub quantity_precision: Option<u32>,
    /// Price, lot and notional filters as sent by the exchange
    #[serde(default)]
    pub filters: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

/// One candle; decoded from the positional array the exchange sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kline {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
}

impl<'de> Deserialize<'de> for Kline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<Value> = Vec::deserialize(deserializer)?;

        let int_at = |i: usize| -> Result<i64, D::Error> {
            raw.get(i)
                .and_then(Value::as_i64)
                .ok_or_else(|| de::Error::custom(format!("kline field {} is not an integer", i)))
        };
        let decimal_at = |i: usize| -> Result<Decimal, D::Error> {
            raw.get(i)
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::custom(format!("kline field {} is not a string", i)))?
                .parse::<Decimal>()
                .map_err(de::Error::custom)
        };

        Ok(Self {
            open_time: int_at(0)?,
            open: decimal_at(1)?,
            high: decimal_at(2)?,
            low: decimal_at(3)?,
            close: decimal_at(4)?,
            volume: decimal_at(5)?,
            close_time: int_at(6)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    pub price: Decimal,
    pub orig_qty: Decimal,
    #[serde(default)]
    pub reduce_only: Option<bool>,
}

/// Body of a successful cancel-all call
#[derive(Debug, Clone, Deserialize)]
pub struct CancelAllResponse {
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub asset: String,
    pub balance: Decimal,
    pub available_balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAsset {
    pub asset: String,
    pub wallet_balance: Decimal,
    #[serde(default)]
    pub unrealized_profit: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPosition {
    pub symbol: String,
    pub position_amt: Decimal,
    pub entry_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInformation {
    #[serde(default)]
    pub can_trade: bool,
    #[serde(default)]
    pub assets: Vec<AccountAsset>,
    #[serde(default)]
    pub positions: Vec<AccountPosition>,
}

/// Routing metadata present on every event frame
///
/// Only `E`, `e` and `a.m` are read; the rest of the frame is left for the
/// consumer to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawEnvelope")]
pub struct EventEnvelope {
    pub event_time: Option<i64>,
    pub event_type: Option<String>,
    /// Reason of an account update (`a.m`); absent on other events
    pub reason_type: Option<String>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "E", default)]
    event_time: Option<i64>,
    #[serde(rename = "e", default)]
    event_type: Option<String>,
    #[serde(rename = "a", default)]
    account: Option<AccountField>,
}

// `a` is an object on account updates but a price string on book tickers
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountField {
    Reason {
        #[serde(rename = "m", default)]
        reason: Option<String>,
    },
    Other(IgnoredAny),
}

impl From<RawEnvelope> for EventEnvelope {
    fn from(raw: RawEnvelope) -> Self {
        let reason_type = match raw.account {
            Some(AccountField::Reason { reason }) => reason,
            _ => None,
        };
        Self {
            event_time: raw.event_time,
            event_type: raw.event_type,
            reason_type,
        }
    }
}

/// Decode a routed frame into its full payload type
pub fn decode_event<T: DeserializeOwned>(frame: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(frame)
        .map_err(|e| ExchangeError::Decode(format!("Failed to parse event payload: {}", e)))
}

/// `24hrTicker` payload
#[derive(Debug, Clone, Deserialize)]
pub struct TickerUpdate {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub last_price: Decimal,
    #[serde(rename = "w")]
    pub weighted_avg_price: Decimal,
    #[serde(rename = "P", default)]
    pub price_change_percent: Option<Decimal>,
}

/// `ORDER_TRADE_UPDATE` payload
#[derive(Debug, Clone, Deserialize)]
pub struct OrderTradeUpdate {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "o")]
    pub order: OrderUpdateDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderUpdateDetail {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: OrderSide,
    #[serde(rename = "o")]
    pub order_type: String,
    #[serde(rename = "X")]
    pub execution_status: String,
    #[serde(rename = "x")]
    pub execution_type: String,
    #[serde(rename = "c")]
    pub client_order_id: String,
}

/// `ACCOUNT_UPDATE` payload
#[derive(Debug, Clone, Deserialize)]
pub struct AccountUpdate {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "a")]
    pub data: AccountUpdateData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUpdateData {
    #[serde(rename = "m")]
    pub reason: String,
    #[serde(rename = "P", default)]
    pub positions: Vec<PositionUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionUpdate {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "pa")]
    pub position_amount: Decimal,
    #[serde(rename = "ep")]
    pub entry_price: Decimal,
    #[serde(rename = "ps", default)]
    pub position_side: Option<String>,
}

/// `forceOrder` (liquidation) payload
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationOrder {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "o")]
    pub order: LiquidationDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationDetail {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: OrderSide,
    #[serde(rename = "o")]
    pub order_type: String,
    #[serde(rename = "q")]
    pub original_quantity: Decimal,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "X")]
    pub status: String,
    #[serde(rename = "z")]
    pub accumulated_quantity: Decimal,
}
