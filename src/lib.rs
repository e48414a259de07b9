pub mod core;
pub mod exchanges;

pub use crate::core::{
    config::{ConfigError, ExchangeConfig},
    errors::{ExchangeError, RequestError, ServerMessage},
    types::*,
};
pub use crate::exchanges::binance_futures::{
    CoinFuturesAccess, CoinMargined, ContractFamily, EventClass, EventRouter, FuturesAccess,
    RouterOutputs, UsdFuturesAccess, UsdMargined,
};
