pub mod access;
pub mod builder;
pub mod codec;
pub mod family;
pub mod rest;
pub mod router;
pub mod types;
pub mod user_stream;

pub use access::{FuturesAccess, FuturesStream};
pub use builder::{build_connector, build_rest_client, resolve_endpoints};
pub use codec::{FuturesCodec, StreamFrame};
pub use family::{ApiPath, CoinMargined, ContractFamily, UsdMargined};
pub use rest::{format_decimal, FuturesRestClient};
pub use router::{classify, EventClass, EventRouter, RouterOutputs};
pub use types::decode_event;
pub use user_stream::{UserStream, DEFAULT_KEEP_ALIVE_INTERVAL};

/// USDⓈ-margined access over HTTP
pub type UsdFuturesAccess = FuturesAccess<UsdMargined>;
/// Coin-margined access over HTTP
pub type CoinFuturesAccess = FuturesAccess<CoinMargined>;
