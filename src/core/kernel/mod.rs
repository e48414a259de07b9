//! Transport kernel: REST, WebSocket and request signing
//!
//! The kernel knows how to move bytes and authenticate requests. It does not
//! know any endpoint paths or payload shapes; those live in
//! `exchanges::binance_futures`.
//!
//! # Components
//!
//! - `RestClient` / `ReqwestRest`: public and signed HTTP calls, error
//!   normalization into `RequestError`, rate-limit header recording
//! - `Signer` / `HmacSigner`: HMAC-SHA256 query signing with an injectable `Clock`
//! - `StreamConnection`: one duplex WebSocket with subscription bookkeeping
//! - `WsCodec`: exchange-specific framing for subscribe/unsubscribe and decode
//!
//! # Example
//! ```rust,no_run
//! use lotusx_futures::core::kernel::*;
//! use reqwest::Method;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), lotusx_futures::ExchangeError> {
//! let config = RestClientConfig::new(
//!     "https://fapi.binance.com".to_string(),
//!     "binance_futures".to_string(),
//! );
//! let rest = RestClientBuilder::new(config)
//!     .with_signer(Arc::new(HmacSigner::new("key".into(), "secret".into())))
//!     .build()?;
//!
//! let body = rest
//!     .public_request(Method::GET, "/fapi/v1/ticker/24hr", &[("symbol", "BTCUSDT")])
//!     .await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

pub use codec::WsCodec;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{
    encode_query, Clock, FixedClock, HmacSigner, SignatureResult, SignedQuery, Signer,
    SystemClock,
};
pub use ws::{StreamConnection, SubscriptionIds, WsConfig};
