use crate::core::types::{Endpoints, NetworkProfile};

/// REST operations whose path differs between contract families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPath {
    Ticker24hr,
    OrderBook,
    ExchangeInfo,
    Klines,
    ListenKey,
    Order,
    AllOpenOrders,
    Balance,
    Account,
}

/// A family of futures contracts served by its own API deployment
///
/// Selected at construction through the type parameter of
/// [`FuturesAccess`](super::FuturesAccess).
pub trait ContractFamily: Send + Sync + 'static {
    /// Short name used in logs and tracing spans
    const NAME: &'static str;

    /// Default base URLs for `network`
    fn endpoints(network: NetworkProfile) -> Endpoints;

    fn path(path: ApiPath) -> &'static str;
}

/// USDⓈ-margined perpetuals and futures (`/fapi`)
#[derive(Debug, Clone, Copy, Default)]
pub struct UsdMargined;

impl ContractFamily for UsdMargined {
    const NAME: &'static str = "binance_usdm";

    fn endpoints(network: NetworkProfile) -> Endpoints {
        match network {
            NetworkProfile::Main => {
                Endpoints::new("https://fapi.binance.com", "wss://fstream.binance.com/ws")
            }
            NetworkProfile::Test => Endpoints::new(
                "https://testnet.binancefuture.com",
                "wss://stream.binancefuture.com/ws",
            ),
        }
    }

    fn path(path: ApiPath) -> &'static str {
        match path {
            ApiPath::Ticker24hr => "/fapi/v1/ticker/24hr",
            ApiPath::OrderBook => "/fapi/v1/depth",
            ApiPath::ExchangeInfo => "/fapi/v1/exchangeInfo",
            ApiPath::Klines => "/fapi/v1/klines",
            ApiPath::ListenKey => "/fapi/v1/listenKey",
            ApiPath::Order => "/fapi/v1/order",
            ApiPath::AllOpenOrders => "/fapi/v1/allOpenOrders",
            ApiPath::Balance => "/fapi/v2/balance",
            ApiPath::Account => "/fapi/v2/account",
        }
    }
}

/// Coin-margined (inverse) perpetuals and futures (`/dapi`)
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinMargined;

impl ContractFamily for CoinMargined {
    const NAME: &'static str = "binance_coinm";

    fn endpoints(network: NetworkProfile) -> Endpoints {
        match network {
            NetworkProfile::Main => {
                Endpoints::new("https://dapi.binance.com", "wss://dstream.binance.com/ws")
            }
            NetworkProfile::Test => Endpoints::new(
                "https://testnet.binancefuture.com",
                "wss://dstream.binancefuture.com/ws",
            ),
        }
    }

    fn path(path: ApiPath) -> &'static str {
        match path {
            ApiPath::Ticker24hr => "/dapi/v1/ticker/24hr",
            ApiPath::OrderBook => "/dapi/v1/depth",
            ApiPath::ExchangeInfo => "/dapi/v1/exchangeInfo",
            ApiPath::Klines => "/dapi/v1/klines",
            ApiPath::ListenKey => "/dapi/v1/listenKey",
            ApiPath::Order => "/dapi/v1/order",
            ApiPath::AllOpenOrders => "/dapi/v1/allOpenOrders",
            ApiPath::Balance => "/dapi/v1/balance",
            ApiPath::Account => "/dapi/v1/account",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_tables() {
        assert_eq!(
            UsdMargined::endpoints(NetworkProfile::Main).rest_base,
            "https://fapi.binance.com"
        );
        assert_eq!(
            UsdMargined::endpoints(NetworkProfile::Test).stream_base,
            "wss://stream.binancefuture.com/ws"
        );
        assert_eq!(
            CoinMargined::endpoints(NetworkProfile::Main).stream_base,
            "wss://dstream.binance.com/ws"
        );
        assert_eq!(
            CoinMargined::endpoints(NetworkProfile::Test).rest_base,
            "https://testnet.binancefuture.com"
        );
    }

    #[test]
    fn test_paths_are_family_prefixed() {
        let all = [
            ApiPath::Ticker24hr,
            ApiPath::OrderBook,
            ApiPath::ExchangeInfo,
            ApiPath::Klines,
            ApiPath::ListenKey,
            ApiPath::Order,
            ApiPath::AllOpenOrders,
            ApiPath::Balance,
            ApiPath::Account,
        ];
        for path in all {
            assert!(UsdMargined::path(path).starts_with("/fapi/"));
            assert!(CoinMargined::path(path).starts_with("/dapi/"));
        }
    }
}
