use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use crate::core::types::Endpoints;
use crate::exchanges::binance_futures::access::FuturesAccess;
use crate::exchanges::binance_futures::family::ContractFamily;
use std::sync::Arc;

/// Base URLs for `config`: family defaults for its network, then overrides
pub fn resolve_endpoints<F: ContractFamily>(config: &ExchangeConfig) -> Endpoints {
    let defaults = F::endpoints(config.network);
    Endpoints::new(
        config.base_url.clone().unwrap_or(defaults.rest_base),
        config.stream_url.clone().unwrap_or(defaults.stream_base),
    )
}

/// Build the HTTP transport; signed calls are only possible with credentials
pub fn build_rest_client<F: ContractFamily>(
    config: &ExchangeConfig,
    endpoints: &Endpoints,
) -> Result<ReqwestRest, ExchangeError> {
    let rest_config = RestClientConfig::new(endpoints.rest_base.clone(), F::NAME.to_string())
        .with_request_timeout(config.request_timeout);

    let mut builder = RestClientBuilder::new(rest_config);

    if config.has_credentials() {
        let signer = Arc::new(HmacSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
        ));
        builder = builder.with_signer(signer);
    }

    builder.build()
}

/// Build a facade for contract family `F`
pub fn build_connector<F: ContractFamily>(
    config: ExchangeConfig,
) -> Result<FuturesAccess<F>, ExchangeError> {
    FuturesAccess::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NetworkProfile;
    use crate::exchanges::binance_futures::family::{CoinMargined, UsdMargined};

    #[test]
    fn test_resolve_defaults() {
        let config = ExchangeConfig::read_only().network(NetworkProfile::Test);
        let endpoints = resolve_endpoints::<CoinMargined>(&config);
        assert_eq!(endpoints.rest_base, "https://testnet.binancefuture.com");
        assert_eq!(endpoints.stream_base, "wss://dstream.binancefuture.com/ws");
    }

    #[test]
    fn test_resolve_overrides() {
        let config = ExchangeConfig::read_only()
            .base_url("http://127.0.0.1:9000/".to_string())
            .stream_url("ws://127.0.0.1:9001/ws".to_string());
        let endpoints = resolve_endpoints::<UsdMargined>(&config);
        assert_eq!(endpoints.rest_base, "http://127.0.0.1:9000");
        assert_eq!(endpoints.stream_base, "ws://127.0.0.1:9001/ws");
    }

    #[test]
    fn test_build_rest_client_uses_endpoint() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string());
        let endpoints = resolve_endpoints::<UsdMargined>(&config);
        let rest = build_rest_client::<UsdMargined>(&config, &endpoints).unwrap();
        assert_eq!(rest.config().base_url, "https://fapi.binance.com");
        assert_eq!(rest.config().exchange_name, UsdMargined::NAME);
    }
}
