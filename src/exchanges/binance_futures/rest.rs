use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::binance_futures::family::{ApiPath, ContractFamily};
use crate::exchanges::binance_futures::types::{
    AccountInformation, Balance, CancelAllResponse, ExchangeInfo, Kline, OneOrMany, OrderBook,
    OrderResponse, OrderSide, OrderType, Ticker24hr, TimeInForce,
};
use reqwest::Method;
use rust_decimal::Decimal;
use std::marker::PhantomData;
use tracing::instrument;

/// Wire form of a decimal: no exponent, no trailing zeros
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Typed REST operations for one contract family
pub struct FuturesRestClient<R: RestClient, F: ContractFamily> {
    rest: R,
    _family: PhantomData<F>,
}

impl<R: RestClient + Clone, F: ContractFamily> Clone for FuturesRestClient<R, F> {
    fn clone(&self) -> Self {
        Self::new(self.rest.clone())
    }
}

impl<R: RestClient, F: ContractFamily> FuturesRestClient<R, F> {
    pub const fn new(rest: R) -> Self {
        Self {
            rest,
            _family: PhantomData,
        }
    }

    /// The underlying transport
    pub const fn transport(&self) -> &R {
        &self.rest
    }

    /// 24 hour statistics for `symbol`
    ///
    /// Coin-margined symbols may list several contracts, hence the vector.
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_24hr_ticker(&self, symbol: &str) -> Result<Vec<Ticker24hr>, ExchangeError> {
        let tickers: OneOrMany<Ticker24hr> = self
            .rest
            .public_json(Method::GET, F::path(ApiPath::Ticker24hr), &[("symbol", symbol)])
            .await?;
        Ok(tickers.into())
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let limit_str = limit.map(|l| l.to_string());
        let mut params = vec![("symbol", symbol)];

        if let Some(ref limit) = limit_str {
            params.push(("limit", limit.as_str()));
        }

        self.rest
            .public_json(Method::GET, F::path(ApiPath::OrderBook), &params)
            .await
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        self.rest
            .public_json(Method::GET, F::path(ApiPath::ExchangeInfo), &[])
            .await
    }

    /// Candles for `symbol`; `interval` is the exchange notation (`1m`, `4h`, `1d`, ...)
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let limit_str = limit.map(|l| l.to_string());
        let mut params = vec![("symbol", symbol), ("interval", interval)];

        if let Some(ref limit) = limit_str {
            params.push(("limit", limit.as_str()));
        }

        self.rest
            .public_json(Method::GET, F::path(ApiPath::Klines), &params)
            .await
    }

    /// Place a good-till-cancel limit order
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<OrderResponse, ExchangeError> {
        self.place_limit(
            symbol,
            side,
            price,
            quantity,
            reduce_only,
            TimeInForce::GoodTillCancel,
        )
        .await
    }

    /// Place a post-only (GTX) limit order
    ///
    /// The exchange rejects it instead of letting it take liquidity.
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn place_post_only_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<OrderResponse, ExchangeError> {
        self.place_limit(
            symbol,
            side,
            price,
            quantity,
            reduce_only,
            TimeInForce::GoodTillCrossing,
        )
        .await
    }

    async fn place_limit(
        &self,
        symbol: &str,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
        reduce_only: bool,
        time_in_force: TimeInForce,
    ) -> Result<OrderResponse, ExchangeError> {
        let quantity = format_decimal(quantity);
        let price = format_decimal(price);
        let params = [
            ("symbol", symbol),
            ("side", side.as_str()),
            ("type", OrderType::Limit.as_str()),
            ("timeInForce", time_in_force.as_str()),
            ("reduceOnly", bool_str(reduce_only)),
            ("quantity", quantity.as_str()),
            ("price", price.as_str()),
        ];

        self.rest
            .signed_json(Method::POST, F::path(ApiPath::Order), &params)
            .await
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        reduce_only: bool,
    ) -> Result<OrderResponse, ExchangeError> {
        let quantity = format_decimal(quantity);
        let params = [
            ("symbol", symbol),
            ("side", side.as_str()),
            ("type", OrderType::Market.as_str()),
            ("reduceOnly", bool_str(reduce_only)),
            ("quantity", quantity.as_str()),
        ];

        self.rest
            .signed_json(Method::POST, F::path(ApiPath::Order), &params)
            .await
    }

    /// Place a reduce-only stop-market order triggered at `stop_price`
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn place_stop_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        stop_price: Decimal,
        quantity: Decimal,
    ) -> Result<OrderResponse, ExchangeError> {
        let quantity = format_decimal(quantity);
        let stop_price = format_decimal(stop_price);
        let params = [
            ("symbol", symbol),
            ("side", side.as_str()),
            ("type", OrderType::StopMarket.as_str()),
            ("reduceOnly", "true"),
            ("quantity", quantity.as_str()),
            ("stopPrice", stop_price.as_str()),
        ];

        self.rest
            .signed_json(Method::POST, F::path(ApiPath::Order), &params)
            .await
    }

    /// Cancel one order by exchange id or by client id; at least one is required
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn cancel_order(
        &self,
        symbol: &str,
        order_id: Option<i64>,
        orig_client_order_id: Option<&str>,
    ) -> Result<OrderResponse, ExchangeError> {
        if order_id.is_none() && orig_client_order_id.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "either order_id or orig_client_order_id is required".to_string(),
            ));
        }

        let order_id_str = order_id.map(|id| id.to_string());
        let mut params = vec![("symbol", symbol)];

        if let Some(ref id) = order_id_str {
            params.push(("orderId", id.as_str()));
        }
        if let Some(client_id) = orig_client_order_id {
            params.push(("origClientOrderId", client_id));
        }

        self.rest
            .signed_json(Method::DELETE, F::path(ApiPath::Order), &params)
            .await
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn cancel_all_orders(
        &self,
        symbol: &str,
    ) -> Result<CancelAllResponse, ExchangeError> {
        self.rest
            .signed_json(
                Method::DELETE,
                F::path(ApiPath::AllOpenOrders),
                &[("symbol", symbol)],
            )
            .await
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        self.rest
            .signed_json(Method::GET, F::path(ApiPath::Balance), &[])
            .await
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn get_account_information(&self) -> Result<AccountInformation, ExchangeError> {
        self.rest
            .signed_json(Method::GET, F::path(ApiPath::Account), &[])
            .await
    }
}

const fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
