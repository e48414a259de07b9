use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClient, StreamConnection, SubscriptionIds, WsConfig};
use crate::core::types::{Endpoints, NetworkProfile, Subscription};
use crate::exchanges::binance_futures::builder::{build_rest_client, resolve_endpoints};
use crate::exchanges::binance_futures::codec::FuturesCodec;
use crate::exchanges::binance_futures::family::ContractFamily;
use crate::exchanges::binance_futures::rest::FuturesRestClient;
use crate::exchanges::binance_futures::router::{EventRouter, RouterOutputs};
use crate::exchanges::binance_futures::types::{
    ListenKey, STREAM_BOOK_TICKER, STREAM_LIQUIDATION, STREAM_SYMBOL_TICKER,
};
use crate::exchanges::binance_futures::user_stream::UserStream;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

pub type FuturesStream = StreamConnection<FuturesCodec>;

/// Entry point for one contract family on one network
///
/// Owns the REST surface and at most one open stream. Subscription ids come
/// from a counter that outlives individual connections.
pub struct FuturesAccess<F: ContractFamily, R: RestClient = ReqwestRest> {
    config: ExchangeConfig,
    endpoints: Endpoints,
    api: FuturesRestClient<R, F>,
    user_stream: UserStream<R, F>,
    ws_config: WsConfig,
    ids: Arc<SubscriptionIds>,
    stream: Option<Arc<FuturesStream>>,
}

impl<F: ContractFamily> FuturesAccess<F, ReqwestRest> {
    /// Build with the family's endpoints for `config.network`, honoring overrides
    pub fn new(config: ExchangeConfig) -> Result<Self, ExchangeError> {
        let endpoints = resolve_endpoints::<F>(&config);
        Self::with_endpoints(config, endpoints)
    }

    /// Build against explicit base URLs
    pub fn with_endpoints(
        config: ExchangeConfig,
        endpoints: Endpoints,
    ) -> Result<Self, ExchangeError> {
        let rest = build_rest_client::<F>(&config, &endpoints)?;
        Ok(Self::from_parts(config, endpoints, rest))
    }

    /// Switch network for subsequent calls and connections
    ///
    /// An already open stream stays connected where it is.
    pub fn use_network(&mut self, network: NetworkProfile) -> Result<(), ExchangeError> {
        let mut config = self.config.clone().network(network);
        config.base_url = None;
        config.stream_url = None;

        let endpoints = resolve_endpoints::<F>(&config);
        let rest = build_rest_client::<F>(&config, &endpoints)?;

        info!(exchange = F::NAME, %network, "network switched");
        self.api = FuturesRestClient::new(rest.clone());
        self.user_stream = UserStream::new(rest);
        self.endpoints = endpoints;
        self.config = config;
        Ok(())
    }
}

impl<F: ContractFamily, R: RestClient + Clone> FuturesAccess<F, R> {
    /// Assemble from an existing transport
    pub fn from_parts(config: ExchangeConfig, endpoints: Endpoints, rest: R) -> Self {
        Self {
            config,
            endpoints,
            api: FuturesRestClient::new(rest.clone()),
            user_stream: UserStream::new(rest),
            ws_config: WsConfig::default(),
            ids: Arc::new(SubscriptionIds::new()),
            stream: None,
        }
    }

    #[must_use]
    pub fn with_ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = ws_config;
        self
    }

    pub const fn network(&self) -> NetworkProfile {
        self.config.network
    }

    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Market data, order and account REST calls
    pub const fn api(&self) -> &FuturesRestClient<R, F> {
        &self.api
    }

    /// Listen-key lifecycle for the private stream
    pub const fn user_stream(&self) -> &UserStream<R, F> {
        &self.user_stream
    }

    /// The current stream, open or not
    pub fn stream(&self) -> Option<Arc<FuturesStream>> {
        self.stream.clone()
    }

    /// The id the next subscription will carry
    pub fn next_subscription_id(&self) -> u64 {
        self.ids.peek()
    }

    /// Open the public market data stream
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn open_stream(&mut self) -> Result<Arc<FuturesStream>, ExchangeError> {
        let url = self.endpoints.public_stream_url();
        self.dial(&url).await
    }

    /// Open the private stream for an already obtained listen key
    #[instrument(skip(self, listen_key), fields(exchange = F::NAME))]
    pub async fn open_stream_with_key(
        &mut self,
        listen_key: &str,
    ) -> Result<Arc<FuturesStream>, ExchangeError> {
        let url = self.endpoints.user_stream_url(listen_key);
        self.dial(&url).await
    }

    /// Obtain a listen key and open the private stream on it
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn open_user_stream(
        &mut self,
    ) -> Result<(ListenKey, Arc<FuturesStream>), ExchangeError> {
        self.ensure_no_open_stream()?;
        let key = self.user_stream.obtain().await?;
        let stream = self.open_stream_with_key(&key.listen_key).await?;
        Ok((key, stream))
    }

    fn ensure_no_open_stream(&self) -> Result<(), ExchangeError> {
        match &self.stream {
            Some(stream) if stream.is_open() => Err(ExchangeError::StreamAlreadyOpen),
            _ => Ok(()),
        }
    }

    async fn dial(&mut self, url: &str) -> Result<Arc<FuturesStream>, ExchangeError> {
        self.ensure_no_open_stream()?;

        let connection = StreamConnection::open(
            url,
            F::NAME,
            FuturesCodec,
            &self.ws_config,
            self.ids.clone(),
        )
        .await?;

        let connection = Arc::new(connection);
        self.stream = Some(connection.clone());
        Ok(connection)
    }

    fn open_connection(&self) -> Result<Arc<FuturesStream>, ExchangeError> {
        match &self.stream {
            Some(stream) if stream.is_open() => Ok(stream.clone()),
            _ => Err(ExchangeError::StreamClosed),
        }
    }

    /// Subscribe to `<symbol>@<stream_type>` on the open stream
    pub async fn subscribe(
        &self,
        symbol: &str,
        stream_type: &str,
    ) -> Result<Subscription, ExchangeError> {
        self.open_connection()?.subscribe(symbol, stream_type).await
    }

    /// Unsubscribe from `<symbol>@<stream_type>`; returns the request id
    pub async fn unsubscribe(&self, symbol: &str, stream_type: &str) -> Result<u64, ExchangeError> {
        self.open_connection()?.unsubscribe(symbol, stream_type).await
    }

    /// 24 hour rolling ticker, routed to the price channel
    pub async fn subscribe_symbol_ticker(
        &self,
        symbol: &str,
    ) -> Result<Subscription, ExchangeError> {
        self.subscribe(symbol, STREAM_SYMBOL_TICKER).await
    }

    pub async fn subscribe_book_ticker(&self, symbol: &str) -> Result<Subscription, ExchangeError> {
        self.subscribe(symbol, STREAM_BOOK_TICKER).await
    }

    pub async fn subscribe_liquidation(&self, symbol: &str) -> Result<Subscription, ExchangeError> {
        self.subscribe(symbol, STREAM_LIQUIDATION).await
    }

    /// Close the current stream, if any; a new one may be opened afterwards
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn close_stream(&mut self) -> Result<(), ExchangeError> {
        match self.stream.take() {
            Some(stream) => stream.close().await,
            None => Ok(()),
        }
    }

    /// Spawn an [`EventRouter`] draining the open stream
    ///
    /// The task ends when the stream closes and yields the terminating error.
    /// Only one router may read a connection; a second call fails with
    /// `RouterAlreadyRunning` until a new stream is opened.
    pub fn spawn_router(
        &self,
        buffer: usize,
    ) -> Result<(JoinHandle<ExchangeError>, RouterOutputs), ExchangeError> {
        let connection = self.open_connection()?;
        if !connection.claim_reader() {
            return Err(ExchangeError::RouterAlreadyRunning);
        }
        let (router, outputs) = EventRouter::new(buffer);
        Ok((tokio::spawn(router.run(connection)), outputs))
    }
}
