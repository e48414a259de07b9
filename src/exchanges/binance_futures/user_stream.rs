use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::binance_futures::family::{ApiPath, ContractFamily};
use crate::exchanges::binance_futures::types::ListenKey;
use reqwest::Method;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Keep-alive cadence recommended by the exchange; keys expire after 60 minutes
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Listen-key lifecycle for the private stream
///
/// The key is account-scoped: obtaining while one is active returns the same
/// key and extends it.
pub struct UserStream<R: RestClient, F: ContractFamily> {
    rest: R,
    _family: PhantomData<F>,
}

impl<R: RestClient + Clone, F: ContractFamily> Clone for UserStream<R, F> {
    fn clone(&self) -> Self {
        Self::new(self.rest.clone())
    }
}

impl<R: RestClient, F: ContractFamily> UserStream<R, F> {
    pub const fn new(rest: R) -> Self {
        Self {
            rest,
            _family: PhantomData,
        }
    }

    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn obtain(&self) -> Result<ListenKey, ExchangeError> {
        let key: ListenKey = self
            .rest
            .signed_json(Method::POST, F::path(ApiPath::ListenKey), &[])
            .await?;
        info!("listen key obtained");
        Ok(key)
    }

    /// Extend the active key by another 60 minutes
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn keep_alive(&self) -> Result<(), ExchangeError> {
        self.rest
            .signed_request(Method::PUT, F::path(ApiPath::ListenKey), &[])
            .await?;
        debug!("listen key extended");
        Ok(())
    }

    /// Invalidate the active key; the private stream stops delivering
    #[instrument(skip(self), fields(exchange = F::NAME))]
    pub async fn revoke(&self) -> Result<(), ExchangeError> {
        self.rest
            .signed_request(Method::DELETE, F::path(ApiPath::ListenKey), &[])
            .await?;
        info!("listen key revoked");
        Ok(())
    }
}

impl<R, F> UserStream<R, F>
where
    R: RestClient + Clone + 'static,
    F: ContractFamily,
{
    /// Call [`keep_alive`](Self::keep_alive) every `interval` until the task
    /// is aborted
    ///
    /// The first call happens one `interval` after spawning. Failures are
    /// logged and the loop carries on.
    pub fn spawn_keep_alive(&self, interval: Duration) -> JoinHandle<()> {
        let stream = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = stream.keep_alive().await {
                    warn!(exchange = F::NAME, "listen key keep-alive failed: {}", e);
                }
            }
        })
    }
}
