use crate::core::errors::{ExchangeError, RequestError, ServerMessage};
use crate::core::kernel::signer::{encode_query, Clock, Signer, SystemClock};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, instrument, trace, warn};

/// Response header reporting the request weight used in the current minute
pub const USED_WEIGHT_HEADER: &str = "x-mbx-used-weight-1m";

/// REST client trait for making HTTP requests
///
/// Both modes buffer the full body before looking at the status. A status
/// other than 200 becomes [`ExchangeError::Api`]; failing to get any response
/// at all becomes [`ExchangeError::Connectivity`].
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make an unsigned request
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs, in wire order
    ///
    /// # Returns
    /// The raw response body
    async fn public_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<String, ExchangeError>;

    /// Make a signed request: `timestamp` and `signature` are appended to the
    /// query and the API key header is set
    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<String, ExchangeError>;

    /// Make an unsigned request with strongly-typed response
    async fn public_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let body = self.public_request(method, endpoint, query_params).await?;
        decode_body(&body)
    }

    /// Make a signed request with strongly-typed response
    async fn signed_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        let body = self.signed_request(method, endpoint, query_params).await?;
        decode_body(&body)
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ExchangeError> {
    serde_json::from_str(body)
        .map_err(|e| ExchangeError::Decode(format!("Failed to parse JSON response: {}", e)))
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Deadline for establishing a connection (TCP + TLS)
    pub connect_timeout: Duration,
    /// Deadline for a whole request; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            connect_timeout: Duration::from_secs(2),
            request_timeout: None,
            user_agent: "LotusX-Futures/0.1".to_string(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound every request to `timeout` end to end
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replace the timestamp source used for signed requests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let mut builder = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .user_agent(&self.config.user_agent);

        if let Some(timeout) = self.config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ExchangeError::InvalidParameters(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            clock: self.clock,
            used_weight: Arc::new(Mutex::new(None)),
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Cloning shares the connection pool and the rate-limit reading.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
    used_weight: Arc<Mutex<Option<u64>>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Last `X-MBX-USED-WEIGHT-1M` value seen on any response
    ///
    /// Advisory only; nothing in this crate throttles on it.
    pub fn last_used_weight(&self) -> Option<u64> {
        self.used_weight.lock().ok().and_then(|guard| *guard)
    }

    fn build_url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query)
        }
    }

    fn record_rate_limit(&self, endpoint: &str, response: &Response) {
        let used = response
            .headers()
            .get(USED_WEIGHT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        debug!(endpoint = %endpoint, used_weight = ?used, "rate limit used");

        if let Some(used) = used {
            if let Ok(mut guard) = self.used_weight.lock() {
                *guard = Some(used);
            }
        }
    }

    /// Buffer the body, then turn any non-200 status into a `RequestError`
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(
        &self,
        endpoint: &str,
        url: &str,
        response: Response,
    ) -> Result<String, ExchangeError> {
        self.record_rate_limit(endpoint, &response);

        let status = response.status();
        let body = response.text().await?;

        trace!("Response body: {}", body);

        if status == StatusCode::OK {
            return Ok(body);
        }

        let err = RequestError {
            status_code: status.as_u16(),
            url: url.to_string(),
            message: ServerMessage::from_body(&body),
        };
        warn!(endpoint = %endpoint, "{}", err);
        Err(err.into())
    }

    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint, signed = authenticated))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<String, ExchangeError> {
        let (url, headers) = if authenticated {
            let signer = self
                .signer
                .as_ref()
                .ok_or(ExchangeError::AuthenticationRequired)?;
            let signed = signer.sign_request(query_params, self.clock.now_millis())?;
            (self.build_url(endpoint, &signed.query), signed.headers)
        } else {
            (
                self.build_url(endpoint, &encode_query(query_params)),
                HashMap::new(),
            )
        };

        let mut request = self.client.request(method, &url);
        for (key, value) in &headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| {
            error!(endpoint = %endpoint, "Connectivity error: {}", e);
            ExchangeError::Connectivity(e)
        })?;

        self.handle_response(endpoint, &url, response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    async fn public_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<String, ExchangeError> {
        self.make_request(method, endpoint, query_params, false)
            .await
    }

    async fn signed_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<String, ExchangeError> {
        self.make_request(method, endpoint, query_params, true)
            .await
    }
}
