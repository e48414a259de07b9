use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the public API key on every signed call
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Output of signing: headers to attach and the complete query string
/// (business parameters, `timestamp`, then `signature` last)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    pub headers: HashMap<String, String>,
    pub query: String,
}

pub type SignatureResult = Result<SignedQuery, ExchangeError>;

/// Signer trait for request authentication
///
/// The timestamp is passed in rather than read by the signer so callers (and
/// tests) control the clock.
pub trait Signer: Send + Sync {
    /// Sign the given parameters
    ///
    /// # Arguments
    /// * `params` - Business parameters in the order they go on the wire
    /// * `timestamp` - Request timestamp in milliseconds since epoch
    fn sign_request(&self, params: &[(&str, &str)], timestamp: u64) -> SignatureResult;
}

/// Source of request timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Encode parameters as `application/x-www-form-urlencoded`, keeping caller order
pub fn encode_query<K: AsRef<str>, V: AsRef<str>>(params: &[(K, V)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

/// HMAC-SHA256 signer used by Binance futures
pub struct HmacSigner {
    api_key: String,
    secret_key: String,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key,
        }
    }

    /// Lowercase hex HMAC-SHA256 of `payload`
    pub fn signature(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ExchangeError::Signing(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign_request(&self, params: &[(&str, &str)], timestamp: u64) -> SignatureResult {
        let timestamp = format!("{:013}", timestamp);
        let mut signed_params = params.to_vec();
        signed_params.push(("timestamp", timestamp.as_str()));

        let payload = encode_query(&signed_params);
        let signature = self.signature(&payload)?;

        let mut headers = HashMap::new();
        headers.insert(API_KEY_HEADER.to_string(), self.api_key.clone());

        Ok(SignedQuery {
            headers,
            query: format!("{}&signature={}", payload, signature),
        })
    }
}
