use crate::core::types::NetworkProfile;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub network: NetworkProfile,
    /// Overrides the REST base URL of the selected network
    pub base_url: Option<String>,
    /// Overrides the stream base URL of the selected network
    pub stream_url: Option<String>,
    /// End-to-end deadline for one REST call; `None` means no deadline
    pub request_timeout: Option<Duration>,
}

// Never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("network", &self.network)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("stream_url", &self.stream_url)?;
        state.serialize_field(
            "request_timeout_ms",
            &self.request_timeout.map(|t| t.as_millis() as u64),
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            network: NetworkProfile,
            base_url: Option<String>,
            stream_url: Option<String>,
            request_timeout_ms: Option<u64>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            network: helper.network,
            base_url: helper.base_url,
            stream_url: helper.stream_url,
            request_timeout: helper.request_timeout_ms.map(Duration::from_millis),
        })
    }
}

impl ExchangeConfig {
    /// Create a new mainnet configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            network: NetworkProfile::Main,
            base_url: None,
            stream_url: None,
            request_timeout: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BINANCE_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY` (e.g., `BINANCE_SECRET_KEY`)
    /// - `{PREFIX}_TESTNET` (optional, defaults to false)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_STREAM_URL` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet_var = format!("{}_TESTNET", prefix);
        let testnet = match env::var(&testnet_var) {
            Ok(value) => value.parse::<bool>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{} must be true or false, got '{}'",
                    testnet_var, value
                ))
            })?,
            Err(_) => false,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            network: NetworkProfile::from_testnet(testnet),
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            stream_url: env::var(format!("{}_STREAM_URL", prefix)).ok(),
            request_timeout: None,
        })
    }

    /// Load a `.env` file (if present) and then read [`Self::from_env`]
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Like [`Self::from_env_file`] with a custom file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // No file; system environment only
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public endpoints only (market data, public stream)
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has credentials for signed calls
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub fn network(mut self, network: NetworkProfile) -> Self {
        self.network = network;
        self
    }

    /// Shorthand for `network(NetworkProfile::from_testnet(testnet))`
    #[must_use]
    pub fn testnet(mut self, testnet: bool) -> Self {
        self.network = NetworkProfile::from_testnet(testnet);
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn stream_url(mut self, stream_url: String) -> Self {
        self.stream_url = Some(stream_url);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_redacts_secrets() {
        let config = ExchangeConfig::new("public".to_string(), "very-secret".to_string())
            .testnet(true);
        let json = serde_json::to_string(&config).unwrap();

        assert!(!json.contains("very-secret"));
        assert!(!json.contains("public\""));
        assert!(json.contains("[REDACTED]"));
        assert!(json.contains("\"network\":\"test\""));
    }

    #[test]
    fn test_deserialize() {
        let config: ExchangeConfig = serde_json::from_str(
            r#"{"api_key":"k","secret_key":"s","network":"test","request_timeout_ms":1500}"#,
        )
        .unwrap();

        assert_eq!(config.api_key(), "k");
        assert_eq!(config.secret_key(), "s");
        assert_eq!(config.network, NetworkProfile::Test);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_read_only_has_no_credentials() {
        assert!(!ExchangeConfig::read_only().has_credentials());
        assert!(ExchangeConfig::new("a".into(), "b".into()).has_credentials());
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = ExchangeConfig::from_env("LOTUSX_FUTURES_UNSET_PREFIX");
        match result {
            Err(ConfigError::MissingEnvironmentVariable(var)) => {
                assert_eq!(var, "LOTUSX_FUTURES_UNSET_PREFIX_API_KEY");
            }
            other => panic!("expected missing variable, got {:?}", other),
        }
    }
}
