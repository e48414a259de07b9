use serde::{Deserialize, Serialize};
use std::fmt;

/// Which deployment of the exchange to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkProfile {
    #[default]
    Main,
    Test,
}

impl NetworkProfile {
    pub const fn from_testnet(testnet: bool) -> Self {
        if testnet {
            Self::Test
        } else {
            Self::Main
        }
    }

    pub const fn is_testnet(self) -> bool {
        matches!(self, Self::Test)
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "mainnet"),
            Self::Test => write!(f, "testnet"),
        }
    }
}

/// Resolved base URLs for one network profile
///
/// `stream_base` carries no trailing slash; private streams append `/<listenKey>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub rest_base: String,
    pub stream_base: String,
}

impl Endpoints {
    pub fn new(rest_base: impl Into<String>, stream_base: impl Into<String>) -> Self {
        Self {
            rest_base: rest_base.into().trim_end_matches('/').to_string(),
            stream_base: stream_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of the public (market data) stream
    pub fn public_stream_url(&self) -> String {
        self.stream_base.clone()
    }

    /// URL of the private stream gated by `listen_key`
    pub fn user_stream_url(&self, listen_key: &str) -> String {
        format!("{}/{}", self.stream_base, listen_key)
    }
}

/// A subscription sent over a stream connection
///
/// The id is assigned client-side and never acknowledged back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub symbol: String,
    pub stream_type: String,
}

impl Subscription {
    /// Stream name as the gateway expects it: `<symbol lowercased>@<streamType>`
    pub fn stream_name(&self) -> String {
        stream_name(&self.symbol, &self.stream_type)
    }
}

pub fn stream_name(symbol: &str, stream_type: &str) -> String {
    format!("{}@{}", symbol.to_lowercase(), stream_type)
}
