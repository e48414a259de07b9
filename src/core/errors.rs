use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Error codes Binance returns in the `code` field of a failed call
pub mod codes {
    pub const TIMESTAMP_WRONG: i64 = -1021;
    pub const SIGNATURE_WRONG: i64 = -1022;
    pub const PARAMETER_VALUE_WRONG: i64 = -1102;
    pub const PRECISION_WRONG: i64 = -1111;
    pub const SYMBOL_WRONG: i64 = -1121;
    pub const API_KEY_WRONG: i64 = -2014;
    pub const GREATER_THAN_MAX_QUANTITY: i64 = -4005;
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// No HTTP response was obtained (DNS, TCP, TLS, timeout)
    #[error("Connectivity error: {0}")]
    Connectivity(#[from] reqwest::Error),

    /// The server answered with a status other than 200
    #[error(transparent)]
    Api(#[from] RequestError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream connection is closed")]
    StreamClosed,

    #[error("A stream connection is already open; close it first")]
    StreamAlreadyOpen,

    #[error("An event router is already reading this stream")]
    RouterAlreadyRunning,

    #[error("Authentication required but no credentials configured")]
    AuthenticationRequired,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl ExchangeError {
    /// Binance error code carried by a structured API error, if any
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api(err) => err.message.code(),
            _ => None,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// `{code, msg}` body Binance sends alongside a non-200 status
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorPayload {
    pub code: i64,
    pub msg: String,
}

/// Message part of a failed call: the structured payload when the body parsed,
/// the raw body otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Structured(ApiErrorPayload),
    Raw(String),
}

impl ServerMessage {
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<ApiErrorPayload>(body)
            .map_or_else(|_| Self::Raw(body.to_string()), Self::Structured)
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Structured(payload) => Some(payload.code),
            Self::Raw(_) => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Structured(payload) => &payload.msg,
            Self::Raw(body) => body,
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(payload) => {
                write!(f, "Code: {} Reason: {}", payload.code, payload.msg)
            }
            Self::Raw(body) => write!(f, "Reason: {}", body),
        }
    }
}

/// One failed REST call. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Status Code: {status_code} - url used: {url} - {message}")]
pub struct RequestError {
    pub status_code: u16,
    /// Full URL including the query string (and signature, for signed calls)
    pub url: String,
    pub message: ServerMessage,
}
