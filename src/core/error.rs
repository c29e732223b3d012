//! Error types for the fetch client and price providers

use reqwest::StatusCode;
use thiserror::Error;

/// The request never produced a usable response body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error: {status} for {url}")]
    Status { url: String, status: StatusCode },
}

/// The response body did not decode into the expected shape.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),
    #[error("Invalid price for {field}: {value}")]
    InvalidPrice { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// A client failure tagged with the provider that issued the request.
#[derive(Debug, Error)]
#[error("Fetching prices from {provider} failed: {source}")]
pub struct ProviderError {
    pub provider: &'static str,
    #[source]
    pub source: ClientError,
}

impl ProviderError {
    pub fn new(provider: &'static str, source: ClientError) -> Self {
        Self { provider, source }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self.source, ClientError::Fetch(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self.source, ClientError::Parse(_))
    }
}
