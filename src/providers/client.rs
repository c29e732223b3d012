//! HTTP GET with a TTL cache of parsed responses

use crate::core::cache::Cache;
use crate::core::error::{ClientError, FetchError, ParseError};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parsed responses of any type, shared between every request shape.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Turns a response body into a typed value.
pub trait ResponseParser: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    fn parse(&self, body: &[u8]) -> Result<Self::Output, ParseError>;
}

/// Decodes the body as JSON into `T` with no further validation.
pub struct JsonParser<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonParser<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResponseParser for JsonParser<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Output = T;

    fn parse(&self, body: &[u8]) -> Result<T, ParseError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// A single cacheable GET.
///
/// Requests sharing a `cache_key` must fetch the same resource with the same
/// parser; the client treats them as interchangeable.
#[derive(Debug, Clone)]
pub struct FetchRequest<P> {
    pub url: String,
    pub cache_key: String,
    pub ttl: Duration,
    pub parser: P,
}

#[derive(Clone)]
pub struct CachingHttpClient {
    http: reqwest::Client,
    cache: Arc<dyn Cache<String, CachedValue>>,
}

impl CachingHttpClient {
    pub fn new(
        cache: Arc<dyn Cache<String, CachedValue>>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coinbani/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(http, cache))
    }

    pub fn with_client(http: reqwest::Client, cache: Arc<dyn Cache<String, CachedValue>>) -> Self {
        Self { http, cache }
    }

    /// Returns the cached value for `request.cache_key` while it is fresh,
    /// otherwise fetches, parses and caches the response.
    ///
    /// Failed fetches and failed parses are never cached.
    #[instrument(
        name = "CachedGet",
        skip(self, request),
        fields(url = %request.url, cache_key = %request.cache_key)
    )]
    pub async fn get<P: ResponseParser>(
        &self,
        request: FetchRequest<P>,
    ) -> Result<P::Output, ClientError> {
        let url = Url::parse(&request.url)
            .map_err(|e| ClientError::InvalidRequest(format!("{}: {e}", request.url)))?;
        if request.ttl.is_zero() {
            return Err(ClientError::InvalidRequest(format!(
                "ttl must be positive for cache key: {}",
                request.cache_key
            )));
        }

        if let Some(cached) = self.cache.get(&request.cache_key).await {
            match cached.downcast::<P::Output>() {
                Ok(value) => return Ok(value.as_ref().clone()),
                Err(_) => debug!("Cached value has a different type, refetching"),
            }
        }

        debug!("Requesting {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: request.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url,
                status,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: request.url.clone(),
                source,
            })?;

        let value = request.parser.parse(&body)?;
        self.cache
            .put(request.cache_key, Arc::new(value.clone()), request.ttl)
            .await;

        Ok(value)
    }
}
