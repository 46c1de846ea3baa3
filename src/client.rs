//! HTTP client bound to a single endpoint.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] to
//! configure the endpoint, retry parameters, logger, and (for tests) a custom
//! transport, then issue calls with [`get`](Client::get),
//! [`post`](Client::post), or [`call`](Client::call).

use crate::cache::{cache_key, CacheError};
use crate::logging::CallLogger;
use crate::options::CallOptions;
use crate::request::PreparedRequest;
use crate::response::CallResponse;
use crate::transport::{RetryPolicy, RetryingTransport, Transport};
use crate::{Error, Result};
use http::{Method, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const DEFAULT_RETRY_MAX: usize = 3;
const DEFAULT_RETRY_WAIT_MAX: Duration = Duration::from_secs(1);

/// A client bound to one endpoint, sharing a transport across calls.
///
/// Cloning is cheap (shared inner state), and a clone can be moved freely
/// across tasks. The injected transport and any per-call cache must be safe
/// for concurrent use if calls are issued in parallel; this layer assumes,
/// but does not enforce, that.
///
/// # Examples
///
/// ```no_run
/// use easycall::{CallOptions, Client};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), easycall::Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/users")?
///     .retry_max(4)
///     .retry_wait_max(Duration::from_millis(100))
///     .build()?;
///
/// let options = CallOptions::new()
///     .header("Content-Type", "application/json")?
///     .payload(&serde_json::json!({"name": "morpheus", "age": 30}))?;
///
/// let response = client.post(options).await?;
/// println!("status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    endpoint: Url,
    transport: Arc<dyn Transport>,
    logger: Option<Arc<dyn CallLogger>>,
}

impl Client {
    /// Creates a new [`ClientBuilder`] with default retry parameters.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Issues a GET to the configured endpoint.
    pub async fn get(&self, options: CallOptions) -> Result<CallResponse> {
        self.call(Method::GET, options).await
    }

    /// Issues a POST to the configured endpoint.
    pub async fn post(&self, options: CallOptions) -> Result<CallResponse> {
        self.call(Method::POST, options).await
    }

    /// Issues a request with a custom method to the configured endpoint.
    ///
    /// This is the engine behind [`get`](Client::get) and
    /// [`post`](Client::post): it prepares the request, consults the cache,
    /// dispatches through the transport on a miss, and populates the cache
    /// after a 200/201 response.
    pub async fn call(&self, method: Method, options: CallOptions) -> Result<CallResponse> {
        let prepared = PreparedRequest::build(method, &self.inner.endpoint, options)?;

        let started = Instant::now();
        let path = prepared.url.path().to_string();
        let method_name = prepared.method.to_string();

        let result = self.dispatch(prepared).await;

        // One timing line per call, success or failure.
        if let Some(logger) = &self.inner.logger {
            let elapsed = format!("{:?}", started.elapsed());
            logger.debug(
                "request timing",
                &[
                    ("url", path.as_str()),
                    ("method", method_name.as_str()),
                    ("elapsed", elapsed.as_str()),
                ],
            );
        }

        result
    }

    async fn dispatch(&self, prepared: PreparedRequest) -> Result<CallResponse> {
        let key = prepared
            .cache
            .as_ref()
            .map(|binding| cache_key(&prepared.method, &binding.idempotency, &prepared.url));

        if let (Some(binding), Some(key)) = (&prepared.cache, &key) {
            match binding.cache.get(key).await {
                Ok(bytes) => match CallResponse::from_cache_bytes(&bytes) {
                    Ok(mut cached) => {
                        tracing::debug!(key = %key, "cache hit, skipping dispatch");
                        cached.mark_from_cache(key.clone());
                        return Ok(cached);
                    }
                    Err(error) => {
                        tracing::warn!(key = %key, error = %error, "discarding undecodable cache entry");
                    }
                },
                Err(CacheError::NotFound) => {
                    tracing::debug!(key = %key, "cache miss");
                }
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "cache lookup failed, treating as miss");
                }
            }
        }

        let method = prepared.method.clone();
        let binding = prepared.cache.clone();
        tracing::debug!(method = %method, url = %prepared.url, "dispatching request");

        let response = self.inner.transport.send(prepared.into_reqwest()).await?;
        let status = response.status();

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(source) => {
                return Err(Error::BodyRead {
                    response: Box::new(CallResponse::partial(&method, status)),
                    source,
                });
            }
        };

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "received response");
        let mut envelope = CallResponse::new(&method, status, body);

        if let (Some(binding), Some(key)) = (binding, key) {
            if status == StatusCode::OK || status == StatusCode::CREATED {
                envelope.set_cache_key(key);
                // Best-effort: a store failure never fails the call.
                match envelope.to_cache_bytes() {
                    Ok(bytes) => {
                        if let Err(error) = binding
                            .cache
                            .set(envelope.cache_key(), bytes, binding.ttl)
                            .await
                        {
                            tracing::warn!(
                                key = %envelope.cache_key(),
                                error = %error,
                                "failed to store response in cache"
                            );
                        }
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "failed to encode response for cache");
                    }
                }
            }
        }

        Ok(envelope)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Retry parameters are copied into the underlying retrying transport when
/// [`build`](ClientBuilder::build) runs; the builder is consumed, so the
/// configuration cannot drift afterwards.
pub struct ClientBuilder {
    endpoint: Option<Url>,
    retry_max: usize,
    retry_wait_max: Duration,
    logger: Option<Arc<dyn CallLogger>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a builder with the default retry count (3) and wait ceiling (1s).
    pub fn new() -> Self {
        Self {
            endpoint: None,
            retry_max: DEFAULT_RETRY_MAX,
            retry_wait_max: DEFAULT_RETRY_WAIT_MAX,
            logger: None,
            transport: None,
        }
    }

    /// Sets the endpoint all calls are issued against.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn endpoint(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.endpoint = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the maximum number of retries the transport may attempt.
    pub fn retry_max(mut self, retries: usize) -> Self {
        self.retry_max = retries;
        self
    }

    /// Sets the ceiling for any single retry wait.
    pub fn retry_wait_max(mut self, wait: Duration) -> Self {
        self.retry_wait_max = wait;
        self
    }

    /// Sets the logger the timing line is emitted through.
    pub fn logger(mut self, logger: Arc<dyn CallLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Replaces the default retrying transport.
    ///
    /// A custom transport owns its own retry policy; the builder's retry
    /// parameters only apply to the default transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint was provided or the HTTP client cannot
    /// be constructed.
    pub fn build(self) -> Result<Client> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::Configuration("endpoint is required".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let http_client = reqwest::Client::builder().build().map_err(|e| {
                    Error::Configuration(format!("failed to build HTTP client: {e}"))
                })?;
                Arc::new(RetryingTransport::new(
                    http_client,
                    RetryPolicy {
                        max_retries: self.retry_max,
                        wait_max: self.retry_wait_max,
                        ..RetryPolicy::default()
                    },
                ))
            }
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                endpoint,
                transport,
                logger: self.logger,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_an_endpoint() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn endpoint_rejects_invalid_urls() {
        let result = ClientBuilder::new().endpoint("not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
