//! Pluggable response caching.
//!
//! A cache is an external collaborator attached per call through
//! [`CallOptions::cache`](crate::CallOptions::cache). The execution engine
//! computes a deterministic key from the method, the caller-supplied
//! idempotency tag, and the request path plus query string, checks the cache
//! before dispatching, and stores successful (200/201) envelopes after.
//!
//! Caching is best-effort: backend failures are logged and treated as misses,
//! never surfaced to the caller.

use async_trait::async_trait;
use http::Method;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// Errors produced by a cache backend.
///
/// `NotFound` is the ordinary miss signal; `Backend` covers everything else
/// (connection loss, serialization problems inside the backend, poisoned
/// locks). The execution engine treats both as a miss but logs `Backend`
/// failures at warn level so they stay observable.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The key is not present (or has expired).
    #[error("key not found")]
    NotFound,

    /// The backend failed to serve the request.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// An external cache capability: get/set/delete by string key.
///
/// Values are opaque bytes; the engine stores envelopes through the
/// [`CallResponse`](crate::CallResponse) serialization contract
/// (`to_cache_bytes`/`from_cache_bytes`). Implementations must be safe for
/// concurrent use if the caller issues parallel calls.
///
/// # Examples
///
/// ```
/// use easycall::cache::{CacheError, ResponseCache};
/// use async_trait::async_trait;
/// use std::time::Duration;
///
/// struct NullCache;
///
/// #[async_trait]
/// impl ResponseCache for NullCache {
///     async fn get(&self, _key: &str) -> Result<Vec<u8>, CacheError> {
///         Err(CacheError::NotFound)
///     }
///     async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
///         Ok(())
///     }
///     async fn delete(&self, _key: &str) -> Result<(), CacheError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Looks up a value, returning [`CacheError::NotFound`] on a miss.
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Stores a value under `key` for `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Removes a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Computes the cache key for a call.
///
/// Key layout: `METHOD_idempotencyTag_path?rawQuery`. The query string is the
/// one already appended to the URL, so identical option sets always produce
/// identical keys.
pub(crate) fn cache_key(method: &Method, idempotency: &str, url: &Url) -> String {
    format!(
        "{}_{}_{}?{}",
        method,
        idempotency,
        url.path(),
        url.query().unwrap_or("")
    )
}

/// A process-local [`ResponseCache`] backed by a `HashMap`.
///
/// Entries expire lazily: an expired entry is removed on the next lookup.
/// Intended for tests and single-process consumers; anything shared belongs
/// in an external backend implementing [`ResponseCache`].
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl InMemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("cache mutex poisoned".to_string()))?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                Err(CacheError::NotFound)
            }
            None => Err(CacheError::NotFound),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("cache mutex poisoned".to_string()))?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Backend("cache mutex poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
