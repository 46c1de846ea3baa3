//! Per-call configuration.
//!
//! [`CallOptions`] is an explicit record with named optional fields —
//! headers, query parameters, payload, file attachments, and an optional
//! cache binding — built through validating methods rather than applied as a
//! sequence of side-effecting closures. An invalid header or an
//! unserializable payload is rejected when the option is set, before the
//! call is issued.

use crate::cache::ResponseCache;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a single call.
///
/// Created fresh per call and consumed by request construction. Queries and
/// files are kept in sorted maps so identical option sets always produce
/// identical URLs and cache keys.
///
/// # Examples
///
/// ```no_run
/// use easycall::{CallOptions, Client, InMemoryCache};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), easycall::Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/users")?
///     .build()?;
/// let cache = Arc::new(InMemoryCache::new());
///
/// let options = CallOptions::new()
///     .header("Content-Type", "application/json")?
///     .query("page", "1")
///     .payload(&serde_json::json!({"name": "morpheus"}))?
///     .cache(cache, Duration::from_secs(60), "create-user");
///
/// let response = client.post(options).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct CallOptions {
    pub(crate) headers: HeaderMap,
    pub(crate) queries: BTreeMap<String, String>,
    pub(crate) files: BTreeMap<String, PathBuf>,
    pub(crate) payload: Option<Value>,
    pub(crate) cache: Option<CacheBinding>,
}

impl CallOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    ///
    /// The `Content-Type` header selects the payload encoding; when absent it
    /// defaults to `application/json` at request construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter, appended URL-encoded to the endpoint.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.queries.insert(key.into(), value.into());
        self
    }

    /// Sets the payload, serialized eagerly to an opaque JSON value.
    ///
    /// How the value is encoded on the wire is decided by the `Content-Type`
    /// header at request construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload =
            Some(serde_json::to_value(payload).map_err(|e| Error::Serialization(e.to_string()))?);
        Ok(self)
    }

    /// Attaches a file for multipart encoding.
    ///
    /// `field` names the multipart part; the file's base name becomes the
    /// attachment filename. The file is read synchronously at request
    /// construction.
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.insert(field.into(), path.into());
        self
    }

    /// Binds a cache to this call.
    ///
    /// The idempotency tag namespaces cache keys so different logical
    /// operations on the same path do not collide.
    pub fn cache(
        mut self,
        cache: Arc<dyn ResponseCache>,
        ttl: Duration,
        idempotency: impl Into<String>,
    ) -> Self {
        self.cache = Some(CacheBinding {
            cache,
            ttl,
            idempotency: idempotency.into(),
        });
        self
    }
}

/// A per-call reference to an external cache capability.
#[derive(Clone)]
pub struct CacheBinding {
    pub(crate) cache: Arc<dyn ResponseCache>,
    pub(crate) ttl: Duration,
    pub(crate) idempotency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_validation_rejects_bad_names() {
        let result = CallOptions::new().header("not a header\n", "value");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn payload_serializes_eagerly() {
        #[derive(Serialize)]
        struct Body {
            name: &'static str,
        }
        let options = CallOptions::new().payload(&Body { name: "morpheus" }).unwrap();
        assert_eq!(
            options.payload,
            Some(serde_json::json!({"name": "morpheus"}))
        );
    }

    #[test]
    fn queries_keep_a_stable_sorted_order() {
        let options = CallOptions::new().query("b", "2").query("a", "1");
        let keys: Vec<&str> = options.queries.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
