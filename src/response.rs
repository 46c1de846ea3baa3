//! The response envelope returned from every call.
//!
//! [`CallResponse`] carries the status code and body bytes together with the
//! cache metadata for the call: whether the envelope was served from the
//! cache, and the cache key it was stored or found under.

use crate::{Error, Result};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A wrapper around the outcome of an HTTP call.
///
/// Non-2xx statuses are not errors at this layer; callers inspect
/// [`status`](CallResponse::status) and decide for themselves.
///
/// # Examples
///
/// ```no_run
/// use easycall::{CallOptions, Client};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), easycall::Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/users/123")?
///     .build()?;
///
/// let response = client.get(CallOptions::new()).await?;
/// println!("status: {}", response.status);
/// println!("from cache: {}", response.from_cache);
///
/// let user: User = response.json()?;
/// println!("name: {}", user.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    method: String,
    cache_key: String,

    /// `true` when this envelope was reconstructed from the cache instead of
    /// being fetched through the transport.
    pub from_cache: bool,

    /// The HTTP status code of the response.
    #[serde(with = "status_code")]
    pub status: StatusCode,

    /// The raw response body.
    pub body: Vec<u8>,
}

impl CallResponse {
    pub(crate) fn new(method: &http::Method, status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            method: method.to_string(),
            cache_key: String::new(),
            from_cache: false,
            status,
            body,
        }
    }

    /// A status-only envelope for the body-read failure contract.
    pub(crate) fn partial(method: &http::Method, status: StatusCode) -> Self {
        Self::new(method, status, Vec::new())
    }

    pub(crate) fn set_cache_key(&mut self, key: String) {
        self.cache_key = key;
    }

    pub(crate) fn mark_from_cache(&mut self, key: String) {
        self.from_cache = true;
        self.cache_key = key;
    }

    /// The HTTP method the call was issued with.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The cache key used for this call, or an empty string if no cache
    /// binding was active.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Deserializes the body as JSON into the requested type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization {
            serde_error: e.to_string(),
            status: self.status,
        })
    }

    /// The body rendered as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Encodes this envelope for cache storage.
    ///
    /// Together with [`from_cache_bytes`](CallResponse::from_cache_bytes)
    /// this is the serialization contract cache backends round-trip values
    /// through.
    pub fn to_cache_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decodes an envelope previously produced by
    /// [`to_cache_bytes`](CallResponse::to_cache_bytes).
    pub fn from_cache_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::CacheDecode(e.to_string()))
    }
}

mod status_code {
    use http::StatusCode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn cache_bytes_round_trip_preserves_every_field() {
        let mut envelope = CallResponse::new(
            &Method::POST,
            StatusCode::CREATED,
            br#"{"id":7}"#.to_vec(),
        );
        envelope.set_cache_key("POST_create-user_/users?".to_string());

        let bytes = envelope.to_cache_bytes().unwrap();
        let decoded = CallResponse::from_cache_bytes(&bytes).unwrap();

        assert_eq!(decoded.method(), "POST");
        assert_eq!(decoded.cache_key(), "POST_create-user_/users?");
        assert_eq!(decoded.status, StatusCode::CREATED);
        assert_eq!(decoded.body, envelope.body);
        assert!(!decoded.from_cache);
    }

    #[test]
    fn from_cache_bytes_rejects_garbage() {
        let result = CallResponse::from_cache_bytes(b"not an envelope");
        assert!(matches!(result, Err(Error::CacheDecode(_))));
    }

    #[test]
    fn json_failure_carries_status() {
        let envelope = CallResponse::new(&Method::GET, StatusCode::OK, b"not json".to_vec());
        match envelope.json::<serde_json::Value>() {
            Err(Error::Deserialization { status, .. }) => assert_eq!(status, StatusCode::OK),
            other => panic!("expected Deserialization error, got {:?}", other),
        }
    }

    #[test]
    fn partial_envelope_has_no_body_and_no_key() {
        let envelope = CallResponse::partial(&Method::GET, StatusCode::BAD_GATEWAY);
        assert_eq!(envelope.status, StatusCode::BAD_GATEWAY);
        assert!(envelope.body.is_empty());
        assert_eq!(envelope.cache_key(), "");
        assert!(!envelope.from_cache);
    }
}
