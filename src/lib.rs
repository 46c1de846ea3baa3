//! # Easycall - a convenience layer over an HTTP client
//!
//! Easycall wraps `reqwest` with a configurable request builder supporting
//! JSON, XML, URL-encoded form, and multipart payloads, transport-level
//! retries, and an optional pluggable response cache.
//!
//! ## Quick Start
//!
//! ```no_run
//! use easycall::{CallOptions, Client};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), easycall::Error> {
//!     // One client per endpoint; retry behavior is fixed at construction.
//!     let client = Client::builder()
//!         .endpoint("http://localhost:9000/json")?
//!         .retry_max(4)
//!         .retry_wait_max(Duration::from_millis(100))
//!         .build()?;
//!
//!     let options = CallOptions::new()
//!         .header("Content-Type", "application/json")?
//!         .payload(&serde_json::json!({
//!             "name": "morpheus",
//!             "age": 30,
//!             "email": "example@example.com",
//!         }))?;
//!
//!     let response = client.post(options).await?;
//!     println!("status: {}", response.status);
//!     println!("body: {}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Payload encoding
//!
//! The `Content-Type` header declared on the options selects the wire
//! encoding:
//!
//! - `application/x-www-form-urlencoded` — payload must be a map of strings
//! - `multipart/form-data` — payload must be a map of strings; files attached
//!   with [`CallOptions::file`] become file parts and the header is rewritten
//!   with the generated boundary
//! - `application/xml` — payload must be a map, nesting maps and strings;
//!   marshaled as an indented element tree
//! - anything else, or no header — JSON
//!
//! A payload whose shape does not match the declared content type fails
//! before any network I/O.
//!
//! ## Caching
//!
//! Attach a cache per call with [`CallOptions::cache`]. Responses with
//! status 200 or 201 are stored under a deterministic key (method +
//! idempotency tag + path and query); a later identical call is served from
//! the cache without touching the transport and comes back with
//! `from_cache == true`:
//!
//! ```no_run
//! use easycall::{CallOptions, Client, InMemoryCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), easycall::Error> {
//! # let client = Client::builder().endpoint("http://localhost:9000/users")?.build()?;
//! let cache = Arc::new(InMemoryCache::new());
//!
//! let options = CallOptions::new()
//!     .query("page", "1")
//!     .cache(cache.clone(), Duration::from_secs(60), "list-users");
//! let first = client.get(options.clone()).await?;
//! assert!(!first.from_cache);
//!
//! let second = client.get(options).await?;
//! assert!(second.from_cache);
//! # Ok(())
//! # }
//! ```
//!
//! Caching is best-effort: backend failures degrade to misses and store
//! failures never fail the call.
//!
//! ## Retries
//!
//! Retry and backoff live entirely in the transport collaborator. The
//! default [`RetryingTransport`] retries network errors and retryable
//! statuses (429 and 5xx except 501) with jittered exponential backoff,
//! honoring `Retry-After`, parameterized by
//! [`ClientBuilder::retry_max`] and [`ClientBuilder::retry_wait_max`].
//! Non-2xx statuses are otherwise not errors: a 404 comes back as an
//! ordinary envelope for the caller to inspect.

mod client;
mod encode;
mod error;
mod options;
mod request;
mod response;

pub mod cache;
pub mod logging;
pub mod transport;

pub use cache::{CacheError, InMemoryCache, ResponseCache};
pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use logging::{CallLogger, TracingLogger};
pub use options::{CacheBinding, CallOptions};
pub use response::CallResponse;
pub use transport::{RetryPolicy, RetryingTransport, Transport};
