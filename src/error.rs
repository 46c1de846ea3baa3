//! Error types for HTTP calls.
//!
//! This module provides error types that preserve maximum debugging information
//! while remaining ergonomic to use. Payload-shape and encoding problems fail
//! before any network I/O; transport problems are surfaced verbatim from the
//! transport collaborator.

use crate::response::CallResponse;
use http::StatusCode;
use std::path::PathBuf;

/// The main error type for HTTP calls.
///
/// # Examples
///
/// ```no_run
/// use easycall::{CallOptions, Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/users")?
///     .build()?;
///
/// match client.get(CallOptions::new()).await {
///     Ok(response) => println!("status: {}", response.status),
///     Err(Error::BodyRead { response, source }) => {
///         eprintln!("body read failed after status {}: {}", response.status, source);
///     }
///     Err(e) => eprintln!("call failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The supplied payload does not have the shape the declared content type
    /// requires.
    ///
    /// This is checked during request preparation, before any network I/O.
    #[error("payload for {content_type} must be {expected}")]
    PayloadShape {
        /// The declared content type.
        content_type: &'static str,
        /// A description of the required payload shape.
        expected: &'static str,
    },

    /// Failed to serialize the request payload.
    #[error("failed to serialize payload: {0}")]
    Serialization(String),

    /// A multipart file attachment could not be read.
    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The transport gave up after exhausting its retry budget.
    ///
    /// The retry/backoff policy lives entirely in the transport; this layer
    /// only surfaces the outcome.
    #[error("giving up after {attempts} attempts")]
    RetriesExhausted {
        /// The total number of attempts made (initial try included).
        attempts: usize,
        /// The status of the last response, when the final attempt produced one.
        last_status: Option<StatusCode>,
        /// The last network error, when the final attempt did not produce a response.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The response status arrived but the body could not be read.
    ///
    /// This carries a partially populated envelope (status present, body
    /// absent) alongside the read error, so callers can still observe the
    /// status of the failed exchange.
    #[error("failed to read response body (status {})", .response.status)]
    BodyRead {
        /// The partial envelope: method and status set, body empty.
        response: Box<CallResponse>,
        /// The underlying read error.
        #[source]
        source: reqwest::Error,
    },

    /// Failed to deserialize the response body into the expected type.
    ///
    /// Preserves the serde error message and the HTTP status code, making it
    /// easy to debug deserialization issues in production.
    #[error("failed to deserialize response body (status {status}): {serde_error}")]
    Deserialization {
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// A cached envelope could not be decoded.
    ///
    /// The execution engine treats this as a cache miss; the variant exists
    /// for the envelope's public decode contract.
    #[error("failed to decode cached response: {0}")]
    CacheDecode(String),

    /// Invalid configuration was provided, such as an invalid header value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An invalid endpoint URL was provided.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RetriesExhausted { last_status, .. } => *last_status,
            Error::BodyRead { response, .. } => Some(response.status),
            Error::Deserialization { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this error was detected before any request was issued.
    ///
    /// Shape mismatches, serialization failures, unreadable attachments, and
    /// configuration problems never reach the transport.
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            Error::PayloadShape { .. }
                | Error::Serialization(_)
                | Error::Attachment { .. }
                | Error::Configuration(_)
                | Error::InvalidUrl(_)
        )
    }
}

/// A specialized `Result` type for HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;
