//! The optional logging capability.
//!
//! The execution engine emits one timing line per call — URL path, method,
//! elapsed duration — through a [`CallLogger`] if one is configured. The
//! capability is a single narrow trait implemented by adapters; ambient
//! diagnostics (retries, cache misses) flow through `tracing` regardless.

/// A leveled debug sink with key-value fields.
///
/// Implement this to route call timing into your logging system, or use
/// [`TracingLogger`] to emit through `tracing`.
pub trait CallLogger: Send + Sync {
    /// Emits one debug line with the given message and fields.
    fn debug(&self, message: &str, fields: &[(&str, &str)]);
}

/// A [`CallLogger`] adapter that emits through `tracing` at debug level.
///
/// # Examples
///
/// ```no_run
/// use easycall::{Client, TracingLogger};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), easycall::Error> {
/// let client = Client::builder()
///     .endpoint("https://api.example.com/users")?
///     .logger(Arc::new(TracingLogger))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CallLogger for TracingLogger {
    fn debug(&self, message: &str, fields: &[(&str, &str)]) {
        tracing::debug!(fields = ?fields, "{message}");
    }
}
