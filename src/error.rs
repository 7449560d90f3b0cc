use std::sync::Arc;

use thiserror::Error;

use crate::path::PatternError;

/// An observer invoked when a handler fails to complete normally (a
/// panic, or a request timeout). Registered via `ServerConfig::on_exception`.
pub type ExceptionObserver = Arc<dyn Fn(&Error) + Send + Sync>;

/// Central error type for the weft framework.
///
/// Route misses, extractor failures, and handler-produced error responses
/// are *not* represented here — they resolve to an in-band [`crate::Response`]
/// per the framework's error-handling policy (errors recovered locally when a
/// valid HTTP response can still be produced).
#[derive(Debug, Error)]
pub enum Error {
    /// A path pattern failed grammar validation at route-construction time.
    #[error("invalid route pattern: {0}")]
    Path(#[from] PatternError),

    /// Two routes registered the same (method-or-ANY, token sequence).
    #[error("route already exists for {method} {pattern}")]
    RouteAlreadyExists { method: String, pattern: String },

    /// Underlying I/O error from the OS or network.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A connection or request exceeded a configured deadline.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// A handler task panicked instead of returning a response.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// Invalid listen address or configuration.
    #[error("invalid server configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
