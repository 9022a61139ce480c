//! Emitter error types.

use thiserror::Error;

/// Errors raised while building an [`Emitter`](crate::Emitter) or its lifetimes.
///
/// Delivery itself never fails with an error: a closed receiver or a `false`
/// from `once` is the only signal callers see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    /// Queue capacity outside `1..=MAX_BUFFER_SIZE`.
    #[error("Configuration error: buffer size must be between 1 and {max}, got {0}", max = crate::config::MAX_BUFFER_SIZE)]
    InvalidBufferSize(usize),

    /// A helper that spawns tasks was called outside a tokio runtime.
    #[error("Runtime error: {0}")]
    NoRuntime(String),
}

/// Result type for emitter construction.
pub type EmitterResult<T> = Result<T, EmitterError>;
