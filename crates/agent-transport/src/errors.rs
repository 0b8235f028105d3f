//! Transport error taxonomy.

use thiserror::Error;

/// Errors raised by A2A Transport and Discovery.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Discovery has no known endpoint for the requested agent.
    #[error("target agent '{0}' is unknown")]
    TargetUnknown(String),

    /// The destination could not be reached (connection refused, DNS, etc.).
    #[error("destination '{0}' is unreachable: {1}")]
    Unreachable(String, String),

    /// The call did not complete within its deadline.
    #[error("call to '{0}' timed out")]
    Timeout(String),

    /// The destination's circuit breaker is open.
    #[error("circuit open for destination '{0}'")]
    CircuitOpen(String),

    /// Authentication failed (bad bearer token or mTLS identity).
    #[error("unauthorized call to '{0}'")]
    Unauthorized(String),

    /// The response did not conform to the expected wire shape.
    #[error("protocol error from '{0}': {1}")]
    ProtocolError(String, String),

    /// The per-destination in-flight/queue limit was exceeded.
    #[error("destination '{0}' is overloaded")]
    Overloaded(String),

    /// `408`/`429`: the destination asked the caller to slow down, with an
    /// optional `Retry-After` delay to honor before the next attempt.
    #[error("destination '{0}' requested a retry delay")]
    RateLimited(String, #[source] RateLimitedDetail),
}

/// Carries the parsed `Retry-After` delay without making it part of the
/// displayed error message.
#[derive(Debug, thiserror::Error)]
#[error("retry after {0:?}")]
pub struct RateLimitedDetail(pub Option<std::time::Duration>);

impl TransportError {
    /// Whether the Agent Runtime should retry an idempotent call that
    /// failed with this error.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Unreachable(..)
                | TransportError::Timeout(_)
                | TransportError::CircuitOpen(_)
                | TransportError::Overloaded(_)
                | TransportError::RateLimited(..)
        )
    }

    /// The delay the destination asked for via `Retry-After`, if this is a
    /// [`TransportError::RateLimited`].
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            TransportError::RateLimited(_, detail) => detail.0,
            _ => None,
        }
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
