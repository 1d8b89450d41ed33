//! Error taxonomy for the portal core.
//!
//! Structural errors (missing records, malformed AI batches) abort the
//! single operation that hit them; everything AI-dependent is caught at
//! the call site and degrades to "no suggestion". Duplicate-edge creation
//! is deliberately *not* an error — the store treats it as a no-op and
//! [`LinkOutcome::Ignored`](crate::relations::LinkOutcome::Ignored)
//! reports it to the caller.

use thiserror::Error;

/// Errors surfaced by the relationship/context/analyzer engine.
///
/// Constructed at failure sites and propagated through `anyhow`, so
/// callers can `downcast_ref::<PortalError>()` when they need to branch
/// on the taxonomy.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Source or target record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input or an unparseable AI batch; the whole batch
    /// associated with the parse is discarded, never partially trusted.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The generative-text capability is unreachable or unauthorized.
    /// Callers catch this and proceed without suggestions.
    #[error("external service unavailable: {0}")]
    ExternalServiceUnavailable(String),
}
