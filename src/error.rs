//! Engine-level error taxonomy

use thiserror::Error;

/// Failures surfaced by engine operations. Each variant is a distinct
/// signal, so a caller can decide whether to retry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Admission control rejected the request; no state was mutated and
    /// the caller may retry later.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The request was structurally invalid; rejected before any stage ran.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A durable read or write failed; surfaced immediately, never retried.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
