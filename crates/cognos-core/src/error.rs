//! Error taxonomy for the substrate.
//!
//! The kinds below mirror the behavioural contract, not exception hierarchies from any
//! particular host language: callers branch on the kind, never on a message string.
//! Collaborator (LLM/embedding/persistence) errors are always folded into `Transient`
//! and recorded in a trace rather than propagated — see each collaborator call site.

use thiserror::Error;

/// Error taxonomy returned by fallible substrate operations.
#[derive(Error, Debug, Clone)]
pub enum SubstrateError {
    /// Caller-supplied payload does not meet the shape required for the target mode.
    #[error("validation failed: {message}")]
    ValidationFailure {
        message: String,
        field: Option<String>,
    },

    /// Fail-closed authorization denial. Always carries a stable reason tag.
    #[error("authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    /// Actor exceeded its rate budget window.
    #[error("budget exceeded, resets in {reset_in_ms}ms")]
    BudgetExceeded { reset_in_ms: u64 },

    /// A system invariant would be violated by this operation.
    #[error("invariant violation: {invariant}")]
    InvariantViolation { invariant: String },

    /// Optimistic-concurrency (CAS) failure: expected status did not match current.
    #[error("optimistic concurrency failure: expected {expected}, found {actual}")]
    OptimisticConcurrency { expected: String, actual: String },

    /// Retry-safe error surfaced by an external collaborator (LLM, embeddings, persistence).
    #[error("transient collaborator error: {message}")]
    Transient { message: String },

    /// Internal logic error. Never raised for caller-supplied bad input.
    #[error("fatal internal error: {message}")]
    Fatal { message: String },
}

impl SubstrateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationFailure {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    pub fn invariant(invariant: impl Into<String>) -> Self {
        Self::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Stable machine-readable tag for this error kind, used in API responses and tests.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::ValidationFailure { .. } => "validation_failure",
            Self::AuthorizationDenied { .. } => "authorization_denied",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::InvariantViolation { .. } => "invariant_violation",
            Self::OptimisticConcurrency { .. } => "optimistic_concurrency",
            Self::Transient { .. } => "transient",
            Self::Fatal { .. } => "fatal",
        }
    }
}

pub type SubstrateResult<T> = Result<T, SubstrateError>;
