//! Domain error model.

use core::fmt::Display;

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failure raised by order, product or shipment rules.
///
/// Storage and transport failures never show up here; stores and the HTTP
/// layer wrap this type in their own errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input the business refuses outright (empty address, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request is well-formed but the entity's state forbids it.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The command targeted an order that was never placed.
    #[error("not found")]
    NotFound,

    /// Duplicate creation or a stale version on save.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// A state machine refused `from -> to`.
    pub fn illegal_transition(machine: &str, from: impl Display, to: impl Display) -> Self {
        Self::InvariantViolation(format!("illegal {machine} transition {from} -> {to}"))
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_names_both_states() {
        let err = DomainError::illegal_transition("shipment", "SCHEDULED", "IN_TRANSIT");
        assert_eq!(
            err.to_string(),
            "invariant violated: illegal shipment transition SCHEDULED -> IN_TRANSIT"
        );
    }
}
