use thiserror::Error;

use logiflow_core::DomainError;

use crate::ports::StoreError;

/// Failure of an agent call that is not a business outcome.
///
/// A rejected order or a stock shortfall is reported through the agent's
/// outcome type; `AgentError` is reserved for things the caller cannot act on
/// as a decision (storage failures, broken invariants).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("invalid agent input: {0}")]
    InvalidInput(String),
}
