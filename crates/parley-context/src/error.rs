//! Error types for context management

use parley_core::Role;
use thiserror::Error;

/// Context management error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("system message cannot be empty")]
    EmptySystemMessage,

    #[error("token accounting is not implemented for model {0}")]
    UnsupportedModel(String),

    #[error("role {0} cannot be appended to the history")]
    InvalidRole(Role),
}

/// Result type for context operations
pub type ContextResult<T> = Result<T, ContextError>;
