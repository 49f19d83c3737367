//! Error types for vendor clients

use parley_context::ContextError;
use thiserror::Error;

/// Vendor client error type
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("api returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode api response: {0}")]
    Decode(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("unsupported attachment type: {0}")]
    UnsupportedAttachment(String),

    #[error("failed to download attachment: status {0}")]
    AttachmentFetch(u16),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
