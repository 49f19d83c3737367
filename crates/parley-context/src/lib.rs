//! Parley Context Management - token-bounded conversation history
//!
//! This crate provides:
//! - Token estimation with per-model accounting rules
//! - A bounded history buffer with oldest-first eviction
//! - Per-session buffer storage with serialized access

pub mod entry;
pub mod error;
pub mod estimator;
pub mod sessions;
pub mod window;

pub use entry::MessageEntry;
pub use error::{ContextError, ContextResult};
pub use estimator::{ImageCostModel, TiktokenEstimator, TokenEstimator};
pub use sessions::SessionStore;
pub use window::BoundedHistory;

/// Prelude for common imports
pub mod prelude {
    pub use crate::entry::MessageEntry;
    pub use crate::error::{ContextError, ContextResult};
    pub use crate::estimator::{ImageCostModel, TiktokenEstimator, TokenEstimator};
    pub use crate::sessions::SessionStore;
    pub use crate::window::BoundedHistory;
}
