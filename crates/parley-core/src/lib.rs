//! Parley core library - shared domain types for the conversation stack.
//!
//! This crate provides:
//! - Message roles and typed content parts
//! - The chat payload shape exchanged with model APIs
//! - The LLM model catalog (vendor, version, context window)
//! - Session defaults

pub mod message;
pub mod model;

pub use message::{ChatPayload, ContentPart, MessageContent, Role};
pub use model::{LlmModel, ModelError, Vendor, DEFAULT_MODEL};

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// System message installed when a session starts, before the user picks one.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
