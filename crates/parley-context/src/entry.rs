//! History entries: a payload plus its token cost.

use chrono::{DateTime, Utc};
use parley_core::ChatPayload;
use serde::{Deserialize, Serialize};

/// A stored message and the number of tokens it costs.
///
/// The cost is computed once when the entry is created and never changes;
/// replacing content means creating a new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    payload: ChatPayload,
    tokens: usize,
    created_at: DateTime<Utc>,
}

impl MessageEntry {
    pub fn new(payload: ChatPayload, tokens: usize) -> Self {
        Self {
            payload,
            tokens,
            created_at: Utc::now(),
        }
    }

    pub fn payload(&self) -> &ChatPayload {
        &self.payload
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
