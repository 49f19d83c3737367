//! The bounded history buffer.
//!
//! An ordered, append-at-the-tail, evict-from-the-head sequence of
//! messages plus one distinguished system message, holding the running
//! token count under a capacity derived from the model's context window.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parley_core::{ChatPayload, MessageContent, Role, DEFAULT_SYSTEM_MESSAGE};
use tracing::debug;

use crate::entry::MessageEntry;
use crate::error::{ContextError, ContextResult};
use crate::estimator::TokenEstimator;

/// Conversation history bounded by a token budget.
///
/// `limit` is the capacity left for ordinary history: the external token
/// limit minus whatever the system message currently costs. Appending a
/// message that pushes `token_count` over `limit` evicts the oldest
/// entries until the count fits again (strict FIFO).
///
/// Replacing the system message never evicts, even when the new one is
/// costly enough to push `token_count` over the shrunken `limit`; the
/// overflow is resolved on the next [`add_message`](Self::add_message).
/// That is why `limit` is signed - it can legitimately go negative until
/// then.
///
/// No internal locking: a buffer belongs to exactly one conversation
/// session, and callers must not run two mutations concurrently.
#[derive(Clone)]
pub struct BoundedHistory {
    limit: i64,
    token_count: i64,
    history: VecDeque<MessageEntry>,
    system_message: MessageEntry,
    model: String,
    estimator: Arc<dyn TokenEstimator>,
}

impl BoundedHistory {
    /// Create a buffer for one session. `limit` is the model's total
    /// context window; the default system message is installed and its
    /// cost deducted immediately.
    pub fn new(
        limit: i64,
        model: impl Into<String>,
        estimator: Arc<dyn TokenEstimator>,
    ) -> ContextResult<Self> {
        let model = model.into();
        let content = MessageContent::from(DEFAULT_SYSTEM_MESSAGE);
        let tokens = estimator.estimate(Role::System, &content, &model)?;
        Ok(Self {
            limit: limit - tokens as i64,
            token_count: 0,
            history: VecDeque::new(),
            system_message: MessageEntry::new(ChatPayload::new(Role::System, content), tokens),
            model,
            estimator,
        })
    }

    /// Replace the system message.
    ///
    /// Rejects blank text and leaves everything untouched in that case.
    /// Otherwise the old entry's cost is credited back to the capacity,
    /// a fresh entry is installed (the old one is never mutated), and
    /// the new cost debited. History is NOT evicted here even if the new
    /// message shrinks capacity below the running count - that is
    /// deferred to the next `add_message`.
    pub fn set_system_message(&mut self, text: &str) -> ContextResult<()> {
        if text.trim().is_empty() {
            return Err(ContextError::EmptySystemMessage);
        }
        let content = MessageContent::from(text);
        let tokens = self.estimator.estimate(Role::System, &content, &self.model)?;
        self.limit += self.system_message.tokens() as i64;
        self.system_message = MessageEntry::new(ChatPayload::new(Role::System, content), tokens);
        self.limit -= tokens as i64;
        Ok(())
    }

    /// Append a user or assistant message, then evict oldest-first until
    /// the running count fits the capacity again.
    ///
    /// Eviction is unconditional: a single message costing more than the
    /// whole capacity drains the buffer, itself included. Evicted
    /// entries are returned for auditing and not otherwise retained.
    pub fn add_message(
        &mut self,
        content: impl Into<MessageContent>,
        role: Role,
    ) -> ContextResult<Vec<MessageEntry>> {
        if role == Role::System {
            return Err(ContextError::InvalidRole(role));
        }
        let content = content.into();
        let tokens = self.estimator.estimate(role, &content, &self.model)?;
        self.history
            .push_back(MessageEntry::new(ChatPayload::new(role, content), tokens));
        self.token_count += tokens as i64;
        Ok(self.evict_down_to(self.limit))
    }

    /// Drop every history entry, then re-derive capacity from the
    /// current system message text. The system message itself survives.
    pub fn clear_history(&mut self) -> ContextResult<Vec<MessageEntry>> {
        let evicted = self.evict_down_to(0);
        let text = self
            .system_message
            .payload()
            .content
            .as_text()
            .unwrap_or(DEFAULT_SYSTEM_MESSAGE)
            .to_string();
        self.set_system_message(&text)?;
        Ok(evicted)
    }

    /// The full ordered payload set: system message first, then history
    /// oldest-to-newest. Pure - never evicts; callers must have already
    /// settled the budget via `add_message`.
    pub fn serialize(&self) -> Vec<ChatPayload> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(self.system_message.payload().clone());
        messages.extend(self.history.iter().map(|entry| entry.payload().clone()));
        messages
    }

    /// An independent copy for branching or backup: structurally equal,
    /// no shared mutable state. The estimator is the one read-only
    /// resource the copy may share.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Capacity left for ordinary history. Negative only between a
    /// capacity-shrinking `set_system_message` and the next
    /// `add_message`.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Sum of token costs over all retained history entries.
    pub fn token_count(&self) -> i64 {
        self.token_count
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn system_message(&self) -> &ChatPayload {
        self.system_message.payload()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn evict_down_to(&mut self, limit: i64) -> Vec<MessageEntry> {
        let mut evicted = Vec::new();
        while self.token_count > limit {
            let Some(entry) = self.history.pop_front() else {
                break;
            };
            self.token_count -= entry.tokens() as i64;
            debug!(
                role = %entry.payload().role,
                tokens = entry.tokens(),
                remaining = self.token_count,
                "evicted oldest history entry"
            );
            evicted.push(entry);
        }
        evicted
    }
}

impl fmt::Debug for BoundedHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedHistory")
            .field("limit", &self.limit)
            .field("token_count", &self.token_count)
            .field("entries", &self.history.len())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
