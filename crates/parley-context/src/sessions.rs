//! Per-session buffer storage.
//!
//! One conversation session (a chat, a thread) owns exactly one buffer,
//! created lazily on first interaction and torn down with the session.
//! Each buffer sits behind its own async mutex so at most one mutation
//! per session is in flight at a time, which is the access discipline
//! the buffer itself requires.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::ContextResult;
use crate::estimator::TokenEstimator;
use crate::window::BoundedHistory;

/// Session-keyed store of history buffers.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<BoundedHistory>>>>,
    limit: i64,
    model: String,
    estimator: Arc<dyn TokenEstimator>,
}

impl SessionStore {
    /// `limit` and `model` seed every buffer this store creates.
    pub fn new(limit: i64, model: impl Into<String>, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            limit,
            model: model.into(),
            estimator,
        }
    }

    /// Fetch the session's buffer, creating it on first interaction.
    pub async fn get_or_create(&self, key: &str) -> ContextResult<Arc<Mutex<BoundedHistory>>> {
        if let Some(existing) = self.sessions.read().await.get(key) {
            return Ok(Arc::clone(existing));
        }

        let mut sessions = self.sessions.write().await;
        // A racing creator may have won between the two locks.
        if let Some(existing) = sessions.get(key) {
            return Ok(Arc::clone(existing));
        }
        let window = BoundedHistory::new(self.limit, self.model.clone(), Arc::clone(&self.estimator))?;
        let handle = Arc::new(Mutex::new(window));
        sessions.insert(key.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Tear a session down. Returns false if it never existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.sessions.write().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
