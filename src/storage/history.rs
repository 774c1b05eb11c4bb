use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::common::Message;
use crate::error::StoreError;

/// The single authoritative chat history.
///
/// All access goes through one mutex. Both operations hold it for the whole
/// read-modify-copy step and hand back an owned snapshot, so callers never see
/// the internal buffer.
pub struct HistoryStore {
    messages: Mutex<Vec<Message>>,
    max_history: Option<usize>,
}

impl HistoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Store that keeps at most `max_history` messages, dropping the oldest.
    /// `None` and `Some(0)` both mean unbounded.
    pub fn with_limit(max_history: Option<usize>) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            max_history: max_history.filter(|limit| *limit > 0),
        }
    }

    /// Append `message` and return the history as it stands afterwards.
    pub fn append(&self, message: Message) -> Result<Vec<Message>, StoreError> {
        let snapshot = {
            let mut messages = self.lock();
            if message.text.is_empty() {
                return Err(StoreError::EmptyMessage);
            }
            messages.push(message);
            if let Some(limit) = self.max_history {
                let excess = messages.len().saturating_sub(limit);
                if excess > 0 {
                    messages.drain(..excess);
                }
            }
            messages.clone()
        };

        if let Some(latest) = snapshot.last() {
            log::info!("New message from {}: {}", latest.author, latest.text);
        }
        Ok(snapshot)
    }

    pub fn fetch(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured cap, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.max_history
    }

    // A panic while holding the guard cannot leave a half-applied push, so the
    // data behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
