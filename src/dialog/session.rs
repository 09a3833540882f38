//! Per-conversation session storage.
//!
//! Each chat gets at most one session, holding the dialogue state and the draft. The store is
//! owned by the engine and injected into nothing else; there is no module-level mutable state.
//! A session that sits idle past the configured timeout is discarded exactly as if the user
//! had cancelled.

use crate::dialog::state::DialogState;
use crate::model::TransactionDraft;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// One active conversation: the state machine position, the draft being filled in, and an id
/// used to correlate log lines.
#[derive(Debug)]
pub(super) struct Session {
    pub(super) id: Uuid,
    pub(super) state: DialogState,
    pub(super) draft: TransactionDraft,
    last_seen: Instant,
}

impl Session {
    pub(super) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: DialogState::SelectType,
            draft: TransactionDraft::default(),
            last_seen: Instant::now(),
        }
    }

    pub(super) fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

/// The in-memory session map, keyed by chat id. One draft per chat, mutated only by that
/// chat's own in-flight transition.
#[derive(Debug, Default)]
pub(super) struct SessionStore {
    sessions: HashMap<i64, Session>,
}

impl SessionStore {
    /// Inserts a fresh session for `chat_id`, discarding any prior one.
    pub(super) fn put(&mut self, chat_id: i64, session: Session) {
        self.sessions.insert(chat_id, session);
    }

    /// Removes and returns the session so the engine can mutate it without holding a borrow on
    /// the store. Continue the conversation by calling [`SessionStore::put`] again.
    pub(super) fn take(&mut self, chat_id: i64) -> Option<Session> {
        self.sessions.remove(&chat_id)
    }

    pub(super) fn remove(&mut self, chat_id: i64) -> Option<Session> {
        self.sessions.remove(&chat_id)
    }

    pub(super) fn is_active(&self, chat_id: i64) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    #[cfg(test)]
    pub(super) fn state_of(&self, chat_id: i64) -> Option<DialogState> {
        self.sessions.get(&chat_id).map(|session| session.state)
    }

    /// Discards every session that has been idle for `max_idle` or longer. Returns the number
    /// of conversations evicted.
    pub(super) fn evict_idle(&mut self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|chat_id, session| {
            let keep = session.idle_for() < max_idle;
            if !keep {
                debug!(
                    conversation = %session.id,
                    chat_id, "evicting idle conversation"
                );
            }
            keep
        });
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_take() {
        let mut store = SessionStore::default();
        store.put(1, Session::new());
        assert!(store.is_active(1));
        assert!(!store.is_active(2));

        let session = store.take(1).unwrap();
        assert_eq!(session.state, DialogState::SelectType);
        assert!(!store.is_active(1));
    }

    #[test]
    fn test_put_replaces_prior_session() {
        let mut store = SessionStore::default();
        store.put(1, Session::new());
        let first_id = store.sessions.get(&1).unwrap().id;
        store.put(1, Session::new());
        assert_ne!(store.sessions.get(&1).unwrap().id, first_id);
        assert_eq!(store.sessions.len(), 1);
    }

    #[test]
    fn test_evict_idle() {
        let mut store = SessionStore::default();
        store.put(1, Session::new());
        store.put(2, Session::new());

        // A generous timeout keeps fresh sessions alive.
        assert_eq!(store.evict_idle(Duration::from_secs(900)), 0);
        assert!(store.is_active(1));

        // A zero timeout evicts everything.
        assert_eq!(store.evict_idle(Duration::ZERO), 2);
        assert!(!store.is_active(1));
        assert!(!store.is_active(2));
    }
}
