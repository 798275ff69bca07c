//! The replicated state store boundary.
//!
//! Online rooms share one store: the host overwrites the game state
//! document and drains the action queue; clients read the latest state
//! and append actions. [`StateStore`] abstracts the concrete transport;
//! [`MemoryStore`] is an in-process implementation used by tests, the
//! simulator, and any embedding that keeps host and clients in one
//! process.

use log::warn;
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::Mutex,
};
use thiserror::Error;

use super::messages::{Intent, Snapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed wire payload: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("replication store unavailable")]
    Unavailable,
}

/// A replicated key-value store with a state document and an action
/// queue. Only the host writes the state; any participant may submit
/// actions, which the host consumes strictly in submission order.
pub trait StateStore: Send + Sync {
    /// Overwrites the published game state.
    fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Appends an action to the shared queue.
    fn submit(&self, intent: &Intent) -> Result<(), StoreError>;

    /// Removes and returns all queued actions in submission order.
    /// Malformed entries are dropped with a diagnostic, never an error.
    fn drain_intents(&self) -> Result<Vec<Intent>, StoreError>;

    /// The most recently published state, if any.
    fn latest(&self) -> Result<Option<Snapshot>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    state: Option<Value>,
    actions: VecDeque<Value>,
}

/// In-process [`StateStore`]. Everything round-trips through
/// [`serde_json::Value`] so the replication boundary behaves like the
/// real document store, including its JSON quirks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    /// Collapse published arrays into integer-keyed maps, as document
    /// stores do to sparse lists. Lets tests exercise normalization.
    sparse_maps: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that delivers every published array as an integer-keyed
    /// map, the worst case the replication layer can produce.
    #[must_use]
    pub fn with_sparse_maps() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            sparse_maps: true,
        }
    }

    fn sparsify(value: Value) -> Value {
        match value {
            Value::Array(items) => Value::Object(
                items
                    .into_iter()
                    .map(Self::sparsify)
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect(),
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, item)| (key, Self::sparsify(item)))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl StateStore for MemoryStore {
    fn publish(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut value = serde_json::to_value(snapshot)?;
        if self.sparse_maps {
            value = Self::sparsify(value);
        }
        let Ok(mut inner) = self.inner.lock() else {
            return Err(StoreError::Unavailable);
        };
        inner.state = Some(value);
        Ok(())
    }

    fn submit(&self, intent: &Intent) -> Result<(), StoreError> {
        let value = serde_json::to_value(intent)?;
        let Ok(mut inner) = self.inner.lock() else {
            return Err(StoreError::Unavailable);
        };
        inner.actions.push_back(value);
        Ok(())
    }

    fn drain_intents(&self) -> Result<Vec<Intent>, StoreError> {
        let drained: Vec<Value> = {
            let Ok(mut inner) = self.inner.lock() else {
                return Err(StoreError::Unavailable);
            };
            inner.actions.drain(..).collect()
        };
        let mut intents = Vec::with_capacity(drained.len());
        for value in drained {
            match serde_json::from_value(value) {
                Ok(intent) => intents.push(intent),
                Err(err) => warn!("dropping malformed action from store: {err}"),
            }
        }
        Ok(intents)
    }

    fn latest(&self) -> Result<Option<Snapshot>, StoreError> {
        let value = {
            let Ok(inner) = self.inner.lock() else {
                return Err(StoreError::Unavailable);
            };
            inner.state.clone()
        };
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};
    use crate::net::messages::CardKey;

    #[test]
    fn test_intents_drain_in_submission_order() {
        let store = MemoryStore::new();
        store.submit(&Intent::StartGame).unwrap();
        store
            .submit(&Intent::Emoji {
                seat: 1,
                emoji: "🐔".to_string(),
            })
            .unwrap();

        let intents = store.drain_intents().unwrap();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0], Intent::StartGame);
        assert!(store.drain_intents().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_actions_are_dropped_not_fatal() {
        let store = MemoryStore::new();
        {
            let mut inner = store.inner.lock().unwrap();
            inner
                .actions
                .push_back(serde_json::json!({"type": "NO_SUCH_ACTION"}));
        }
        store
            .submit(&Intent::PlayCard {
                seat: 0,
                card: CardKey {
                    suit: Suit::Spade,
                    rank: Rank::Two,
                },
            })
            .unwrap();

        let intents = store.drain_intents().unwrap();
        assert_eq!(intents.len(), 1);
    }

    #[test]
    fn test_latest_is_none_before_first_publish() {
        let store = MemoryStore::new();
        assert!(store.latest().unwrap().is_none());
    }
}
