//! The client-side mirror.
//!
//! A [`ClientSession`] never mutates game state. It submits intents to
//! the shared store and re-renders from whatever snapshot the host
//! last published. Snapshots are full replacements, so applying the
//! same one twice cannot drift.

use std::sync::Arc;

use crate::game::entities::Seat;
use crate::net::messages::{CardKey, Intent, Snapshot};
use crate::net::store::{StateStore, StoreError};

pub struct ClientSession {
    seat: Seat,
    store: Arc<dyn StateStore>,
    latest: Option<Snapshot>,
}

impl ClientSession {
    #[must_use]
    pub fn new(seat: Seat, store: Arc<dyn StateStore>) -> Self {
        Self {
            seat,
            store,
            latest: None,
        }
    }

    #[must_use]
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Pulls the latest published snapshot. Returns the mirrored state
    /// (if the host has published anything yet).
    pub fn refresh(&mut self) -> Result<Option<&Snapshot>, StoreError> {
        self.latest = self.store.latest()?;
        Ok(self.latest.as_ref())
    }

    /// The last snapshot seen by [`ClientSession::refresh`].
    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn start_game(&self) -> Result<(), StoreError> {
        self.store.submit(&Intent::StartGame)
    }

    /// Submits a play for this client's seat. The host validates turn
    /// order and hand membership; an illegal play simply has no effect.
    pub fn play_card(&self, card: CardKey) -> Result<(), StoreError> {
        self.store.submit(&Intent::PlayCard {
            seat: self.seat,
            card,
        })
    }

    pub fn send_emoji(&self, emoji: &str) -> Result<(), StoreError> {
        self.store.submit(&Intent::Emoji {
            seat: self.seat,
            emoji: emoji.to_string(),
        })
    }
}
