//! The host-side session loop.
//!
//! Exactly one [`HostSession`] exists per game; it is the single
//! writer. It owns the [`Game`], a due-time queue for the deferred
//! actions the engine schedules, and (in online mode) the shared
//! store. Intents are processed strictly in submission order, and a
//! complete snapshot is republished after every mutation step, so
//! clients never observe a partially-updated state.

use log::debug;
use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    sync::Arc,
    time::Instant,
};

use crate::game::state_machine::{DeferredAction, Game, Scheduled};
use crate::net::messages::{Intent, Snapshot};
use crate::net::store::{StateStore, StoreError};

#[derive(Debug)]
struct TimerEntry {
    due: Instant,
    /// Tie-breaker preserving scheduling order for equal due times.
    seq: u64,
    action: DeferredAction,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Drives the authoritative [`Game`]: drains intents, fires due
/// timers, republishes snapshots.
pub struct HostSession {
    game: Game,
    store: Option<Arc<dyn StateStore>>,
    timers: BinaryHeap<Reverse<TimerEntry>>,
    next_seq: u64,
    now: Instant,
}

impl HostSession {
    /// A session without a store: local solo/bot mode. The embedding
    /// UI reads state through [`HostSession::snapshot`].
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            store: None,
            timers: BinaryHeap::new(),
            next_seq: 0,
            now: Instant::now(),
        }
    }

    /// A session backed by a shared store: online host mode. Publishes
    /// the initial state immediately so joining clients can render.
    pub fn with_store(game: Game, store: Arc<dyn StateStore>) -> Result<Self, StoreError> {
        let mut session = Self::new(game);
        session.store = Some(store);
        session.publish()?;
        Ok(session)
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    /// Processes an intent from the local player (the host's own UI
    /// bypasses the store queue).
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), StoreError> {
        let effects = self.game.dispatch(intent);
        self.schedule(effects);
        self.publish()
    }

    /// One scheduling pass at wall-clock time: drains queued intents,
    /// fires every timer that has come due, and returns the next due
    /// instant so the caller knows how long it may sleep.
    pub fn pump(&mut self) -> Result<Option<Instant>, StoreError> {
        self.now = Instant::now();

        for intent in self.drain_store()? {
            let effects = self.game.dispatch(intent);
            self.schedule(effects);
            self.publish()?;
        }

        while let Some(Reverse(entry)) = self.timers.peek() {
            if entry.due > self.now {
                break;
            }
            let Some(Reverse(entry)) = self.timers.pop() else {
                break;
            };
            let effects = self.game.apply(entry.action);
            self.schedule(effects);
            self.publish()?;
        }

        Ok(self.timers.peek().map(|Reverse(entry)| entry.due))
    }

    /// Runs the session to quiescence on a virtual clock: every timer
    /// fires the moment it is due, in due order, with no sleeping.
    /// Stops when no timers remain and the intent queue is empty --
    /// either the game ended or it is waiting on a human.
    pub fn fast_forward(&mut self) -> Result<(), StoreError> {
        loop {
            let mut progressed = false;
            for intent in self.drain_store()? {
                let effects = self.game.dispatch(intent);
                self.schedule(effects);
                self.publish()?;
                progressed = true;
            }
            if let Some(Reverse(entry)) = self.timers.pop() {
                // Advance the virtual clock so follow-up effects keep
                // their relative ordering.
                self.now = self.now.max(entry.due);
                let effects = self.game.apply(entry.action);
                self.schedule(effects);
                self.publish()?;
                progressed = true;
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    fn drain_store(&self) -> Result<Vec<Intent>, StoreError> {
        match &self.store {
            Some(store) => store.drain_intents(),
            None => Ok(Vec::new()),
        }
    }

    fn schedule(&mut self, effects: Vec<Scheduled>) {
        for effect in effects {
            debug!("scheduling {:?} in {:?}", effect.action, effect.after);
            self.timers.push(Reverse(TimerEntry {
                due: self.now + effect.after,
                seq: self.next_seq,
                action: effect.action,
            }));
            self.next_seq += 1;
        }
    }

    fn publish(&self) -> Result<(), StoreError> {
        if let Some(store) = &self.store {
            store.publish(&self.game.snapshot())?;
        }
        Ok(())
    }
}
