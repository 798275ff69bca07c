//! # INBAWK
//!
//! The rules engine for INBAWK, a Crazy-Eights/Whist-like trick card
//! game, with solo-vs-bots and host-authoritative online room play.
//!
//! The engine is a single-writer state machine: in any room exactly one
//! instance (the host, or the sole local instance) mutates state.
//! Clients mirror published snapshots and submit intents through a
//! shared action queue.
//!
//! ## Architecture
//!
//! A game moves through five phases:
//!
//! - **LOBBY**: waiting for a start intent
//! - **SHUFFLING**: deck built and shuffled
//! - **DEALING**: cards dealt round-robin
//! - **DETERMINE**: one spade-led trick decides who starts
//! - **GAME**: tricks are played until one player is left holding
//!   cards -- that player loses
//!
//! Logical resolution is separated from presentation pacing: the state
//! machine computes outcomes instantly and returns [`game::Scheduled`]
//! effects; a session loop decides when to apply and reveal them.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, trick resolution, and the phase state machine
//! - [`bot`]: bot card selection and pacing
//! - [`net`]: wire messages, the replicated store boundary, and the
//!   host/client sessions
//!
//! ## Example
//!
//! ```
//! use inbawk::{Game, GameConfig, HostSession, Intent};
//!
//! let mut game = Game::new(GameConfig::default()).unwrap();
//! game.reseed(1);
//! let mut session = HostSession::new(game);
//! session.dispatch(Intent::StartGame).unwrap();
//! session.fast_forward().unwrap();
//! ```

pub mod game;
pub use game::{
    Game, GameConfig, GameError, Phase,
    constants::{self, DEFAULT_PLAYERS, MAX_PLAYERS, MIN_PLAYERS},
    entities, round,
};

pub mod bot;

pub mod net;
pub use net::{ClientSession, HostSession, Intent, MemoryStore, Snapshot, StateStore, messages};
