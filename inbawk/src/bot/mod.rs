//! Bot players.
//!
//! The strategy is a pure function over the bot's view of the game;
//! pacing (the randomized "thinking" delay) is generated separately so
//! the engine never sleeps on a bot's behalf.

pub mod decision;

pub use decision::{choose_card, think_delay};
