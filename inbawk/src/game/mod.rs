//! Core game logic: entities, trick resolution, and the phase state
//! machine.

pub mod constants;
pub mod entities;
pub mod round;
pub mod state_machine;

pub use state_machine::{
    DeferredAction, Game, GameConfig, GameError, Phase, PlayerSpec, Scheduled,
};
