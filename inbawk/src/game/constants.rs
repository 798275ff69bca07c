//! Game-wide constants.
//!
//! The `Duration` constants are presentation pacing defaults. They feed
//! the deferred actions returned by the state machine and never affect
//! which outcome is computed.

use std::time::Duration;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const DEFAULT_PLAYERS: usize = 4;
pub const DECK_SIZE: usize = 52;

/// Number of distinct bot avatars (char1..char11).
pub const CHARACTER_COUNT: usize = 11;
pub const DEFAULT_CHARACTER: &str = "char1";
pub const MAX_NAME_LENGTH: usize = 24;

/// Shuffle animation window before dealing begins.
pub const SHUFFLE_DELAY: Duration = Duration::from_millis(1500);
/// Dealing animation and settle window before the determination trick.
pub const DEAL_SETTLE_DELAY: Duration = Duration::from_millis(5000);
/// Reveal window after the determination trick completes.
pub const DETERMINE_SETTLE_DELAY: Duration = Duration::from_millis(1500);
/// Cut reveal plus pickup window before the victim receives the stack.
pub const CUT_SETTLE_DELAY: Duration = Duration::from_millis(4000);
/// Reveal window after a full-follow trick before the table clears.
pub const TRICK_SETTLE_DELAY: Duration = Duration::from_millis(3500);

/// Base bot "thinking" delay; a random variance is added on top.
pub const BOT_THINK_BASE: Duration = Duration::from_millis(500);
pub const BOT_THINK_VARIANCE_MS: u64 = 500;

pub const NOTIFICATION_CLEAR_DELAY: Duration = Duration::from_millis(2000);
pub const EMOJI_CLEAR_DELAY: Duration = Duration::from_millis(3000);
