//! Pure trick-resolution logic.
//!
//! Every function here computes an outcome from the play history
//! without touching timers, players, or any other mutable game state.
//! The state machine decides when to apply what these compute.

use serde::{Deserialize, Serialize};

use super::entities::{Card, Seat, Suit};

/// One play within the current trick: who played which card.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayRecord {
    #[serde(rename = "playerIndex")]
    pub seat: Seat,
    pub card: Card,
}

/// How the determination trick was decided.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DetermineReason {
    /// Someone played off-suit; the first cutter wins outright.
    FirstCut,
    /// All spades; the strongest one wins.
    HighestSpade,
    /// No winner could be identified. Falls back to the first play.
    Fallback,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DetermineOutcome {
    pub winner: Seat,
    pub reason: DetermineReason,
}

/// Evaluates the completed determination trick.
///
/// The first player to cut (play a non-spade) wins regardless of any
/// later, stronger spade. With no cuts, the highest spade wins.
#[must_use]
pub fn determination_outcome(history: &[PlayRecord]) -> Option<DetermineOutcome> {
    if let Some(cutter) = history.iter().find(|p| p.card.suit != Suit::Spade) {
        return Some(DetermineOutcome {
            winner: cutter.seat,
            reason: DetermineReason::FirstCut,
        });
    }

    let mut best: Option<&PlayRecord> = None;
    for play in history {
        if best.is_none_or(|b| play.card.value() > b.card.value()) {
            best = Some(play);
        }
    }
    if let Some(play) = best {
        return Some(DetermineOutcome {
            winner: play.seat,
            reason: DetermineReason::HighestSpade,
        });
    }

    // Degenerate: nothing identifiable. Not expected in normal play.
    history.first().map(|p| DetermineOutcome {
        winner: p.seat,
        reason: DetermineReason::Fallback,
    })
}

/// Finds the victim of a cut: whoever played the strongest card of the
/// led suit among the plays strictly before the cutting play.
///
/// `prior` must exclude the cutting play itself. Returns `None` only if
/// nobody in `prior` played the led suit, which cannot happen in normal
/// flow since the leader's card establishes the led suit.
#[must_use]
pub fn cut_victim(prior: &[PlayRecord], led_suit: Suit) -> Option<Seat> {
    let mut victim: Option<&PlayRecord> = None;
    for play in prior {
        if play.card.suit == led_suit
            && victim.is_none_or(|v| play.card.value() > v.card.value())
        {
            victim = Some(play);
        }
    }
    victim.map(|p| p.seat)
}

/// Winner of a full-follow trick: the highest raw strength across all
/// plays. Strength is suit-independent; a no-cut trick holds a single
/// suit by definition. The earliest play wins ties.
#[must_use]
pub fn trick_winner(history: &[PlayRecord]) -> Option<Seat> {
    let mut winner: Option<&PlayRecord> = None;
    for play in history {
        if winner.is_none_or(|w| play.card.value() > w.card.value()) {
            winner = Some(play);
        }
    }
    winner.map(|p| p.seat)
}

/// Number of plays that completes the current trick: every player still
/// holding cards, plus every player who emptied their hand during this
/// trick (they played, then went out, but their card still counts).
#[must_use]
pub fn expected_trick_size(hand_sizes: &[usize], history: &[PlayRecord]) -> usize {
    let holding = hand_sizes.iter().filter(|&&n| n > 0).count();
    let finished_this_trick = history
        .iter()
        .filter(|p| hand_sizes.get(p.seat).is_some_and(|&n| n == 0))
        .count();
    holding + finished_this_trick
}
