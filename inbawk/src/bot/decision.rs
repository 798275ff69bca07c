//! Bot decision-making logic.
//!
//! Strategy summary:
//! - Determination: strongest spade held, else the strongest card
//!   overall (last in sorted hand order).
//! - Leading a trick: pick the suit that has been cut against this bot
//!   the fewest times, break ties toward the suit with the strongest
//!   held card, then play that suit's strongest card.
//! - Following: strongest card of the led suit when held; otherwise a
//!   forced cut with the strongest card overall.
//!
//! The strategy always plays to take the trick when able; it never
//! ducks with a minimal card.

use rand::Rng;
use std::time::Duration;

use crate::game::constants;
use crate::game::entities::{Card, CutCounts, Suit};
use crate::game::state_machine::Phase;

/// Chooses the hand index to play, given the bot's view of the game.
/// Assumes `hand` is sorted by suit order then ascending strength, so
/// the last card of any suit group is that suit's strongest.
///
/// Returns `None` only for an empty hand.
#[must_use]
pub fn choose_card(
    hand: &[Card],
    phase: Phase,
    led_suit: Option<Suit>,
    leading: bool,
    cuts_received: &CutCounts,
) -> Option<usize> {
    if hand.is_empty() {
        return None;
    }

    if phase == Phase::Determine {
        return hand
            .iter()
            .rposition(|c| c.suit == Suit::Spade)
            .or(Some(hand.len() - 1));
    }

    if !leading {
        if let Some(led) = led_suit {
            return hand
                .iter()
                .rposition(|c| c.suit == led)
                .or(Some(hand.len() - 1));
        }
    }

    // Leading: rank candidate suits by safety, then by strength.
    let best_suit = Suit::ALL
        .into_iter()
        .filter(|&suit| hand.iter().any(|c| c.suit == suit))
        .min_by_key(|&suit| {
            let strongest = hand
                .iter()
                .filter(|c| c.suit == suit)
                .map(Card::value)
                .max()
                .unwrap_or(0);
            (cuts_received.get(suit), std::cmp::Reverse(strongest))
        })?;
    hand.iter().rposition(|c| c.suit == best_suit)
}

/// Randomized "thinking" delay preceding every bot action. Pure pacing;
/// correctness never depends on it.
#[must_use]
pub fn think_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    constants::BOT_THINK_BASE
        + Duration::from_millis(rng.random_range(0..=constants::BOT_THINK_VARIANCE_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Rank;
    use rand::{SeedableRng, rngs::StdRng};

    fn sorted_hand(cards: Vec<Card>) -> Vec<Card> {
        let mut cards = cards;
        cards.sort_by_key(|c| (c.suit.sort_index(), c.value()));
        cards
    }

    #[test]
    fn test_determine_plays_strongest_spade() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Spade, Rank::Three),
            Card::new(Suit::Spade, Rank::Queen),
            Card::new(Suit::Heart, Rank::Ace),
        ]);
        let idx = choose_card(
            &hand,
            Phase::Determine,
            Some(Suit::Spade),
            false,
            &CutCounts::default(),
        );
        assert_eq!(hand[idx.unwrap()], Card::new(Suit::Spade, Rank::Queen));
    }

    #[test]
    fn test_determine_without_spades_plays_last_card() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Heart, Rank::Four),
            Card::new(Suit::Club, Rank::Nine),
        ]);
        let idx = choose_card(
            &hand,
            Phase::Determine,
            Some(Suit::Spade),
            false,
            &CutCounts::default(),
        );
        assert_eq!(idx, Some(hand.len() - 1));
    }

    #[test]
    fn test_leading_prefers_uncut_suit() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Heart, Rank::Ace),
            Card::new(Suit::Club, Rank::Five),
        ]);
        // Hearts were cut against this bot twice; clubs never.
        let mut cuts = CutCounts::default();
        cuts.bump(Suit::Heart);
        cuts.bump(Suit::Heart);

        let idx = choose_card(&hand, Phase::Game, None, true, &cuts);
        assert_eq!(hand[idx.unwrap()].suit, Suit::Club);
    }

    #[test]
    fn test_leading_ties_broken_by_strongest_card() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Heart, Rank::Ace),
            Card::new(Suit::Heart, Rank::Two),
            Card::new(Suit::Club, Rank::Ten),
        ]);
        let idx = choose_card(&hand, Phase::Game, None, true, &CutCounts::default());
        assert_eq!(hand[idx.unwrap()], Card::new(Suit::Heart, Rank::Ace));
    }

    #[test]
    fn test_following_plays_strongest_of_led_suit() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Heart, Rank::Three),
            Card::new(Suit::Heart, Rank::Jack),
            Card::new(Suit::Club, Rank::Ace),
        ]);
        let idx = choose_card(&hand, Phase::Game, Some(Suit::Heart), false, &CutCounts::default());
        assert_eq!(hand[idx.unwrap()], Card::new(Suit::Heart, Rank::Jack));
    }

    #[test]
    fn test_forced_cut_plays_last_card() {
        let hand = sorted_hand(vec![
            Card::new(Suit::Diamond, Rank::Two),
            Card::new(Suit::Club, Rank::King),
        ]);
        let idx = choose_card(&hand, Phase::Game, Some(Suit::Heart), false, &CutCounts::default());
        assert_eq!(idx, Some(hand.len() - 1));
    }

    #[test]
    fn test_empty_hand_has_no_choice() {
        assert_eq!(
            choose_card(&[], Phase::Game, None, true, &CutCounts::default()),
            None
        );
    }

    #[test]
    fn test_think_delay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let delay = think_delay(&mut rng);
            assert!(delay >= constants::BOT_THINK_BASE);
            assert!(
                delay
                    <= constants::BOT_THINK_BASE
                        + Duration::from_millis(constants::BOT_THINK_VARIANCE_MS)
            );
        }
    }
}
