use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    #[serde(rename = "s")]
    Spade,
    #[serde(rename = "h")]
    Heart,
    #[serde(rename = "d")]
    Diamond,
    #[serde(rename = "c")]
    Club,
}

impl Suit {
    /// All suits in hand-sort order (spades first).
    pub const ALL: [Self; 4] = [Self::Spade, Self::Heart, Self::Diamond, Self::Club];

    /// Position within [`Suit::ALL`], used for hand sorting and
    /// per-suit counters.
    #[must_use]
    pub fn sort_index(self) -> usize {
        match self {
            Self::Spade => 0,
            Self::Heart => 1,
            Self::Diamond => 2,
            Self::Club => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Card strength value (2..=14, ace high).
pub type Value = u8;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

impl Rank {
    /// All ranks in ascending strength order.
    pub const ALL: [Self; 13] = [
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
        Self::Ace,
    ];

    /// Strength value of this rank (2..=14, ace high).
    #[must_use]
    pub fn value(self) -> Value {
        self as Value + 2
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Jack => write!(f, "J"),
            Self::Queen => write!(f, "Q"),
            Self::King => write!(f, "K"),
            Self::Ace => write!(f, "A"),
            other => write!(f, "{}", other.value()),
        }
    }
}

/// Opaque card identity. Carries no game semantics; it only exists so
/// UIs can reconcile card widgets across snapshots.
pub type CardId = Uuid;

/// A playing card. Immutable once created.
///
/// Equality and hashing consider only (suit, rank); the identity id is
/// excluded so a card survives a wire round trip even when the id is
/// regenerated.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
    #[serde(default = "Uuid::new_v4")]
    pub id: CardId,
}

impl Card {
    #[must_use]
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self {
            suit,
            rank,
            id: Uuid::new_v4(),
        }
    }

    /// Strength value of this card (2..=14, ace high).
    #[must_use]
    pub fn value(&self) -> Value {
        self.rank.value()
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }
}

impl Eq for Card {}

impl std::hash::Hash for Card {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.rank.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// A full 52-card deck.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds all 52 (suit, rank) combinations exactly once.
    #[must_use]
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::new(suit, rank));
            }
        }
        Self { cards }
    }

    /// Fisher-Yates shuffle over an injected randomness source.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }

    /// Deals the whole deck round-robin starting at seat 0 until the
    /// deck is exhausted. When the player count does not divide 52, the
    /// first `52 % n` seats receive one extra card.
    pub fn deal(self, players: &mut [Player]) {
        let n = players.len();
        for (i, card) in self.cards.into_iter().enumerate() {
            players[i % n].receive_card(card);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

/// Type alias for seat positions at the table.
pub type Seat = usize;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let name: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_NAME_LENGTH)
            .collect();
        Self(name)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Per-suit counters tracking how often a suit led by this player has
/// been cut. Bot heuristic only; never reset except at game start.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CutCounts {
    #[serde(default, rename = "s")]
    pub spades: u32,
    #[serde(default, rename = "h")]
    pub hearts: u32,
    #[serde(default, rename = "d")]
    pub diamonds: u32,
    #[serde(default, rename = "c")]
    pub clubs: u32,
}

impl CutCounts {
    #[must_use]
    pub fn get(&self, suit: Suit) -> u32 {
        match suit {
            Suit::Spade => self.spades,
            Suit::Heart => self.hearts,
            Suit::Diamond => self.diamonds,
            Suit::Club => self.clubs,
        }
    }

    pub fn bump(&mut self, suit: Suit) {
        match suit {
            Suit::Spade => self.spades += 1,
            Suit::Heart => self.hearts += 1,
            Suit::Diamond => self.diamonds += 1,
            Suit::Club => self.clubs += 1,
        }
    }
}

/// A seated player and their hand.
#[derive(Clone, Debug)]
pub struct Player {
    pub seat: Seat,
    pub is_bot: bool,
    pub name: Username,
    pub character_id: String,
    /// Sorted by suit order then ascending strength. Order matters for
    /// bot card selection determinism, not for legality.
    pub hand: Vec<Card>,
    pub cuts_received: CutCounts,
    /// Transient reaction, cleared on a timer.
    pub emoji: Option<String>,
    pub emotion: String,
}

impl Player {
    #[must_use]
    pub fn human(seat: Seat, name: Username, character_id: String) -> Self {
        Self::new(seat, false, name, character_id)
    }

    #[must_use]
    pub fn bot(seat: Seat) -> Self {
        let name = Username::new(&format!("Bot {seat}"));
        // Avatars cycle char1..char11; seat 1 maps to char1.
        let avatar = (seat + constants::CHARACTER_COUNT - 1) % constants::CHARACTER_COUNT + 1;
        let character_id = format!("char{avatar}");
        Self::new(seat, true, name, character_id)
    }

    #[must_use]
    pub fn new(seat: Seat, is_bot: bool, name: Username, character_id: String) -> Self {
        Self {
            seat,
            is_bot,
            name,
            character_id,
            hand: Vec::new(),
            cuts_received: CutCounts::default(),
            emoji: None,
            emotion: "neutral".to_string(),
        }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.hand.push(card);
        self.sort_hand();
    }

    pub fn sort_hand(&mut self) {
        self.hand
            .sort_by_key(|c| (c.suit.sort_index(), c.value()));
    }

    /// Removes and returns the card at `index`, if in bounds.
    pub fn play_card(&mut self, index: usize) -> Option<Card> {
        if index < self.hand.len() {
            Some(self.hand.remove(index))
        } else {
            None
        }
    }

    #[must_use]
    pub fn has_suit(&self, suit: Suit) -> bool {
        self.hand.iter().any(|c| c.suit == suit)
    }

    /// Hand index of the first card matching (suit, rank), used to
    /// re-resolve play intents host-side.
    #[must_use]
    pub fn find_card(&self, suit: Suit, rank: Rank) -> Option<usize> {
        self.hand.iter().position(|c| c.suit == suit && c.rank == rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_standard_deck_has_52_unique_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.len(), 52);
        let unique: HashSet<(Suit, Rank)> =
            deck.cards().iter().map(|c| (c.suit, c.rank)).collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let reference = Deck::standard();
        let mut deck = Deck::standard();
        deck.shuffle(&mut rng);

        let mut expected: Vec<(Suit, Rank)> =
            reference.cards().iter().map(|c| (c.suit, c.rank)).collect();
        let mut shuffled: Vec<(Suit, Rank)> =
            deck.cards().iter().map(|c| (c.suit, c.rank)).collect();
        expected.sort();
        shuffled.sort();
        assert_eq!(expected, shuffled);
    }

    #[test]
    fn test_deal_round_robin_distribution() {
        // 6 seats: 52 = 6 * 8 + 4, so seats 0..4 get 9 cards, seats 4..6 get 8.
        let mut players: Vec<Player> = (0..6).map(Player::bot).collect();
        Deck::standard().deal(&mut players);
        let sizes: Vec<usize> = players.iter().map(|p| p.hand.len()).collect();
        assert_eq!(sizes, vec![9, 9, 9, 9, 8, 8]);
    }

    #[test]
    fn test_deal_even_distribution() {
        let mut players: Vec<Player> = (0..4).map(Player::bot).collect();
        Deck::standard().deal(&mut players);
        assert!(players.iter().all(|p| p.hand.len() == 13));
    }

    #[test]
    fn test_hand_sorted_by_suit_then_value() {
        let mut player = Player::bot(1);
        player.receive_card(Card::new(Suit::Club, Rank::Two));
        player.receive_card(Card::new(Suit::Spade, Rank::Ace));
        player.receive_card(Card::new(Suit::Spade, Rank::Three));
        player.receive_card(Card::new(Suit::Heart, Rank::King));

        let order: Vec<(Suit, Rank)> = player.hand.iter().map(|c| (c.suit, c.rank)).collect();
        assert_eq!(
            order,
            vec![
                (Suit::Spade, Rank::Three),
                (Suit::Spade, Rank::Ace),
                (Suit::Heart, Rank::King),
                (Suit::Club, Rank::Two),
            ]
        );
    }

    #[test]
    fn test_card_wire_round_trip_preserves_suit_and_rank() {
        let card = Card::new(Suit::Heart, Rank::Ten);
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"suit\":\"h\""));
        assert!(json.contains("\"rank\":\"10\""));

        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);

        // The id is optional on the wire and may be regenerated.
        let bare: Card = serde_json::from_str(r#"{"suit":"h","rank":"10"}"#).unwrap();
        assert_eq!(card, bare);
    }

    #[test]
    fn test_card_equality_ignores_identity() {
        let a = Card::new(Suit::Diamond, Rank::Queen);
        let b = Card::new(Suit::Diamond, Rank::Queen);
        assert_ne!(a.id, b.id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rank_values_ace_high() {
        assert_eq!(Rank::Two.value(), 2);
        assert_eq!(Rank::Ten.value(), 10);
        assert_eq!(Rank::Jack.value(), 11);
        assert_eq!(Rank::Ace.value(), 14);
    }

    #[test]
    fn test_username_sanitizes_whitespace() {
        let name = Username::new("big tuna");
        assert_eq!(name.to_string(), "big_tuna");
    }

    #[test]
    fn test_find_card_resolves_hand_index() {
        let mut player = Player::bot(2);
        player.receive_card(Card::new(Suit::Spade, Rank::Five));
        player.receive_card(Card::new(Suit::Club, Rank::Nine));
        let idx = player.find_card(Suit::Club, Rank::Nine).unwrap();
        assert_eq!(player.hand[idx].rank, Rank::Nine);
        assert!(player.find_card(Suit::Heart, Rank::Two).is_none());
    }
}
