//! Wire types exchanged through the replicated state store.
//!
//! The host publishes full [`Snapshot`]s; clients submit [`Intent`]s.
//! Both sides speak the room store's JSON vocabulary: camelCase field
//! names, short suit codes, and a `type` tag on intents.
//!
//! The replication boundary does not preserve list semantics for
//! sparse integer-keyed collections: a published array may arrive as a
//! `{"0": .., "1": ..}` map, or be dropped entirely when empty. Every
//! sequence field therefore normalizes on ingress to a canonical
//! ordered vector.

use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::game::entities::{Card, CutCounts, Rank, Seat, Suit};
use crate::game::round::PlayRecord;
use crate::game::state_machine::Phase;

/// The (suit, rank) pair identifying a card on the wire. Hosts
/// re-resolve hand indices from this rather than trusting a raw index.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardKey {
    pub suit: Suit,
    pub rank: Rank,
}

impl From<&Card> for CardKey {
    fn from(card: &Card) -> Self {
        Self {
            suit: card.suit,
            rank: card.rank,
        }
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// A client-to-host action request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Intent {
    /// Start (or restart) the game. Valid only while no game is active.
    #[serde(rename = "START_GAME")]
    StartGame,
    /// Play a card. Ignored unless it is the sender's turn and the
    /// card is in their hand.
    #[serde(rename = "PLAY_CARD")]
    PlayCard {
        #[serde(rename = "playerIndex")]
        seat: Seat,
        card: CardKey,
    },
    /// Set a transient reaction emoji. No legality check.
    #[serde(rename = "EMOJI")]
    Emoji {
        #[serde(rename = "playerIndex")]
        seat: Seat,
        emoji: String,
    },
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartGame => write!(f, "start game"),
            Self::PlayCard { seat, card } => write!(f, "seat {seat} plays {card}"),
            Self::Emoji { seat, emoji } => write!(f, "seat {seat} reacts {emoji}"),
        }
    }
}

fn default_emotion() -> String {
    "neutral".to_string()
}

/// A player as published to clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Seat,
    pub name: String,
    pub is_bot: bool,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default = "default_emotion")]
    pub emotion: String,
    pub character_id: String,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub cuts_received: CutCounts,
}

/// The complete game state, published as a full replacement on every
/// change. Applying the same snapshot twice is a no-op by construction.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "seq_or_map")]
    pub players: Vec<PlayerView>,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub stack: Vec<Card>,
    pub current_turn: Seat,
    #[serde(default)]
    pub led_suit: Option<Suit>,
    #[serde(default)]
    pub last_winner: Option<Seat>,
    #[serde(default, deserialize_with = "seq_or_map")]
    pub round_history: Vec<PlayRecord>,
    pub game_active: bool,
    pub phase: Phase,
    #[serde(default)]
    pub notification: String,
}

/// Accepts a JSON array, a sparse integer-keyed map, or null, and
/// normalizes to an ordered vector (map entries sorted by numeric key).
pub fn seq_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeqOrMap<T> {
        Seq(Vec<T>),
        Map(BTreeMap<String, T>),
    }

    match Option::<SeqOrMap<T>>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(SeqOrMap::Seq(seq)) => Ok(seq),
        Some(SeqOrMap::Map(map)) => {
            let mut entries: Vec<(usize, T)> = map
                .into_iter()
                .filter_map(|(key, value)| key.parse().ok().map(|index| (index, value)))
                .collect();
            entries.sort_by_key(|(index, _)| *index);
            Ok(entries.into_iter().map(|(_, value)| value).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_wire_format_matches_room_store() {
        let intent = Intent::PlayCard {
            seat: 2,
            card: CardKey {
                suit: Suit::Heart,
                rank: Rank::King,
            },
        };
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["type"], "PLAY_CARD");
        assert_eq!(value["playerIndex"], 2);
        assert_eq!(value["card"]["suit"], "h");
        assert_eq!(value["card"]["rank"], "K");

        let back: Intent = serde_json::from_value(value).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_start_game_intent_round_trip() {
        let json = r#"{"type":"START_GAME"}"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        assert_eq!(intent, Intent::StartGame);
    }

    #[test]
    fn test_seq_or_map_accepts_arrays() {
        let value = json!({
            "currentTurn": 0,
            "gameActive": true,
            "phase": "GAME",
            "stack": [{"suit": "h", "rank": "7"}],
            "players": [],
        });
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.stack.len(), 1);
        assert_eq!(snapshot.stack[0].suit, Suit::Heart);
    }

    #[test]
    fn test_seq_or_map_normalizes_sparse_keyed_maps() {
        // The store may collapse arrays into integer-keyed objects and
        // deliver keys out of order.
        let value = json!({
            "currentTurn": 1,
            "gameActive": true,
            "phase": "GAME",
            "stack": {
                "1": {"suit": "s", "rank": "2"},
                "0": {"suit": "h", "rank": "7"},
            },
        });
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.stack.len(), 2);
        assert_eq!(snapshot.stack[0].suit, Suit::Heart);
        assert_eq!(snapshot.stack[1].suit, Suit::Spade);
    }

    #[test]
    fn test_absent_collections_normalize_to_empty() {
        let value = json!({
            "currentTurn": 0,
            "gameActive": false,
            "phase": "LOBBY",
        });
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();
        assert!(snapshot.players.is_empty());
        assert!(snapshot.stack.is_empty());
        assert!(snapshot.round_history.is_empty());
        assert_eq!(snapshot.notification, "");
        assert_eq!(snapshot.led_suit, None);
    }

    #[test]
    fn test_round_history_wire_field_names() {
        let value = json!({
            "currentTurn": 0,
            "gameActive": true,
            "phase": "GAME",
            "roundHistory": [
                {"playerIndex": 3, "card": {"suit": "c", "rank": "A"}},
            ],
        });
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.round_history.len(), 1);
        assert_eq!(snapshot.round_history[0].seat, 3);
        assert_eq!(snapshot.round_history[0].card.rank, Rank::Ace);
    }

    #[test]
    fn test_snapshot_application_is_idempotent() {
        let value = json!({
            "currentTurn": 2,
            "gameActive": true,
            "phase": "DETERMINE",
            "ledSuit": "s",
            "players": [
                {
                    "id": 0,
                    "name": "ada",
                    "isBot": false,
                    "characterId": "char1",
                    "hand": [{"suit": "s", "rank": "4"}],
                    "cutsReceived": {"s": 0, "h": 1, "d": 0, "c": 0},
                },
            ],
            "roundHistory": [
                {"playerIndex": 0, "card": {"suit": "s", "rank": "9"}},
            ],
        });
        let first: Snapshot = serde_json::from_value(value.clone()).unwrap();
        let second: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.round_history.len(), second.round_history.len());
        assert_eq!(first.players[0].cuts_received.hearts, 1);
    }
}
