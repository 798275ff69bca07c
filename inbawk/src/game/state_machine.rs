//! Game controller and phase state machine.
//!
//! [`Game`] is the single authority over game state. In online rooms it
//! runs only on the host; clients mirror published snapshots and submit
//! intents. There are exactly two mutating entry points:
//!
//! - [`Game::dispatch`] for player intents (start, play card, emoji)
//! - [`Game::apply`] for deferred actions that a pacing layer fires
//!   when their delay elapses
//!
//! Both return [`Scheduled`] values instead of sleeping, so the engine
//! computes outcomes instantly and the caller decides when to reveal
//! them. While a trick outcome is computed but not yet applied, the
//! controller sits in a settling sub-state and drops any `PLAY_CARD`
//! intent that arrives in the window.

use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error;

use super::constants;
use super::entities::{Card, CutCounts, Deck, Player, Rank, Seat, Suit, Username};
use super::round::{
    self, DetermineOutcome, DetermineReason, PlayRecord,
};
use crate::bot;
use crate::net::messages::{Intent, PlayerView, Snapshot};

/// Errors that can occur constructing a game.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error(
        "need {min}-{max} players, got {given}",
        min = constants::MIN_PLAYERS,
        max = constants::MAX_PLAYERS
    )]
    InvalidPlayerCount { given: usize },
    #[error("roster has {given} players but the game seats {seats}")]
    RosterTooLarge { given: usize, seats: usize },
    #[error("roster seat {seat} is out of range or duplicated")]
    InvalidRosterSeat { seat: Seat },
}

/// Game lifecycle phases. The terminal condition is `game_active`
/// flipping to false, not a phase of its own, to match the wire format.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Shuffling,
    Dealing,
    Determine,
    Game,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "LOBBY",
            Self::Shuffling => "SHUFFLING",
            Self::Dealing => "DEALING",
            Self::Determine => "DETERMINE",
            Self::Game => "GAME",
        };
        write!(f, "{repr}")
    }
}

/// Construction parameters supplied by the embedding UI or server.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Empty/absent means local solo-vs-bots mode.
    pub room_id: Option<String>,
    /// Only the host instance mutates state and runs bots.
    pub is_host: bool,
    pub player_name: String,
    pub character_id: String,
    pub player_count: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            room_id: None,
            is_host: true,
            player_name: "You".to_string(),
            character_id: constants::DEFAULT_CHARACTER.to_string(),
            player_count: constants::DEFAULT_PLAYERS,
        }
    }
}

/// A lobby participant used to seat humans in an online game.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerSpec {
    pub seat: Seat,
    pub name: String,
    pub character_id: String,
}

/// An action the pacing layer should feed back into [`Game::apply`]
/// after the given delay elapses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeferredAction {
    /// Shuffle animation finished; deal the cards.
    BeginDealing,
    /// Deal settled; open the determination trick.
    BeginDetermination,
    /// Reveal window elapsed; apply the pending trick outcome.
    ApplyResolution,
    /// The current bot finished "thinking"; let it play.
    BotTurn,
    ClearNotification { seq: u64 },
    ClearEmoji { seat: Seat, seq: u64 },
}

/// A deferred action paired with its presentation delay.
#[derive(Clone, Debug)]
pub struct Scheduled {
    pub after: Duration,
    pub action: DeferredAction,
}

impl Scheduled {
    #[must_use]
    pub fn new(after: Duration, action: DeferredAction) -> Self {
        Self { after, action }
    }
}

/// A trick outcome that has been computed but not yet revealed. While
/// one is pending, new plays are dropped rather than double-processed.
#[derive(Clone, Debug)]
enum PendingResolution {
    DetermineResult(DetermineOutcome),
    CutPickup { victim: Seat },
    TrickAward { winner: Seat },
}

/// The authoritative game instance.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    players: Vec<Player>,
    /// Built and shuffled at game start, consumed when dealing.
    deck: Option<Deck>,
    /// Cards face-up on the table for the active trick.
    stack: Vec<Card>,
    /// Face-up pile of resolved tricks. Cards here are out of play but
    /// still counted for conservation checks.
    discards: Vec<Card>,
    led_suit: Option<Suit>,
    current_turn: Seat,
    /// Most recent trick winner/victim, shown during the settle window.
    last_winner: Option<Seat>,
    history: Vec<PlayRecord>,
    phase: Phase,
    game_active: bool,
    pending: Option<PendingResolution>,
    notification: String,
    notification_seq: u64,
    emoji_seqs: Vec<u64>,
    loser: Option<Seat>,
    rng: StdRng,
}

impl Game {
    /// Creates a local game: seat 0 is the configured human, remaining
    /// seats are bots.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::check_player_count(config.player_count)?;
        let mut players = Vec::with_capacity(config.player_count);
        players.push(Player::human(
            0,
            Username::new(&config.player_name),
            config.character_id.clone(),
        ));
        for seat in 1..config.player_count {
            players.push(Player::bot(seat));
        }
        Ok(Self::from_parts(config, players))
    }

    /// Creates an online host game from lobby participants. Remaining
    /// seats up to the configured player count are filled with bots.
    pub fn with_roster(config: GameConfig, roster: Vec<PlayerSpec>) -> Result<Self, GameError> {
        Self::check_player_count(config.player_count)?;
        if roster.len() > config.player_count {
            return Err(GameError::RosterTooLarge {
                given: roster.len(),
                seats: config.player_count,
            });
        }

        let mut roster = roster;
        roster.sort_by_key(|spec| spec.seat);
        let mut players: Vec<Player> = Vec::with_capacity(config.player_count);
        for spec in roster {
            if spec.seat != players.len() {
                return Err(GameError::InvalidRosterSeat { seat: spec.seat });
            }
            players.push(Player::human(
                spec.seat,
                Username::new(&spec.name),
                spec.character_id,
            ));
        }
        while players.len() < config.player_count {
            players.push(Player::bot(players.len()));
        }
        Ok(Self::from_parts(config, players))
    }

    fn from_parts(config: GameConfig, players: Vec<Player>) -> Self {
        let emoji_seqs = vec![0; players.len()];
        Self {
            config,
            players,
            deck: None,
            stack: Vec::new(),
            discards: Vec::new(),
            led_suit: None,
            current_turn: 0,
            last_winner: None,
            history: Vec::new(),
            phase: Phase::Lobby,
            game_active: false,
            pending: None,
            notification: String::new(),
            notification_seq: 0,
            emoji_seqs,
            loser: None,
            rng: StdRng::from_os_rng(),
        }
    }

    fn check_player_count(count: usize) -> Result<(), GameError> {
        if !(constants::MIN_PLAYERS..=constants::MAX_PLAYERS).contains(&count) {
            return Err(GameError::InvalidPlayerCount { given: count });
        }
        Ok(())
    }

    /// Replaces the randomness source with a seeded one. Shuffling and
    /// bot pacing become deterministic; used by tests and simulations.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // === Accessors ===

    /// The construction parameters, kept so embeddings can read back
    /// the room id and host flag they created the game with.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn game_active(&self) -> bool {
        self.game_active
    }

    #[must_use]
    pub fn current_turn(&self) -> Seat {
        self.current_turn
    }

    #[must_use]
    pub fn led_suit(&self) -> Option<Suit> {
        self.led_suit
    }

    #[must_use]
    pub fn stack(&self) -> &[Card] {
        &self.stack
    }

    #[must_use]
    pub fn discards(&self) -> &[Card] {
        &self.discards
    }

    #[must_use]
    pub fn history(&self) -> &[PlayRecord] {
        &self.history
    }

    #[must_use]
    pub fn last_winner(&self) -> Option<Seat> {
        self.last_winner
    }

    #[must_use]
    pub fn notification(&self) -> &str {
        &self.notification
    }

    /// The player left holding cards when the game ended, if any.
    #[must_use]
    pub fn loser(&self) -> Option<Seat> {
        self.loser
    }

    /// True while a computed trick outcome awaits its reveal.
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }

    // === Intents ===

    /// Processes a player intent. Illegal intents (wrong turn, wrong
    /// phase, card not held, settling window) are dropped silently; the
    /// channel they arrive over cannot carry a rejection anyway.
    pub fn dispatch(&mut self, intent: Intent) -> Vec<Scheduled> {
        match intent {
            Intent::StartGame => {
                if self.game_active {
                    debug!("dropping START_GAME: game already in progress");
                    return Vec::new();
                }
                self.start_game()
            }
            Intent::PlayCard { seat, card } => self.handle_play_intent(seat, card.suit, card.rank),
            Intent::Emoji { seat, emoji } => self.set_emoji(seat, emoji),
        }
    }

    /// Applies a deferred action whose delay has elapsed.
    pub fn apply(&mut self, action: DeferredAction) -> Vec<Scheduled> {
        match action {
            DeferredAction::BeginDealing => self.begin_dealing(),
            DeferredAction::BeginDetermination => self.begin_determination(),
            DeferredAction::ApplyResolution => self.apply_resolution(),
            DeferredAction::BotTurn => self.bot_turn(),
            DeferredAction::ClearNotification { seq } => {
                if seq == self.notification_seq {
                    self.notification.clear();
                }
                Vec::new()
            }
            DeferredAction::ClearEmoji { seat, seq } => {
                if self.emoji_seqs.get(seat).copied() == Some(seq) {
                    if let Some(player) = self.players.get_mut(seat) {
                        player.emoji = None;
                    }
                }
                Vec::new()
            }
        }
    }

    // === Phase transitions ===

    fn start_game(&mut self) -> Vec<Scheduled> {
        info!("starting game with {} players", self.players.len());
        self.game_active = true;
        self.loser = None;
        self.pending = None;
        self.clear_table();
        self.discards.clear();
        for player in &mut self.players {
            player.hand.clear();
            player.cuts_received = CutCounts::default();
            player.emoji = None;
            player.emotion = "neutral".to_string();
        }

        let mut deck = Deck::standard();
        deck.shuffle(&mut self.rng);
        self.deck = Some(deck);
        self.phase = Phase::Shuffling;

        vec![Scheduled::new(
            constants::SHUFFLE_DELAY,
            DeferredAction::BeginDealing,
        )]
    }

    fn begin_dealing(&mut self) -> Vec<Scheduled> {
        if self.phase != Phase::Shuffling || !self.game_active {
            debug!("dropping BeginDealing in phase {}", self.phase);
            return Vec::new();
        }
        self.phase = Phase::Dealing;
        if let Some(deck) = self.deck.take() {
            deck.deal(&mut self.players);
        }
        vec![Scheduled::new(
            constants::DEAL_SETTLE_DELAY,
            DeferredAction::BeginDetermination,
        )]
    }

    fn begin_determination(&mut self) -> Vec<Scheduled> {
        if self.phase != Phase::Dealing || !self.game_active {
            debug!("dropping BeginDetermination in phase {}", self.phase);
            return Vec::new();
        }
        self.phase = Phase::Determine;
        self.current_turn = 0;
        // The determination trick is always led by spades.
        self.led_suit = Some(Suit::Spade);

        let mut out = vec![self.notify("Play a SPADE to decide who starts!".to_string())];
        out.extend(self.schedule_bot());
        out
    }

    // === Card plays ===

    fn handle_play_intent(&mut self, seat: Seat, suit: Suit, rank: Rank) -> Vec<Scheduled> {
        if !self.game_active {
            debug!("dropping PLAY_CARD from seat {seat}: no active game");
            return Vec::new();
        }
        if self.pending.is_some() {
            debug!("dropping PLAY_CARD from seat {seat}: trick is settling");
            return Vec::new();
        }
        if !matches!(self.phase, Phase::Determine | Phase::Game) {
            debug!("dropping PLAY_CARD from seat {seat} in phase {}", self.phase);
            return Vec::new();
        }
        if seat != self.current_turn {
            debug!(
                "dropping PLAY_CARD from seat {seat}: current turn is {}",
                self.current_turn
            );
            return Vec::new();
        }
        let Some(player) = self.players.get(seat) else {
            debug!("dropping PLAY_CARD from unknown seat {seat}");
            return Vec::new();
        };
        // Re-resolve the hand index by suit and rank; client indices
        // are never trusted.
        let Some(index) = player.find_card(suit, rank) else {
            debug!("dropping PLAY_CARD from seat {seat}: {rank:?} of {suit:?} not in hand");
            return Vec::new();
        };
        // During determination a spade must be played if one is held.
        if self.phase == Phase::Determine && suit != Suit::Spade && player.has_suit(Suit::Spade) {
            debug!("dropping PLAY_CARD from seat {seat}: must lead a spade in determination");
            return Vec::new();
        }
        self.play_card_at(index)
    }

    /// Plays the card at `index` of the current player's hand. The
    /// index must already be validated.
    fn play_card_at(&mut self, index: usize) -> Vec<Scheduled> {
        let seat = self.current_turn;
        let Some(card) = self.players[seat].play_card(index) else {
            debug!("dropping play: index {index} out of bounds for seat {seat}");
            return Vec::new();
        };
        self.stack.push(card);
        self.history.push(PlayRecord { seat, card });
        self.assert_conservation();

        match self.phase {
            Phase::Determine => {
                if self.stack.len() == self.players.len() {
                    self.finish_determination()
                } else {
                    self.next_turn()
                }
            }
            Phase::Game => {
                let led = *self.led_suit.get_or_insert(card.suit);
                if card.suit != led {
                    self.queue_cut(seat, card, led)
                } else {
                    let hand_sizes: Vec<usize> =
                        self.players.iter().map(|p| p.hand.len()).collect();
                    let expected = round::expected_trick_size(&hand_sizes, &self.history);
                    if self.stack.len() >= expected {
                        self.queue_trick_award()
                    } else {
                        self.next_turn()
                    }
                }
            }
            // Guarded by handle_play_intent and bot_turn.
            _ => Vec::new(),
        }
    }

    fn finish_determination(&mut self) -> Vec<Scheduled> {
        let Some(outcome) = round::determination_outcome(&self.history) else {
            debug!("determination trick resolved with empty history");
            return Vec::new();
        };
        let name = self.players[outcome.winner].name.clone();
        let message = match outcome.reason {
            DetermineReason::FirstCut => format!("{name} CUTS and starts!"),
            DetermineReason::HighestSpade => format!("{name} has Highest Spade!"),
            DetermineReason::Fallback => format!("{name} starts!"),
        };
        self.pending = Some(PendingResolution::DetermineResult(outcome));

        let mut out = vec![self.notify(message)];
        out.push(Scheduled::new(
            constants::DETERMINE_SETTLE_DELAY,
            DeferredAction::ApplyResolution,
        ));
        out
    }

    fn queue_cut(&mut self, cutter: Seat, cut_card: Card, led: Suit) -> Vec<Scheduled> {
        // The trick leader gets a cut mark against the suit they led;
        // bots use it to avoid leading that suit again.
        if let Some(leader) = self.history.first().map(|p| p.seat) {
            self.players[leader].cuts_received.bump(led);
        }
        let prior = &self.history[..self.history.len() - 1];
        let victim = round::cut_victim(prior, led)
            .or_else(|| self.history.first().map(|p| p.seat))
            .unwrap_or(cutter);

        self.last_winner = Some(victim);
        self.pending = Some(PendingResolution::CutPickup { victim });
        let cutter_name = self.players[cutter].name.clone();

        let mut out = vec![self.notify(format!("{cutter_name} Cut with {cut_card}!"))];
        out.push(Scheduled::new(
            constants::CUT_SETTLE_DELAY,
            DeferredAction::ApplyResolution,
        ));
        out
    }

    fn queue_trick_award(&mut self) -> Vec<Scheduled> {
        let Some(winner) = round::trick_winner(&self.history) else {
            debug!("trick completed with empty history");
            return Vec::new();
        };
        self.last_winner = Some(winner);
        self.pending = Some(PendingResolution::TrickAward { winner });
        let name = self.players[winner].name.clone();

        let mut out = vec![self.notify(format!("{name} wins round!"))];
        out.push(Scheduled::new(
            constants::TRICK_SETTLE_DELAY,
            DeferredAction::ApplyResolution,
        ));
        out
    }

    fn apply_resolution(&mut self) -> Vec<Scheduled> {
        let Some(pending) = self.pending.take() else {
            debug!("dropping ApplyResolution: nothing pending");
            return Vec::new();
        };
        match pending {
            PendingResolution::DetermineResult(outcome) => {
                self.discards.append(&mut self.stack);
                self.clear_table();
                self.phase = Phase::Game;
                self.current_turn = outcome.winner;
                let name = self.players[outcome.winner].name.clone();
                info!("determination won by seat {}", outcome.winner);

                let mut out = vec![self.notify(format!("Game Start! {name} leads."))];
                out.extend(self.schedule_bot());
                out
            }
            PendingResolution::CutPickup { victim } => {
                let picked_up = self.stack.len();
                let cards: Vec<Card> = self.stack.drain(..).collect();
                for card in cards {
                    self.players[victim].receive_card(card);
                }
                self.clear_table();
                self.current_turn = victim;
                self.assert_conservation();
                let name = self.players[victim].name.clone();

                let mut out = vec![self.notify(format!("{name} picks up {picked_up} cards!"))];
                out.extend(self.check_win());
                out.extend(self.schedule_bot());
                out
            }
            PendingResolution::TrickAward { winner } => {
                self.discards.append(&mut self.stack);
                self.clear_table();
                self.assert_conservation();
                self.current_turn = winner;

                let mut out = Vec::new();
                // A winner who just went out passes the lead onward.
                if self.players[winner].hand.is_empty() && self.game_still_on() {
                    let next = self.next_holder_after(winner);
                    self.current_turn = next;
                    let winner_name = self.players[winner].name.clone();
                    let next_name = self.players[next].name.clone();
                    out.push(self.notify(format!("{winner_name} finished! {next_name} leads.")));
                }
                out.extend(self.check_win());
                out.extend(self.schedule_bot());
                out
            }
        }
    }

    // === Turn scheduling ===

    fn next_turn(&mut self) -> Vec<Scheduled> {
        self.current_turn = self.next_holder_after(self.current_turn);
        self.schedule_bot()
    }

    /// The next seat after `seat` (wrapping) that still holds cards.
    /// Empty-handed players are skipped while the game is still on.
    fn next_holder_after(&self, seat: Seat) -> Seat {
        let n = self.players.len();
        let mut next = (seat + 1) % n;
        let mut hops = 0;
        while self.players[next].hand.is_empty() && hops < n {
            next = (next + 1) % n;
            hops += 1;
        }
        next
    }

    /// Schedules a bot turn with a randomized think delay when the
    /// current player is a bot and the game is still running.
    fn schedule_bot(&mut self) -> Vec<Scheduled> {
        if !self.game_active || self.pending.is_some() {
            return Vec::new();
        }
        let Some(player) = self.players.get(self.current_turn) else {
            return Vec::new();
        };
        if !player.is_bot {
            return Vec::new();
        }
        let delay = bot::think_delay(&mut self.rng);
        vec![Scheduled::new(delay, DeferredAction::BotTurn)]
    }

    fn bot_turn(&mut self) -> Vec<Scheduled> {
        if !self.game_active || self.pending.is_some() {
            debug!("dropping BotTurn: game inactive or settling");
            return Vec::new();
        }
        if !matches!(self.phase, Phase::Determine | Phase::Game) {
            debug!("dropping BotTurn in phase {}", self.phase);
            return Vec::new();
        }
        let player = &self.players[self.current_turn];
        if !player.is_bot {
            debug!("dropping BotTurn: seat {} is human", self.current_turn);
            return Vec::new();
        }
        let choice = bot::choose_card(
            &player.hand,
            self.phase,
            self.led_suit,
            self.stack.is_empty(),
            &player.cuts_received,
        );
        match choice {
            Some(index) => self.play_card_at(index),
            None => {
                debug!("bot at seat {} has no card to play", self.current_turn);
                Vec::new()
            }
        }
    }

    // === Win condition ===

    fn game_still_on(&self) -> bool {
        self.players.iter().filter(|p| !p.hand.is_empty()).count() > 1
    }

    fn check_win(&mut self) -> Vec<Scheduled> {
        let holders: Vec<Seat> = self
            .players
            .iter()
            .filter(|p| !p.hand.is_empty())
            .map(|p| p.seat)
            .collect();
        if holders.len() > 1 {
            return Vec::new();
        }

        self.game_active = false;
        match holders.first() {
            Some(&seat) => {
                self.loser = Some(seat);
                let name = self.players[seat].name.clone();
                info!("game over, seat {seat} is the loser");
                vec![self.notify(format!("Game Over! {name} is the loser!"))]
            }
            None => {
                // Simultaneous empty hands: the game just ends.
                info!("game over with no loser");
                vec![self.notify("Game Over!".to_string())]
            }
        }
    }

    // === Transients ===

    fn set_emoji(&mut self, seat: Seat, emoji: String) -> Vec<Scheduled> {
        let Some(player) = self.players.get_mut(seat) else {
            debug!("dropping EMOJI from unknown seat {seat}");
            return Vec::new();
        };
        player.emoji = Some(emoji);
        self.emoji_seqs[seat] += 1;
        vec![Scheduled::new(
            constants::EMOJI_CLEAR_DELAY,
            DeferredAction::ClearEmoji {
                seat,
                seq: self.emoji_seqs[seat],
            },
        )]
    }

    /// Sets the transient notification and returns its timed clear.
    /// The sequence token keeps a stale clear from wiping a newer
    /// message.
    fn notify(&mut self, message: String) -> Scheduled {
        self.notification = message;
        self.notification_seq += 1;
        Scheduled::new(
            constants::NOTIFICATION_CLEAR_DELAY,
            DeferredAction::ClearNotification {
                seq: self.notification_seq,
            },
        )
    }

    fn clear_table(&mut self) {
        self.stack.clear();
        self.history.clear();
        self.led_suit = None;
        self.last_winner = None;
    }

    /// Card conservation: once dealt, hands plus the table stack plus
    /// the discard pile hold exactly 52 cards at every observable
    /// instant.
    fn assert_conservation(&self) {
        if cfg!(debug_assertions)
            && self.game_active
            && matches!(self.phase, Phase::Determine | Phase::Game)
        {
            let total: usize = self.players.iter().map(|p| p.hand.len()).sum::<usize>()
                + self.stack.len()
                + self.discards.len();
            debug_assert_eq!(total, constants::DECK_SIZE, "card conservation violated");
        }
    }

    // === Snapshots ===

    /// Builds the full-replace state snapshot published to clients.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.seat,
                    name: p.name.to_string(),
                    is_bot: p.is_bot,
                    emoji: p.emoji.clone(),
                    emotion: p.emotion.clone(),
                    character_id: p.character_id.clone(),
                    hand: p.hand.clone(),
                    cuts_received: p.cuts_received,
                })
                .collect(),
            stack: self.stack.clone(),
            current_turn: self.current_turn,
            led_suit: self.led_suit,
            last_winner: self.last_winner,
            round_history: self.history.clone(),
            game_active: self.game_active,
            phase: self.phase,
            notification: self.notification.clone(),
        }
    }
}
