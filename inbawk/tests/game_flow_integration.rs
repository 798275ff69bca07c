//! Integration tests for full game flow through the host session:
//! start, determination, trick play, and the end condition.

use inbawk::{
    Game, GameConfig, HostSession, Intent, Phase, bot,
    game::PlayerSpec,
    messages::CardKey,
};

fn bots_only_session(count: usize, seed: u64) -> HostSession {
    let config = GameConfig {
        player_count: count,
        ..GameConfig::default()
    };
    let mut game = Game::with_roster(config, Vec::<PlayerSpec>::new()).unwrap();
    game.reseed(seed);
    HostSession::new(game)
}

#[test]
fn test_bot_game_runs_to_completion() {
    let mut session = bots_only_session(4, 11);
    session.dispatch(Intent::StartGame).unwrap();
    session.fast_forward().unwrap();

    let game = session.game();
    assert!(!game.game_active());
    assert_eq!(game.phase(), Phase::Game);

    let holders: Vec<_> = game
        .players()
        .iter()
        .filter(|p| !p.hand.is_empty())
        .collect();
    assert!(holders.len() <= 1);
    match game.loser() {
        Some(loser) => assert_eq!(holders[0].seat, loser),
        None => assert!(holders.is_empty()),
    }

    // Every card is in a hand or the discard pile; the table is clear.
    let total: usize = game.players().iter().map(|p| p.hand.len()).sum();
    assert_eq!(total + game.discards().len(), 52);
    assert!(game.stack().is_empty());
}

#[test]
fn test_bot_games_complete_for_all_player_counts() {
    for count in 2..=6 {
        let mut session = bots_only_session(count, count as u64);
        session.dispatch(Intent::StartGame).unwrap();
        session.fast_forward().unwrap();
        assert!(
            !session.game().game_active(),
            "{count}-player game did not finish"
        );
    }
}

#[test]
fn test_human_game_waits_for_input_and_finishes() {
    let config = GameConfig {
        player_name: "grace".to_string(),
        player_count: 3,
        ..GameConfig::default()
    };
    let mut game = Game::new(config).unwrap();
    game.reseed(23);
    let mut session = HostSession::new(game);

    session.dispatch(Intent::StartGame).unwrap();
    session.fast_forward().unwrap();

    // The session went quiet with the game still active: it is the
    // human's turn and nothing else can move.
    let mut rounds = 0;
    while session.game().game_active() {
        let game = session.game();
        assert_eq!(game.current_turn(), 0, "stalled on a bot turn");
        assert!(!game.is_settling());

        let player = &game.players()[0];
        let index = bot::choose_card(
            &player.hand,
            game.phase(),
            game.led_suit(),
            game.stack().is_empty(),
            &player.cuts_received,
        )
        .expect("human still holds cards while the game is active");
        let card = player.hand[index];
        session
            .dispatch(Intent::PlayCard {
                seat: 0,
                card: CardKey {
                    suit: card.suit,
                    rank: card.rank,
                },
            })
            .unwrap();
        session.fast_forward().unwrap();

        rounds += 1;
        assert!(rounds < 200, "game did not converge");
    }

    let game = session.game();
    assert!(game.loser().is_some() || game.players().iter().all(|p| p.hand.is_empty()));
}

#[test]
fn test_replayed_game_is_deterministic() {
    let run = |seed| {
        let mut session = bots_only_session(5, seed);
        session.dispatch(Intent::StartGame).unwrap();
        session.fast_forward().unwrap();
        (session.game().loser(), session.snapshot())
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn test_game_can_be_restarted_after_it_ends() {
    let mut session = bots_only_session(3, 5);
    session.dispatch(Intent::StartGame).unwrap();
    session.fast_forward().unwrap();
    assert!(!session.game().game_active());

    session.dispatch(Intent::StartGame).unwrap();
    assert!(session.game().game_active());
    session.fast_forward().unwrap();
    assert!(!session.game().game_active());
    assert!(session.game().loser().is_some() || session.game().stack().is_empty());
}
