//! Bot Strategy Tests
//!
//! Every strategy must pick a legal candidate, leave the game untouched and
//! respect its own selection rule: first-possible takes the first candidate,
//! most-fish and smart never pass over a strictly better rated one.

use penguins::bot::{
    BotMove, BotOutcome, BotParameters, BotState, MovementStrategy, PlacementStrategy,
};
use penguins::game::{Game, GamePhase};
use penguins::rng::{make_rng, RngKind};

const PLACEMENT_LAYOUT: [&str; 5] = [
    "1121311", //
    "2113~21", //
    "11~1231", //
    "3121112", //
    "~~11~13",
];

const MOVEMENT_LAYOUT: [&str; 5] = [
    "A1231~1", //
    "21~12B2", //
    "1B321~1", //
    "33112A3", //
    "~~12113",
];

fn placement_game() -> Game {
    let mut game = Game::from_layout(&PLACEMENT_LAYOUT, 2, 2).unwrap();
    game.advance_state().unwrap();
    assert_eq!(game.phase(), GamePhase::Placement);
    game
}

fn movement_game() -> Game {
    let mut game = Game::from_layout(&MOVEMENT_LAYOUT, 2, 2).unwrap();
    game.advance_state().unwrap();
    assert_eq!(game.phase(), GamePhase::Movement);
    game
}

fn placement_params(strategy: PlacementStrategy) -> BotParameters {
    BotParameters {
        placement_strategy: strategy,
        placement_scan_area: 2,
        ..BotParameters::default()
    }
}

fn movement_params(strategy: MovementStrategy) -> BotParameters {
    BotParameters {
        movement_strategy: strategy,
        ..BotParameters::default()
    }
}

fn chosen(outcome: BotOutcome) -> BotMove {
    match outcome {
        BotOutcome::Chosen(mv) => mv,
        other => panic!("expected a chosen action, got {:?}", other),
    }
}

#[test]
fn test_first_possible_placement_takes_first_candidate() {
    let mut game = placement_game();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let candidates = state.generate_all_placements(&game);
    let params = placement_params(PlacementStrategy::FirstPossible);
    let mv = chosen(state.compute_placement(&mut game, &params, &mut *rng).unwrap());
    assert_eq!(mv.penguin, None);
    assert_eq!(mv.target, candidates[0]);
}

#[test]
fn test_most_fish_placement_is_never_beaten() {
    let mut game = placement_game();
    let before = game.clone();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let params = placement_params(PlacementStrategy::MostFish);

    let candidates = state.generate_all_placements(&game);
    let scores = state
        .rate_placements_list(&mut game, &params, &candidates)
        .unwrap()
        .expect("not aborted");
    let mv = chosen(state.compute_placement(&mut game, &params, &mut *rng).unwrap());

    assert!(candidates.contains(&mv.target));
    assert!(scores.iter().all(|s| *s <= mv.score), "most-fish passed over a richer tile");
    let first_best = scores.iter().position(|s| *s == mv.score).unwrap();
    assert_eq!(candidates[first_best], mv.target, "ties go to the first candidate");
    assert_eq!(game, before);
}

#[test]
fn test_smart_placement_is_never_beaten() {
    let mut game = placement_game();
    let before = game.clone();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let params = placement_params(PlacementStrategy::Smart);

    let candidates = state.generate_all_placements(&game);
    let scores = state
        .rate_placements_list(&mut game, &params, &candidates)
        .unwrap()
        .expect("not aborted");
    assert_eq!(game, before, "rating a placement list changed the game");

    let mv = chosen(state.compute_placement(&mut game, &params, &mut *rng).unwrap());
    assert!(scores.iter().all(|s| *s <= mv.score));
    assert_eq!(game, before);
}

#[test]
fn test_random_placement_is_reproducible() {
    let params = placement_params(PlacementStrategy::Random);
    let mut picks = Vec::new();
    for _ in 0..2 {
        let mut game = placement_game();
        let mut state = BotState::new();
        let mut rng = make_rng(RngKind::Small, Some(99));
        let candidates = state.generate_all_placements(&game);
        let mut targets = Vec::new();
        for _ in 0..5 {
            let mv = chosen(state.compute_placement(&mut game, &params, &mut *rng).unwrap());
            assert!(candidates.contains(&mv.target));
            targets.push(mv.target);
        }
        picks.push(targets);
    }
    assert_eq!(picks[0], picks[1]);
}

#[test]
fn test_first_possible_move_takes_first_candidate() {
    let mut game = movement_game();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let params = movement_params(MovementStrategy::FirstPossible);
    let player = game.current_player_index().unwrap();
    let candidates = state.generate_all_moves(&game, &params, player);
    let mv = chosen(state.compute_move(&mut game, &params, &mut *rng).unwrap());
    assert_eq!(mv, candidates[0]);
}

#[test]
fn test_every_generated_move_is_legal() {
    let game = movement_game();
    let state = BotState::new();
    let params = BotParameters::default();
    let player = game.current_player_index().unwrap();
    let moves = state.generate_all_moves(&game, &params, player);
    assert!(!moves.is_empty());
    for mv in moves {
        let penguin = mv.penguin.expect("movement candidates name a penguin");
        assert!(game.validate_movement(penguin, mv.target).is_ok());
    }
}

#[test]
fn test_smart_move_is_never_beaten() {
    let mut game = movement_game();
    let before = game.clone();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let params = movement_params(MovementStrategy::Smart);

    let player = game.current_player_index().unwrap();
    let candidates = state.generate_all_moves(&game, &params, player);
    let scores = state
        .rate_moves_list(&mut game, &params, &candidates)
        .unwrap()
        .expect("not aborted");
    assert_eq!(game, before, "rating a move list changed the game");

    let mv = chosen(state.compute_move(&mut game, &params, &mut *rng).unwrap());
    assert!(scores.iter().all(|s| *s <= mv.score));
    let first_best = scores.iter().position(|s| *s == mv.score).unwrap();
    assert_eq!(candidates[first_best].target, mv.target);
    assert_eq!(candidates[first_best].penguin, mv.penguin);
    assert_eq!(game, before);
}

#[test]
fn test_single_rating_matches_list_rating() {
    let mut game = movement_game();
    let mut state = BotState::new();
    let params = BotParameters::default();
    let player = game.current_player_index().unwrap();
    let candidates = state.generate_all_moves(&game, &params, player);
    let scores = state
        .rate_moves_list(&mut game, &params, &candidates)
        .unwrap()
        .expect("not aborted");
    for (mv, expected) in candidates.iter().zip(scores) {
        assert_eq!(state.rate_move(&mut game, &params, *mv).unwrap(), expected);
    }
}

#[test]
fn test_random_move_is_legal_and_reproducible() {
    let params = movement_params(MovementStrategy::Random);
    let mut picks = Vec::new();
    for _ in 0..2 {
        let mut game = movement_game();
        let mut state = BotState::new();
        let mut rng = make_rng(RngKind::Std, Some(2024));
        let mv = chosen(state.compute_move(&mut game, &params, &mut *rng).unwrap());
        let penguin = mv.penguin.unwrap();
        assert!(game.validate_movement(penguin, mv.target).is_ok());
        picks.push(mv);
    }
    assert_eq!(picks[0], picks[1]);
}

#[test]
fn test_bot_refuses_the_wrong_phase() {
    let mut game = movement_game();
    let mut state = BotState::new();
    let mut rng = make_rng(RngKind::Std, Some(1));
    let result = state.compute_placement(&mut game, &BotParameters::default(), &mut *rng);
    assert!(result.is_err());
    assert!(!state.status().is_busy());
}
