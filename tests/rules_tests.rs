//! Rules Engine Tests
//!
//! Plays seeded random games through the public rule functions and checks
//! the properties that have to hold after every single action: fish are
//! conserved, board and penguin lists agree, undo is exact and the move
//! generator agrees with the validator.

use penguins::board::{BoardGenerator, Tile};
use penguins::game::{Game, GameError, GamePhase, Player};
use penguins::movement::MovementError;
use penguins::rng::{make_rng, RandomSource, RngKind};
use penguins::types::Coords;

fn random_game(seed: u64, width: i32, height: i32, players: usize, penguins: usize) -> Game {
    let names: Vec<String> = (0..players).map(|i| format!("P{}", i + 1)).collect();
    let mut game = Game::new(width, height, &names, penguins).unwrap();
    let mut rng = make_rng(RngKind::Std, Some(seed));
    game.generate_board(BoardGenerator::Random, &mut *rng).unwrap();
    game.advance_state().unwrap();
    game
}

/// Every legal move of the current player
fn legal_moves(game: &Game) -> Vec<(Coords, Coords)> {
    let idx = game.current_player_index().expect("a player is on turn");
    let mut moves = Vec::new();
    for penguin in &game.player(idx).unwrap().penguins {
        let steps = game.calculate_penguin_possible_moves(*penguin);
        moves.extend(steps.destinations(*penguin).map(|target| (*penguin, target)));
    }
    moves
}

/// Plays one random legal action and advances the game, false once the game is over
fn play_random_action(game: &mut Game, rng: &mut dyn RandomSource) -> bool {
    match game.phase() {
        GamePhase::Placement => {
            let candidates: Vec<Coords> = game
                .board()
                .coords()
                .filter(|c| game.validate_placement(*c).is_ok())
                .collect();
            assert!(!candidates.is_empty(), "placement turn without a free tile");
            let target = candidates[rng.next_index(candidates.len())];
            game.place_penguin(target).unwrap();
        }
        GamePhase::Movement => {
            let moves = legal_moves(game);
            assert!(!moves.is_empty(), "movement turn for a locked out player");
            let (penguin, target) = moves[rng.next_index(moves.len())];
            game.move_penguin(penguin, target).unwrap();
        }
        GamePhase::End => return false,
        other => panic!("unexpected phase {:?}", other),
    }
    game.advance_state().unwrap();
    true
}

fn assert_occupancy_consistent(game: &Game) {
    let mut on_board = 0;
    for (coords, tile) in game.board().tiles() {
        if let Tile::Penguin(id) = tile {
            on_board += 1;
            let owner = game.find_player_by_id(id).expect("penguin has an owner");
            let listed = game.players()[owner]
                .penguins
                .iter()
                .filter(|p| **p == coords)
                .count();
            assert_eq!(listed, 1, "penguin at {} listed {} times", coords, listed);
        }
    }
    let listed: usize = game.players().iter().map(|p| p.penguins.len()).sum();
    assert_eq!(on_board, listed, "board and penguin lists disagree");
}

#[test]
fn test_fish_are_conserved_over_random_games() {
    for seed in 0..12 {
        let mut game = random_game(seed, 8, 6, 2 + (seed as usize % 3), 2);
        let mut rng = make_rng(RngKind::Std, Some(seed + 100));
        let total = game.total_fish();
        let mut actions = 0;
        while play_random_action(&mut game, &mut *rng) {
            actions += 1;
            assert_eq!(game.total_fish(), total, "seed {} after {} actions", seed, actions);
            assert_occupancy_consistent(&game);
        }
        assert_eq!(game.phase(), GamePhase::End);
        assert_eq!(game.current_player_index(), None);
    }
}

#[test]
fn test_points_equal_collected_fish() {
    let mut game = random_game(7, 9, 9, 3, 3);
    let mut rng = make_rng(RngKind::Small, Some(8));
    let board_fish = game.board().total_fish();
    while play_random_action(&mut game, &mut *rng) {}
    let points: u32 = game.players().iter().map(|p| p.points).sum();
    assert_eq!(points + game.board().total_fish(), board_fish);
    for player in game.players() {
        assert!(player.moves_count as usize >= player.penguins.len());
    }
}

#[test]
fn test_move_then_undo_restores_game_exactly() {
    for seed in 0..6 {
        let mut game = random_game(seed, 7, 7, 2, 2);
        let mut rng = make_rng(RngKind::Std, Some(seed));
        while game.phase() == GamePhase::Placement {
            play_random_action(&mut game, &mut *rng);
        }
        while game.phase() == GamePhase::Movement {
            for (penguin, target) in legal_moves(&game) {
                let before = game.clone();
                game.move_penguin(penguin, target).unwrap();
                assert_ne!(game, before);
                game.undo_move_penguin().unwrap();
                assert_eq!(game, before, "undo of {} -> {} (seed {})", penguin, target, seed);
            }
            play_random_action(&mut game, &mut *rng);
        }
    }
}

#[test]
fn test_possible_moves_match_validator() {
    for seed in 0..6 {
        let mut game = random_game(seed, 6, 5, 2, 3);
        let mut rng = make_rng(RngKind::Std, Some(seed + 50));
        while game.phase() == GamePhase::Placement {
            play_random_action(&mut game, &mut *rng);
        }
        while game.phase() == GamePhase::Movement {
            let idx = game.current_player_index().unwrap();
            for penguin in game.player(idx).unwrap().penguins.clone() {
                let steps = game.calculate_penguin_possible_moves(penguin);
                let listed: Vec<Coords> = steps.destinations(penguin).collect();
                assert_eq!(listed.len() as u32, steps.total());
                for y in -1..=game.board().height() {
                    for x in -1..=game.board().width() {
                        let target = Coords::new(x, y);
                        assert_eq!(
                            game.validate_movement(penguin, target).is_ok(),
                            listed.contains(&target),
                            "{} -> {} (seed {})",
                            penguin,
                            target,
                            seed
                        );
                    }
                }
            }
            play_random_action(&mut game, &mut *rng);
        }
    }
}

#[test]
fn test_rewind_reproduces_every_earlier_state() {
    let mut game = random_game(3, 7, 6, 3, 2);
    let mut rng = make_rng(RngKind::Std, Some(33));

    let snapshot = |game: &Game| -> (Vec<Tile>, Vec<Player>, GamePhase, Option<usize>) {
        (
            game.board().tiles().map(|(_, t)| t).collect(),
            game.players().to_vec(),
            game.phase(),
            game.current_player_index(),
        )
    };

    let mut history = vec![(game.log_current(), snapshot(&game))];
    while play_random_action(&mut game, &mut *rng) {
        history.push((game.log_current(), snapshot(&game)));
    }
    let finished = game.clone();

    for (index, expected) in history.iter().rev() {
        game.rewind_to_log_entry(*index).unwrap();
        assert_eq!(&snapshot(&game), expected, "state at log entry {}", index);
    }
    let (last, _) = history[history.len() - 1];
    game.rewind_to_log_entry(last).unwrap();
    assert_eq!(game, finished);

    let beyond = game.log_entries().len() + 1;
    assert_eq!(game.rewind_to_log_entry(beyond), Err(GameError::NoSuchLogEntry(beyond)));
}

#[test]
fn test_diagonal_move_is_reported_as_diagonal() {
    let mut game = Game::from_layout(&["A3", "24"], 1, 1).unwrap();
    game.advance_state().unwrap();
    assert_eq!(game.phase(), GamePhase::Movement);
    assert_eq!(
        game.validate_movement(Coords::new(0, 0), Coords::new(1, 1)),
        Err(MovementError::Diagonal)
    );
    let before = game.clone();
    assert!(game.move_penguin(Coords::new(0, 0), Coords::new(1, 1)).is_err());
    assert_eq!(game, before);
}

#[test]
fn test_surrounded_penguin_has_no_moves() {
    let game = Game::from_layout(&["~~~", "~A~", "~~~"], 1, 1).unwrap();
    let steps = game.calculate_penguin_possible_moves(Coords::new(1, 1));
    assert!(steps.is_empty());
    assert_eq!(steps.destinations(Coords::new(1, 1)).count(), 0);
    assert!(!game.any_valid_player_move_exists(0));

    // With nobody able to move, the movement phase ends the game right away
    let mut game = game;
    game.advance_state().unwrap();
    assert_eq!(game.phase(), GamePhase::End);
}
