// Penguins bot: candidate generation, rating and selection
//
// The bot works directly on the game it is asked to play. Rating a
// candidate applies it through the regular rule functions, measures the
// result and takes it back, so after every rating pass the game is exactly
// what it was before.

use log::{debug, info, trace};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::board::{PlayerId, Tile};
use crate::flood_fill::{quick_junction_check, FloodFill, JunctionCheck};
use crate::game::{Game, GameError, GamePhase};
use crate::movement::MovementError;
use crate::rng::RandomSource;
use crate::types::{Coords, Direction};

/// How the bot picks a tile during the placement phase
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// Rate the surroundings and the reachable fish of every tile
    Smart,
    /// Uniformly random legal tile
    Random,
    /// First legal tile in row-major order
    FirstPossible,
    /// Tile with the most fish within the scan area
    MostFish,
}

/// How the bot picks a move during the movement phase
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MovementStrategy {
    /// Rate every move with lookahead and flood fills
    Smart,
    /// Uniformly random legal move
    Random,
    /// First legal move in generation order
    FirstPossible,
}

/// Constants of the rating functions
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RatingWeights {
    // Placement: every tile of the scan area, divided by `distance^2 + 1`
    pub scan_fish_tile: i32,
    pub scan_own_penguin: i32,
    pub scan_enemy_penguin: i32,
    pub scan_water: i32,
    pub scan_out_of_bounds: i32,
    pub scan_distance_multiplier: i32,
    // Placement: per blocked side and per reachable fish
    pub placement_obstructed_side: i32,
    pub placement_reachable_fish: i32,

    // Movement: `numerator / distance + offset` prefers short slides
    pub move_distance_numerator: i32,
    pub move_distance_offset: i32,
    pub move_target_fish_squared: i32,
    // Movement: orthogonal neighbors of the landing tile
    pub move_neighbor_own_penguin: i32,
    pub move_neighbor_enemy_penguin: i32,
    pub move_neighbor_blocked: i32,
    pub move_reachable_fish: i32,
    /// Added when a lookahead finds the moved penguin with nowhere to go
    pub move_stranded_penguin: i32,
    /// The best follow-up score is divided by this before it is added
    pub lookahead_divisor: i32,
}

impl Default for RatingWeights {
    fn default() -> Self {
        RatingWeights {
            scan_fish_tile: 10,
            scan_own_penguin: -500,
            scan_enemy_penguin: -600,
            scan_water: -40,
            scan_out_of_bounds: 10,
            scan_distance_multiplier: 4,
            placement_obstructed_side: -1000,
            placement_reachable_fish: 2,
            move_distance_numerator: 100,
            move_distance_offset: -10,
            move_target_fish_squared: 10,
            move_neighbor_own_penguin: -500,
            move_neighbor_enemy_penguin: 500,
            move_neighbor_blocked: -100,
            move_reachable_fish: 5,
            move_stranded_penguin: -1000,
            lookahead_divisor: 2,
        }
    }
}

/// Bot configuration, fixed for the duration of a computation
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BotParameters {
    pub placement_strategy: PlacementStrategy,
    /// Half-size of the square around a candidate tile that placement rating looks at
    pub placement_scan_area: i32,
    pub movement_strategy: MovementStrategy,
    /// Longest slide the bot considers, must be positive
    pub max_move_length: u32,
    /// Follow-up moves of the same penguin looked at by smart movement, zero disables lookahead
    pub recursion_limit: u32,
    /// Deepest lookahead level at which flood fills are run
    pub junction_check_recursion_limit: u32,
    #[serde(default)]
    pub weights: RatingWeights,
}

impl Default for BotParameters {
    fn default() -> Self {
        BotParameters {
            placement_strategy: PlacementStrategy::Smart,
            placement_scan_area: 6,
            movement_strategy: MovementStrategy::Smart,
            max_move_length: 32,
            recursion_limit: 2,
            junction_check_recursion_limit: 1,
            weights: RatingWeights::default(),
        }
    }
}

/// The default parameters, explicit so callers never rely on hidden state
pub fn init_bot_parameters() -> BotParameters {
    BotParameters::default()
}

/// An action chosen or considered by the bot
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotMove {
    /// The penguin to move, `None` for a placement
    pub penguin: Option<Coords>,
    pub target: Coords,
    /// Rating of the action, zero for strategies that do not rate
    pub score: i32,
}

impl BotMove {
    pub fn placement(target: Coords) -> Self {
        BotMove {
            penguin: None,
            target,
            score: 0,
        }
    }

    pub fn movement(penguin: Coords, target: Coords) -> Self {
        BotMove {
            penguin: Some(penguin),
            target,
            score: 0,
        }
    }
}

/// How a computation ended, none of these are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotOutcome {
    Chosen(BotMove),
    /// The player has nothing to do in this phase
    NoLegalAction,
    /// The computation was aborted before it could pick anything
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSubstate {
    Placement,
    Movement,
}

/// Lifecycle of the bot: `Idle -> Entered -> Computing -> ResultReady -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotStatus {
    #[default]
    Idle,
    Entered(BotSubstate),
    Computing(BotSubstate),
    /// The result has been handed out and the bot can take a new request
    ResultReady(BotSubstate),
}

impl BotStatus {
    /// Whether a request is pending or running
    pub fn is_busy(&self) -> bool {
        matches!(self, BotStatus::Entered(_) | BotStatus::Computing(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BotError {
    #[error("the bot is busy ({0:?})")]
    Busy(BotStatus),
    #[error("the game can't be played by the bot: {0}")]
    Game(#[from] GameError),
}

/// Control block shared between the computation and whoever started it
#[derive(Debug, Default)]
pub struct BotControl {
    status: Mutex<BotStatus>,
    abort: AtomicBool,
}

impl BotControl {
    pub fn new() -> Self {
        BotControl::default()
    }

    pub fn status(&self) -> BotStatus {
        *self.status.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.status().is_busy()
    }

    /// Requests the running computation to stop, can be called any number of times
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Reserves the bot for a request, refused unless the bot is free
    pub fn enter(&self, substate: BotSubstate) -> Result<(), BotError> {
        let mut status = self.status.lock();
        if status.is_busy() {
            return Err(BotError::Busy(*status));
        }
        self.abort.store(false, Ordering::SeqCst);
        *status = BotStatus::Entered(substate);
        Ok(())
    }

    /// Moves to Computing; an abort requested after `enter` is kept
    fn begin(&self, substate: BotSubstate) -> Result<(), BotError> {
        let mut status = self.status.lock();
        match *status {
            BotStatus::Entered(entered) if entered == substate => {}
            BotStatus::Idle | BotStatus::ResultReady(_) => {
                self.abort.store(false, Ordering::SeqCst);
            }
            other => return Err(BotError::Busy(other)),
        }
        *status = BotStatus::Computing(substate);
        Ok(())
    }

    fn complete(&self, substate: BotSubstate, outcome: &Result<BotOutcome, BotError>) {
        let mut status = self.status.lock();
        *status = match outcome {
            Ok(BotOutcome::Chosen(_)) | Ok(BotOutcome::NoLegalAction) => {
                BotStatus::ResultReady(substate)
            }
            _ => BotStatus::Idle,
        };
    }

    /// Drops a computation that ended without an outcome, returns true if it
    /// was still marked as running
    pub(crate) fn abandon(&self) -> bool {
        let mut status = self.status.lock();
        if status.is_busy() {
            *status = BotStatus::Idle;
            return true;
        }
        false
    }

    /// Returns the bot to Idle once its result has been handed out
    ///
    /// Only a ready result is released, so a request entered in the meantime
    /// is never clobbered.
    pub fn release(&self) {
        let mut status = self.status.lock();
        if let BotStatus::ResultReady(_) = *status {
            *status = BotStatus::Idle;
        }
    }
}

/// Working state of the bot: the shared control block and flood fill scratch space
#[derive(Debug)]
pub struct BotState {
    control: Arc<BotControl>,
    fill: FloodFill,
}

impl Default for BotState {
    fn default() -> Self {
        BotState::new()
    }
}

impl BotState {
    pub fn new() -> Self {
        BotState::with_control(Arc::new(BotControl::new()))
    }

    pub fn with_control(control: Arc<BotControl>) -> Self {
        BotState {
            control,
            fill: FloodFill::new(),
        }
    }

    pub fn control(&self) -> &Arc<BotControl> {
        &self.control
    }

    pub fn status(&self) -> BotStatus {
        self.control.status()
    }

    /// Reserves the bot for the given kind of computation
    pub fn enter_substate(&self, substate: BotSubstate) -> Result<(), BotError> {
        self.control.enter(substate)
    }

    /// Picks a tile for the current player's next penguin
    pub fn compute_placement(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        rng: &mut dyn RandomSource,
    ) -> Result<BotOutcome, BotError> {
        self.control.begin(BotSubstate::Placement)?;
        let outcome = self.compute_placement_inner(game, params, rng);
        self.control.complete(BotSubstate::Placement, &outcome);
        outcome
    }

    /// Picks a move for the current player
    pub fn compute_move(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        rng: &mut dyn RandomSource,
    ) -> Result<BotOutcome, BotError> {
        self.control.begin(BotSubstate::Movement)?;
        let outcome = self.compute_move_inner(game, params, rng);
        self.control.complete(BotSubstate::Movement, &outcome);
        outcome
    }

    fn check_game(game: &Game, phase: GamePhase) -> Result<usize, GameError> {
        if game.phase() != phase {
            return Err(GameError::WrongPhase {
                expected: phase,
                actual: game.phase(),
            });
        }
        if !game.is_log_at_head() {
            return Err(GameError::LogRewound {
                current: game.log_current(),
                length: game.log_entries().len(),
            });
        }
        game.current_player_index().ok_or(GameError::NoCurrentPlayer)
    }

    fn compute_placement_inner(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        rng: &mut dyn RandomSource,
    ) -> Result<BotOutcome, BotError> {
        let player = Self::check_game(game, GamePhase::Placement)?;
        let candidates = self.generate_all_placements(game);
        info!(
            "Player {} placement: {} candidate tiles, strategy {:?}",
            player,
            candidates.len(),
            params.placement_strategy
        );
        if candidates.is_empty() {
            return Ok(BotOutcome::NoLegalAction);
        }

        let picked = match params.placement_strategy {
            PlacementStrategy::FirstPossible | PlacementStrategy::Random => {
                if self.control.is_aborted() {
                    return Ok(BotOutcome::Cancelled);
                }
                let idx = match params.placement_strategy {
                    PlacementStrategy::Random => rng.next_index(candidates.len()),
                    _ => 0,
                };
                BotMove::placement(candidates[idx])
            }
            PlacementStrategy::Smart | PlacementStrategy::MostFish => {
                let scores = match self.rate_placements_list(game, params, &candidates)? {
                    Some(scores) => scores,
                    None => return Ok(BotOutcome::Cancelled),
                };
                let best = pick_best(&scores);
                BotMove {
                    score: scores[best],
                    ..BotMove::placement(candidates[best])
                }
            }
        };

        info!("Picked placement {} (score {})", picked.target, picked.score);
        Ok(BotOutcome::Chosen(picked))
    }

    fn compute_move_inner(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        rng: &mut dyn RandomSource,
    ) -> Result<BotOutcome, BotError> {
        let player = Self::check_game(game, GamePhase::Movement)?;
        let candidates = self.generate_all_moves(game, params, player);
        info!(
            "Player {} movement: {} candidate moves, strategy {:?}",
            player,
            candidates.len(),
            params.movement_strategy
        );
        if candidates.is_empty() {
            return Ok(BotOutcome::NoLegalAction);
        }

        let picked = match params.movement_strategy {
            MovementStrategy::FirstPossible | MovementStrategy::Random => {
                if self.control.is_aborted() {
                    return Ok(BotOutcome::Cancelled);
                }
                let idx = match params.movement_strategy {
                    MovementStrategy::Random => rng.next_index(candidates.len()),
                    _ => 0,
                };
                candidates[idx]
            }
            MovementStrategy::Smart => {
                let scores = match self.rate_moves_list(game, params, &candidates)? {
                    Some(scores) => scores,
                    None => return Ok(BotOutcome::Cancelled),
                };
                let best = pick_best(&scores);
                BotMove {
                    score: scores[best],
                    ..candidates[best]
                }
            }
        };

        if let Some(penguin) = picked.penguin {
            info!("Picked move {} -> {} (score {})", penguin, picked.target, picked.score);
        }
        Ok(BotOutcome::Chosen(picked))
    }

    /// Every tile the current player may place a penguin on, in row-major order
    pub fn generate_all_placements(&self, game: &Game) -> Vec<Coords> {
        game.board()
            .coords()
            .filter(|c| game.validate_placement(*c).is_ok())
            .collect()
    }

    /// Every move of every penguin of player `idx`, slides capped at `max_move_length`
    ///
    /// Penguins are visited in the player's order, directions as
    /// right, down, left, up and destinations nearest first.
    pub fn generate_all_moves(&self, game: &Game, params: &BotParameters, idx: usize) -> Vec<BotMove> {
        let mut moves = Vec::new();
        if let Some(player) = game.players().get(idx) {
            for penguin in &player.penguins {
                moves.extend(Self::penguin_moves(game, params, *penguin));
            }
        }
        moves
    }

    fn penguin_moves(game: &Game, params: &BotParameters, penguin: Coords) -> Vec<BotMove> {
        let steps = game.calculate_penguin_possible_moves(penguin);
        let mut moves = Vec::with_capacity(steps.total() as usize);
        for dir in Direction::all() {
            let delta = dir.delta();
            let length = steps.get(dir).min(params.max_move_length) as i32;
            for n in 1..=length {
                let target = Coords::new(penguin.x + delta.x * n, penguin.y + delta.y * n);
                moves.push(BotMove::movement(penguin, target));
            }
        }
        moves
    }

    /// Scores all candidate tiles, `None` if the computation was aborted
    pub fn rate_placements_list(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        candidates: &[Coords],
    ) -> Result<Option<Vec<i32>>, BotError> {
        let mut scores = Vec::with_capacity(candidates.len());
        for target in candidates {
            if self.control.is_aborted() {
                debug!("Placement rating aborted after {} candidates", scores.len());
                return Ok(None);
            }
            let score = self.rate_placement(game, params, *target)?;
            trace!("Placement {} = {}", target, score);
            scores.push(score);
        }
        Ok(Some(scores))
    }

    /// Rates a single placement candidate for the current player
    pub fn rate_placement(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        target: Coords,
    ) -> Result<i32, BotError> {
        let board = game.board();
        // Bounded by the board so the squared distances stay small
        let area = params.placement_scan_area.clamp(0, board.width().max(board.height()));

        if params.placement_strategy == PlacementStrategy::MostFish {
            let mut total = 0;
            for y in (target.y - area)..=(target.y + area) {
                for x in (target.x - area)..=(target.x + area) {
                    total += board.tile(Coords::new(x, y)).fish() as i32;
                }
            }
            return Ok(total);
        }

        let w = &params.weights;
        let me = game.current_player().map(|p| p.id);
        let mut score = 0;
        for y in (target.y - area)..=(target.y + area) {
            for x in (target.x - area)..=(target.x + area) {
                let coords = Coords::new(x, y);
                if coords == target {
                    continue;
                }
                let tile_score = match board.get(coords) {
                    None => w.scan_out_of_bounds,
                    Some(Tile::Fish(n)) => w.scan_fish_tile * i32::from(n),
                    Some(Tile::Penguin(id)) if Some(id) == me => w.scan_own_penguin,
                    Some(Tile::Penguin(_)) => w.scan_enemy_penguin,
                    Some(Tile::Water) => w.scan_water,
                };
                let d = target.distance(coords);
                score += tile_score * w.scan_distance_multiplier / (d * d + 1);
            }
        }
        score += w.placement_obstructed_side * game.count_obstructed_directions(target) as i32;

        game.place_penguin(target)?;
        let reachable = self.fill.count_reachable_fish(game.board(), target);
        game.undo_place_penguin()?;
        score += w.placement_reachable_fish * reachable as i32;

        Ok(score)
    }

    /// Scores all candidate moves, `None` if the computation was aborted
    pub fn rate_moves_list(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        moves: &[BotMove],
    ) -> Result<Option<Vec<i32>>, BotError> {
        let mut scores = Vec::with_capacity(moves.len());
        let mut base = None;
        for mv in moves {
            if self.control.is_aborted() {
                debug!("Move rating aborted after {} candidates", scores.len());
                return Ok(None);
            }
            let score = self.rate_move_at(game, params, *mv, 0, &mut base)?;
            if let Some(penguin) = mv.penguin {
                trace!("Move {} -> {} = {}", penguin, mv.target, score);
            }
            scores.push(score);
        }
        Ok(Some(scores))
    }

    /// Rates a single move of the current player, including lookahead
    pub fn rate_move(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        mv: BotMove,
    ) -> Result<i32, BotError> {
        self.rate_move_at(game, params, mv, 0, &mut None)
    }

    /// `base` caches the fish reachable from a penguin before it moves. While
    /// the tile it leaves is not a junction, the region after the move is the
    /// same minus the fish on the landing tile, so no new fill is needed.
    fn rate_move_at(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        mv: BotMove,
        depth: u32,
        base: &mut Option<(Coords, u32)>,
    ) -> Result<i32, BotError> {
        let penguin = mv
            .penguin
            .ok_or(GameError::IllegalMove(MovementError::NotAPenguin(mv.target)))?;
        let target = mv.target;
        let w = &params.weights;
        let me = game.current_player().map(|p| p.id);

        let mut score = w.move_distance_numerator / penguin.distance(target).max(1)
            + w.move_distance_offset;
        let fish = game.tile(target).fish();
        score += w.move_target_fish_squared * (fish * fish) as i32;

        let run_fill = depth <= params.junction_check_recursion_limit;
        let start_is_junction = quick_junction_check(game.board(), penguin) == JunctionCheck::Junction;
        let cached = match *base {
            Some((coords, total)) if coords == penguin => Some(total),
            _ => None,
        };
        let base_fish = if run_fill && !start_is_junction {
            let total = match cached {
                Some(total) => total,
                None => self.fill.count_reachable_fish(game.board(), penguin),
            };
            *base = Some((penguin, total));
            Some(total)
        } else {
            None
        };

        game.move_penguin(penguin, target)?;
        score += Self::rate_neighbors(game, w, me, target);
        let after = self.rate_after_move(game, params, target, depth, run_fill, base_fish, fish);
        game.undo_move_penguin()?;

        Ok(score + after?)
    }

    /// Mobility around a penguin that has just landed on `target`. Adjacent
    /// penguins are rated by owner, every other obstructed side (water, the
    /// tile just left, the board edge) as blocked.
    fn rate_neighbors(game: &Game, w: &RatingWeights, me: Option<PlayerId>, target: Coords) -> i32 {
        let mut penguins = 0;
        let mut score = 0;
        for dir in Direction::all() {
            if let Some(Tile::Penguin(id)) = game.board().get(dir.apply(&target)) {
                penguins += 1;
                score += if Some(id) == me {
                    w.move_neighbor_own_penguin
                } else {
                    w.move_neighbor_enemy_penguin
                };
            }
        }
        let blocked = game.count_obstructed_directions(target) - penguins;
        score + w.move_neighbor_blocked * blocked as i32
    }

    /// The part of a move's rating that needs the move applied
    #[allow(clippy::too_many_arguments)]
    fn rate_after_move(
        &mut self,
        game: &mut Game,
        params: &BotParameters,
        target: Coords,
        depth: u32,
        run_fill: bool,
        base_fish: Option<u32>,
        landed_fish: u32,
    ) -> Result<i32, BotError> {
        let w = &params.weights;
        let mut score = 0;

        if run_fill {
            let reachable = match base_fish {
                Some(total) => total - landed_fish,
                None => self.fill.count_reachable_fish(game.board(), target),
            };
            score += w.move_reachable_fish * reachable as i32;
        }

        if depth < params.recursion_limit {
            let follow_ups = Self::penguin_moves(game, params, target);
            if follow_ups.is_empty() {
                score += w.move_stranded_penguin;
            } else {
                let mut follow_base = None;
                let mut best = i32::MIN;
                for follow_up in follow_ups {
                    let s = self.rate_move_at(game, params, follow_up, depth + 1, &mut follow_base)?;
                    best = best.max(s);
                }
                score += best / w.lookahead_divisor.max(1);
            }
        }

        Ok(score)
    }
}

/// Index of the highest score, the first one wins ties
fn pick_best(scores: &[i32]) -> usize {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn movement_game(rows: &[&str], players: usize, penguins: usize) -> Game {
        let mut game = Game::from_layout(rows, players, penguins).unwrap();
        game.movement_begin().unwrap();
        game.movement_switch_player();
        game
    }

    fn placement_game(rows: &[&str], players: usize, penguins: usize) -> Game {
        let mut game = Game::from_layout(rows, players, penguins).unwrap();
        game.advance_state().unwrap();
        game
    }

    #[test]
    fn test_move_neighbors_count_board_edges_as_blocked() {
        let mut game = movement_game(&["A11", "1B1"], 2, 1);
        let w = RatingWeights::default();
        let me = game.current_player().map(|p| p.id);
        assert_eq!(me, Some(1));

        // Corner landing: two edges blocked, both floes open
        game.move_penguin(Coords::new(0, 0), Coords::new(2, 0)).unwrap();
        assert_eq!(
            BotState::rate_neighbors(&game, &w, me, Coords::new(2, 0)),
            2 * w.move_neighbor_blocked
        );
        game.undo_move_penguin().unwrap();

        // Top edge and the vacated tile are blocked, B sits below
        game.move_penguin(Coords::new(0, 0), Coords::new(1, 0)).unwrap();
        assert_eq!(
            BotState::rate_neighbors(&game, &w, me, Coords::new(1, 0)),
            w.move_neighbor_enemy_penguin + 2 * w.move_neighbor_blocked
        );
        game.undo_move_penguin().unwrap();
    }

    #[test]
    fn test_pick_best_prefers_first_of_ties() {
        assert_eq!(pick_best(&[1, 5, 3, 5]), 1);
        assert_eq!(pick_best(&[-7]), 0);
        assert_eq!(pick_best(&[-7, -2, -2]), 1);
    }

    #[test]
    fn test_generate_all_moves_order_and_cap() {
        let game = movement_game(&["A111", "1~~~", "1~~~"], 1, 1);
        let params = BotParameters {
            max_move_length: 2,
            ..BotParameters::default()
        };
        let state = BotState::new();
        let moves = state.generate_all_moves(&game, &params, 0);
        let targets: Vec<Coords> = moves.iter().map(|m| m.target).collect();
        assert_eq!(
            targets,
            vec![
                Coords::new(1, 0),
                Coords::new(2, 0),
                Coords::new(0, 1),
                Coords::new(0, 2)
            ]
        );
        assert!(moves.iter().all(|m| m.penguin == Some(Coords::new(0, 0))));
    }

    #[test]
    fn test_rating_leaves_game_unchanged() {
        let mut game = movement_game(&["A1231", "21~12", "1B321", "33112"], 2, 1);
        let params = BotParameters::default();
        let mut state = BotState::new();
        let before = game.clone();
        let moves = state.generate_all_moves(&game, &params, 0);
        assert!(!moves.is_empty());
        let scores = state.rate_moves_list(&mut game, &params, &moves).unwrap();
        assert_eq!(scores.map(|s| s.len()), Some(moves.len()));
        assert_eq!(game, before);
    }

    #[test]
    fn test_placement_rating_leaves_game_unchanged() {
        let mut game = placement_game(&["1213", "3111", "1~21"], 2, 1);
        let params = BotParameters::default();
        let mut state = BotState::new();
        let before = game.clone();
        let candidates = state.generate_all_placements(&game);
        state.rate_placements_list(&mut game, &params, &candidates).unwrap();
        assert_eq!(game, before);
    }

    #[test]
    fn test_huge_scan_area_is_capped_at_board_size() {
        let mut game = placement_game(&["1213", "3111", "1~21"], 2, 1);
        let mut state = BotState::new();
        let capped = BotParameters {
            placement_scan_area: 4,
            ..BotParameters::default()
        };
        let huge = BotParameters {
            placement_scan_area: i32::MAX,
            ..BotParameters::default()
        };
        let target = Coords::new(1, 1);
        assert_eq!(
            state.rate_placement(&mut game, &huge, target).unwrap(),
            state.rate_placement(&mut game, &capped, target).unwrap()
        );
    }

    #[test]
    fn test_cached_reachable_fish_matches_full_fill() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut fill = FloodFill::new();
        for _ in 0..20 {
            let mut game = Game::new(8, 8, &["A"], 1).unwrap();
            game.generate_board(crate::board::BoardGenerator::Random, &mut rng).unwrap();
            let start = match game.board().tiles().find(|(_, t)| t.is_fish()) {
                Some((c, _)) => c,
                None => continue,
            };
            game.set_tile(start, Tile::Water).unwrap();
            game.setup_penguin(0, start).unwrap();
            game.end_setup().unwrap();
            game.movement_begin().unwrap();
            game.movement_switch_player();

            let base = fill.count_reachable_fish(game.board(), start);
            let junction = quick_junction_check(game.board(), start) == JunctionCheck::Junction;
            let steps = game.calculate_penguin_possible_moves(start);
            for target in steps.destinations(start).collect::<Vec<_>>() {
                let fish = game.tile(target).fish();
                game.move_penguin(start, target).unwrap();
                let full = fill.count_fish(game.board(), target);
                if !junction {
                    assert_eq!(base - fish, full, "move {} -> {}", start, target);
                }
                game.undo_move_penguin().unwrap();
            }
        }
    }

    #[test]
    fn test_enter_substate_rejects_when_busy() {
        let state = BotState::new();
        assert_eq!(state.enter_substate(BotSubstate::Movement), Ok(()));
        assert_eq!(
            state.enter_substate(BotSubstate::Placement),
            Err(BotError::Busy(BotStatus::Entered(BotSubstate::Movement)))
        );
        state.control().release();
        assert_eq!(state.status(), BotStatus::Entered(BotSubstate::Movement));
    }

    #[test]
    fn test_compute_refuses_mismatched_substate() {
        let mut game = movement_game(&["A1"], 1, 1);
        let mut state = BotState::new();
        let mut rng = StdRng::seed_from_u64(0);
        state.enter_substate(BotSubstate::Placement).unwrap();
        let result = state.compute_move(&mut game, &BotParameters::default(), &mut rng);
        assert_eq!(
            result,
            Err(BotError::Busy(BotStatus::Entered(BotSubstate::Placement)))
        );
    }

    #[test]
    fn test_compute_refuses_rewound_game() {
        let mut game = movement_game(&["A11"], 1, 1);
        game.move_penguin(Coords::new(0, 0), Coords::new(1, 0)).unwrap();
        let head = game.log_current();
        game.rewind_to_log_entry(head - 1).unwrap();
        let mut state = BotState::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result = state.compute_move(&mut game, &BotParameters::default(), &mut rng);
        assert!(matches!(result, Err(BotError::Game(GameError::LogRewound { .. }))));
        assert_eq!(state.status(), BotStatus::Idle);
    }

    #[test]
    fn test_abort_before_rating_yields_no_result() {
        let mut game = movement_game(&["A123"], 1, 1);
        let mut state = BotState::new();
        let mut rng = StdRng::seed_from_u64(0);
        state.enter_substate(BotSubstate::Movement).unwrap();
        state.control().abort();
        let before = game.clone();
        let result = state.compute_move(&mut game, &BotParameters::default(), &mut rng);
        assert_eq!(result, Ok(BotOutcome::Cancelled));
        assert_eq!(state.status(), BotStatus::Idle);
        assert_eq!(game, before);
    }

    #[test]
    fn test_locked_out_player_has_no_legal_action() {
        let mut game = movement_game(&["A~1"], 1, 1);
        game.set_current_player(Some(0));
        let mut state = BotState::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result = state.compute_move(&mut game, &BotParameters::default(), &mut rng);
        assert_eq!(result, Ok(BotOutcome::NoLegalAction));
        assert_eq!(state.status(), BotStatus::ResultReady(BotSubstate::Movement));
        assert!(!state.control().is_busy());
        state.control().release();
        assert_eq!(state.status(), BotStatus::Idle);
    }
}
