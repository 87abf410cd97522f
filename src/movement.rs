// Movement phase rules
//
// A penguin slides in a straight line along a row or a column over
// unoccupied floes and lands on one of them, collecting its fish. The
// floe it left melts into water.

use thiserror::Error;

use crate::board::Tile;
use crate::game::{Game, GameError, GameLogEntry, GamePhase};
use crate::types::{Coords, Direction};

/// Reasons a move is refused, the first applicable one wins
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MovementError {
    #[error("{0} is outside the board")]
    OutOfBounds(Coords),
    #[error("the penguin is already standing there")]
    CurrentLocation,
    #[error("penguins can't move diagonally")]
    Diagonal,
    #[error("there is no penguin at {0}")]
    NotAPenguin(Coords),
    #[error("the penguin at {0} belongs to another player")]
    NotYourPenguin(Coords),
    #[error("{0} is water, penguins can't land there")]
    OntoEmptyTile(Coords),
    #[error("{0} is occupied by another penguin")]
    OntoPenguin(Coords),
    #[error("the path crosses water at {0}")]
    OverEmptyTile(Coords),
    #[error("the path is blocked by a penguin at {0}")]
    OverPenguin(Coords),
    #[error("the penguin at {0} has nowhere to go")]
    PenguinBlocked(Coords),
}

/// How far a penguin can slide in each direction before hitting an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PossibleSteps {
    steps: [u32; 4],
}

impl PossibleSteps {
    fn slot(dir: Direction) -> usize {
        match dir {
            Direction::Right => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Up => 3,
        }
    }

    pub fn get(&self, dir: Direction) -> u32 {
        self.steps[Self::slot(dir)]
    }

    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(|&s| s == 0)
    }

    /// Number of distinct legal destinations
    pub fn total(&self) -> u32 {
        self.steps.iter().sum()
    }

    /// Every reachable destination from `start`, direction by direction, nearest first
    pub fn destinations(self, start: Coords) -> impl Iterator<Item = Coords> {
        Direction::all().into_iter().flat_map(move |dir| {
            let delta = dir.delta();
            (1..=self.get(dir) as i32)
                .map(move |n| Coords::new(start.x + delta.x * n, start.y + delta.y * n))
        })
    }
}

impl Game {
    pub fn movement_begin(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::SetupDone)?;
        self.set_phase(GamePhase::Movement);
        self.set_current_player(None);
        Ok(())
    }

    pub fn movement_end(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Movement)?;
        self.set_phase(GamePhase::SetupDone);
        Ok(())
    }

    /// Hands the turn to the next player who can still move, skipping locked-out ones
    ///
    /// # Returns
    /// The index of the new current player, `None` when nobody can move
    pub fn movement_switch_player(&mut self) -> Option<usize> {
        let count = self.players_count();
        let start = self.current_player_index().map_or(0, |i| i + 1);
        let next = (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&idx| self.any_valid_player_move_exists(idx))?;
        self.set_current_player(Some(next));
        Some(next)
    }

    /// Whether any penguin of player `idx` has at least one legal move
    pub fn any_valid_player_move_exists(&self, idx: usize) -> bool {
        self.players().get(idx).map_or(false, |player| {
            player
                .penguins
                .iter()
                .any(|p| !self.calculate_penguin_possible_moves(*p).is_empty())
        })
    }

    /// Checks that `start` holds a movable penguin of the current player
    pub fn validate_movement_start(&self, start: Coords) -> Result<(), MovementError> {
        let tile = self
            .board()
            .get(start)
            .ok_or(MovementError::OutOfBounds(start))?;
        self.check_penguin_owner(start, tile)?;
        if self.calculate_penguin_possible_moves(start).is_empty() {
            return Err(MovementError::PenguinBlocked(start));
        }
        Ok(())
    }

    fn check_penguin_owner(&self, start: Coords, tile: Tile) -> Result<(), MovementError> {
        match tile.player_id() {
            None => Err(MovementError::NotAPenguin(start)),
            Some(id) if Some(id) != self.current_player().map(|p| p.id) => {
                Err(MovementError::NotYourPenguin(start))
            }
            Some(_) => Ok(()),
        }
    }

    /// Classifies a proposed move of the current player
    pub fn validate_movement(&self, start: Coords, target: Coords) -> Result<(), MovementError> {
        if !self.board().is_in_bounds(target) {
            return Err(MovementError::OutOfBounds(target));
        }
        if start == target {
            return Err(MovementError::CurrentLocation);
        }
        let dir = Direction::between(start, target).ok_or(MovementError::Diagonal)?;
        self.check_penguin_owner(start, self.tile(start))?;
        match self.tile(target) {
            Tile::Water => return Err(MovementError::OntoEmptyTile(target)),
            Tile::Penguin(_) => return Err(MovementError::OntoPenguin(target)),
            Tile::Fish(_) => {}
        }

        let mut coords = dir.apply(&start);
        while coords != target {
            match self.tile(coords) {
                Tile::Water => return Err(MovementError::OverEmptyTile(coords)),
                Tile::Penguin(_) => return Err(MovementError::OverPenguin(coords)),
                Tile::Fish(_) => {}
            }
            coords = dir.apply(&coords);
        }
        Ok(())
    }

    /// Scans every direction from `start` up to the first obstacle
    pub fn calculate_penguin_possible_moves(&self, start: Coords) -> PossibleSteps {
        let mut result = PossibleSteps::default();
        for dir in Direction::all() {
            let mut coords = dir.apply(&start);
            let mut steps = 0;
            while self.board().is_fish_at(coords) {
                steps += 1;
                coords = dir.apply(&coords);
            }
            result.steps[PossibleSteps::slot(dir)] = steps;
        }
        result
    }

    /// Number of directions blocked right next to `coords`
    pub fn count_obstructed_directions(&self, coords: Coords) -> u32 {
        Direction::all()
            .iter()
            .filter(|dir| !self.board().is_fish_at(dir.apply(&coords)))
            .count() as u32
    }

    /// Moves a penguin of the current player, collecting the fish it lands on
    pub fn move_penguin(&mut self, start: Coords, target: Coords) -> Result<(), GameError> {
        self.require_phase(GamePhase::Movement)?;
        let idx = self.require_current_player()?;
        self.validate_movement(start, target)?;
        let undo_tile = self.apply_movement(idx, start, target)?;
        self.push_log_entry(GameLogEntry::Movement {
            player: idx,
            penguin: start,
            target,
            undo_tile,
        });
        Ok(())
    }

    /// Takes back the most recent move, restoring tiles, points and penguin position
    pub fn undo_move_penguin(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Movement)?;
        match self.last_log_entry() {
            Some(GameLogEntry::Movement { .. }) => {}
            _ => return Err(GameError::NothingToUndo("movement")),
        }
        if let GameLogEntry::Movement {
            player,
            penguin,
            target,
            undo_tile,
        } = self.pop_log_entry()?
        {
            self.revert_movement(player, penguin, target, undo_tile)?;
        }
        Ok(())
    }

    /// Performs a move without validating or logging it, returns the replaced tile
    pub(crate) fn apply_movement(
        &mut self,
        idx: usize,
        start: Coords,
        target: Coords,
    ) -> Result<Tile, GameError> {
        let undo_tile = self.tile(target);
        let player = self.player_mut(idx)?;
        let penguin = player
            .penguins
            .iter_mut()
            .find(|p| **p == start)
            .ok_or(GameError::IllegalMove(MovementError::NotAPenguin(start)))?;
        *penguin = target;
        player.points += undo_tile.fish();
        player.moves_count += 1;
        let id = player.id;
        let board = self.board_mut();
        board.set(target, Tile::Penguin(id));
        board.set(start, Tile::Water);
        Ok(undo_tile)
    }

    pub(crate) fn revert_movement(
        &mut self,
        idx: usize,
        start: Coords,
        target: Coords,
        undo_tile: Tile,
    ) -> Result<(), GameError> {
        let player = self.player_mut(idx)?;
        let penguin = player
            .penguins
            .iter_mut()
            .find(|p| **p == target)
            .ok_or(GameError::NothingToUndo("movement"))?;
        *penguin = start;
        player.points -= undo_tile.fish();
        player.moves_count -= 1;
        let id = player.id;
        let board = self.board_mut();
        board.set(start, Tile::Penguin(id));
        board.set(target, undo_tile);
        Ok(())
    }
}
