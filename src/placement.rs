// Placement phase rules
//
// Players take turns putting their penguins on unoccupied floes that hold
// exactly one fish. The fish on the floe is collected immediately.

use thiserror::Error;

use crate::board::Tile;
use crate::game::{Game, GameError, GameLogEntry, GamePhase};
use crate::types::Coords;

/// Reasons a placement target is refused, the first applicable one wins
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("{0} is outside the board")]
    OutOfBounds(Coords),
    #[error("{0} is water, penguins can only be placed on ice")]
    EmptyTile(Coords),
    #[error("{0} is already occupied by another player's penguin")]
    EnemyPenguin(Coords),
    #[error("{0} is already occupied by one of your penguins")]
    OwnPenguin(Coords),
    #[error("{0} holds more than one fish, only single-fish floes can be picked")]
    MultipleFish(Coords),
}

/// Why no player could be given the next placement turn
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSwitchError {
    #[error("all penguins have been placed")]
    AllPenguinsPlaced,
    #[error("no single-fish floes are left to place on")]
    NoMoreFreeTiles,
}

impl Game {
    pub fn placement_begin(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::SetupDone)?;
        self.set_phase(GamePhase::Placement);
        self.set_current_player(None);
        Ok(())
    }

    pub fn placement_end(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Placement)?;
        self.set_phase(GamePhase::SetupDone);
        Ok(())
    }

    /// Hands the turn to the next player who still has penguins to place
    ///
    /// # Returns
    /// The index of the new current player, or the reason the phase is over
    pub fn placement_switch_player(&mut self) -> Result<usize, PlacementSwitchError> {
        if !self.any_valid_placement_exists() {
            return Err(PlacementSwitchError::NoMoreFreeTiles);
        }
        let count = self.players_count();
        let start = self.current_player_index().map_or(0, |i| i + 1);
        let limit = self.penguins_per_player();
        let next = (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&idx| self.players()[idx].penguins.len() < limit)
            .ok_or(PlacementSwitchError::AllPenguinsPlaced)?;
        self.set_current_player(Some(next));
        Ok(next)
    }

    /// Whether any tile on the board could still receive a penguin
    pub fn any_valid_placement_exists(&self) -> bool {
        self.board().tiles().any(|(_, tile)| tile == Tile::Fish(1))
    }

    /// Checks a placement target for the current player
    pub fn validate_placement(&self, target: Coords) -> Result<(), PlacementError> {
        let tile = self
            .board()
            .get(target)
            .ok_or(PlacementError::OutOfBounds(target))?;
        match tile {
            Tile::Water => Err(PlacementError::EmptyTile(target)),
            Tile::Penguin(id) if Some(id) == self.current_player().map(|p| p.id) => {
                Err(PlacementError::OwnPenguin(target))
            }
            Tile::Penguin(_) => Err(PlacementError::EnemyPenguin(target)),
            Tile::Fish(1) => Ok(()),
            Tile::Fish(_) => Err(PlacementError::MultipleFish(target)),
        }
    }

    /// Places a penguin of the current player, collecting the fish on the target
    pub fn place_penguin(&mut self, target: Coords) -> Result<(), GameError> {
        self.require_phase(GamePhase::Placement)?;
        let idx = self.require_current_player()?;
        if self.players()[idx].penguins.len() >= self.penguins_per_player() {
            return Err(GameError::InvalidSetup(format!(
                "player {} has no penguins left to place",
                self.players()[idx].id
            )));
        }
        self.validate_placement(target)?;
        let undo_tile = self.apply_placement(idx, target)?;
        self.push_log_entry(GameLogEntry::Placement {
            player: idx,
            target,
            undo_tile,
        });
        Ok(())
    }

    /// Takes back the most recent placement
    pub fn undo_place_penguin(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Placement)?;
        match self.last_log_entry() {
            Some(GameLogEntry::Placement { .. }) => {}
            _ => return Err(GameError::NothingToUndo("placement")),
        }
        if let GameLogEntry::Placement {
            player,
            target,
            undo_tile,
        } = self.pop_log_entry()?
        {
            self.revert_placement(player, target, undo_tile)?;
        }
        Ok(())
    }

    /// Performs a placement without validating or logging it, returns the replaced tile
    pub(crate) fn apply_placement(&mut self, idx: usize, target: Coords) -> Result<Tile, GameError> {
        let undo_tile = self.tile(target);
        let player = self.player_mut(idx)?;
        player.points += undo_tile.fish();
        player.moves_count += 1;
        player.penguins.push(target);
        let id = player.id;
        self.board_mut().set(target, Tile::Penguin(id));
        Ok(undo_tile)
    }

    pub(crate) fn revert_placement(
        &mut self,
        idx: usize,
        target: Coords,
        undo_tile: Tile,
    ) -> Result<(), GameError> {
        let player = self.player_mut(idx)?;
        let position = player
            .penguins
            .iter()
            .rposition(|p| *p == target)
            .ok_or(GameError::NothingToUndo("placement"))?;
        player.penguins.remove(position);
        player.points -= undo_tile.fish();
        player.moves_count -= 1;
        self.board_mut().set(target, undo_tile);
        Ok(())
    }
}
