// The central game state: board, players, turn and phase
//
// The Game is a state machine over GamePhase. Rule functions live in the
// placement and movement modules as further `impl Game` blocks; this module
// owns setup, phase progression and the action log that makes every step
// undoable and replayable.

use serde::Serialize;
use thiserror::Error;

use crate::board::{Board, BoardGenerator, PlayerId, Tile};
use crate::movement::MovementError;
use crate::placement::PlacementError;
use crate::rng::RandomSource;
use crate::types::Coords;

/// Phases of the game state machine
///
/// ```text
/// Setup --end_setup--> SetupDone --placement_begin--> Placement --placement_end--> SetupDone
/// SetupDone --movement_begin--> Movement --movement_end--> SetupDone --game_end--> End
/// ```
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Setup,
    SetupDone,
    Placement,
    Movement,
    End,
}

/// Errors for calls made against a game that is not in a state to accept them
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("operation requires the {expected:?} phase, but the game is in {actual:?}")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("no player is currently taking a turn")]
    NoCurrentPlayer,
    #[error("there is no player with index {0}")]
    NoSuchPlayer(usize),
    #[error("move was not validated: {0}")]
    IllegalMove(#[from] MovementError),
    #[error("placement was not validated: {0}")]
    IllegalPlacement(#[from] PlacementError),
    #[error("the last logged action is not a {0} that could be undone")]
    NothingToUndo(&'static str),
    #[error("the log is rewound to entry {current} of {length}, return to the latest entry first")]
    LogRewound { current: usize, length: usize },
    #[error("log entry {0} does not exist")]
    NoSuchLogEntry(usize),
    #[error("invalid setup: {0}")]
    InvalidSetup(String),
    #[error("a bot computation is in progress")]
    BotBusy,
}

/// Holds the player data
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    /// Unique identifier, always `index + 1`
    pub id: PlayerId,
    pub name: String,
    /// The number of collected fish
    pub points: u32,
    /// Positions of the player's penguins, kept in sync with the board
    pub penguins: Vec<Coords>,
    /// Placements and movements made by this player
    pub moves_count: u32,
}

/// One recorded step of the game, enough to both undo and redo it
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GameLogEntry {
    PhaseChange {
        old_phase: GamePhase,
        new_phase: GamePhase,
    },
    PlayerChange {
        old_player: Option<usize>,
        new_player: Option<usize>,
    },
    Placement {
        player: usize,
        target: Coords,
        undo_tile: Tile,
    },
    Movement {
        player: usize,
        penguin: Coords,
        target: Coords,
        undo_tile: Tile,
    },
}

/// The game: the single source of truth every rule and the bot read
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Game {
    phase: GamePhase,
    players: Vec<Player>,
    penguins_per_player: usize,
    board: Board,
    current_player_index: Option<usize>,
    log: Vec<GameLogEntry>,
    log_current: usize,
}

impl Game {
    /// Creates a game in the Setup phase with an all-water board
    ///
    /// # Arguments
    /// * `width`, `height` - Board dimensions, must be positive
    /// * `player_names` - One entry per player, at most 9 players
    /// * `penguins_per_player` - Number of penguins every player places
    pub fn new<S: AsRef<str>>(
        width: i32,
        height: i32,
        player_names: &[S],
        penguins_per_player: usize,
    ) -> Result<Self, GameError> {
        if width <= 0 || height <= 0 {
            return Err(GameError::InvalidSetup(format!(
                "board size {}x{} must be positive",
                width, height
            )));
        }
        if player_names.len() > 9 {
            return Err(GameError::InvalidSetup(format!(
                "{} players requested, at most 9 are supported",
                player_names.len()
            )));
        }

        let players = player_names
            .iter()
            .enumerate()
            .map(|(i, name)| Player {
                id: (i + 1) as PlayerId,
                name: name.as_ref().to_string(),
                points: 0,
                penguins: Vec::with_capacity(penguins_per_player),
                moves_count: 0,
            })
            .collect();

        Ok(Game {
            phase: GamePhase::Setup,
            players,
            penguins_per_player,
            board: Board::new(width, height),
            current_player_index: None,
            log: Vec::new(),
            log_current: 0,
        })
    }

    /// Builds a fully set up game from a text layout (see [`Board::from_rows`])
    ///
    /// Players are named `A`, `B`, ... and every penguin letter in the layout
    /// is registered with its owner in row-major order.
    pub fn from_layout(
        rows: &[&str],
        players_count: usize,
        penguins_per_player: usize,
    ) -> Result<Self, GameError> {
        let names: Vec<String> = (0..players_count)
            .map(|i| char::from(b'A' + i as u8).to_string())
            .collect();
        let layout = Board::from_rows(rows);
        let mut game = Game::new(layout.width(), layout.height(), &names, penguins_per_player)?;
        for (coords, tile) in layout.tiles() {
            match tile {
                Tile::Penguin(id) => game.setup_penguin(usize::from(id) - 1, coords)?,
                other => game.set_tile(coords, other)?,
            }
        }
        game.end_setup()?;
        Ok(game)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_count(&self) -> usize {
        self.players.len()
    }

    pub fn penguins_per_player(&self) -> usize {
        self.penguins_per_player
    }

    pub fn player(&self, idx: usize) -> Result<&Player, GameError> {
        self.players.get(idx).ok_or(GameError::NoSuchPlayer(idx))
    }

    pub(crate) fn player_mut(&mut self, idx: usize) -> Result<&mut Player, GameError> {
        self.players.get_mut(idx).ok_or(GameError::NoSuchPlayer(idx))
    }

    pub fn current_player_index(&self) -> Option<usize> {
        self.current_player_index
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_index.and_then(|i| self.players.get(i))
    }

    /// Index of the player owning the given id, ids are `index + 1`
    pub fn find_player_by_id(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn tile(&self, coords: Coords) -> Tile {
        self.board.tile(coords)
    }

    /// Fish on the board plus fish collected by all players, constant for a game
    pub fn total_fish(&self) -> u32 {
        self.board.total_fish() + self.players.iter().map(|p| p.points).sum::<u32>()
    }

    pub(crate) fn require_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    pub(crate) fn require_current_player(&self) -> Result<usize, GameError> {
        self.current_player_index.ok_or(GameError::NoCurrentPlayer)
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    // Setup

    /// Overwrites a tile while the game is being set up
    pub fn set_tile(&mut self, coords: Coords, tile: Tile) -> Result<(), GameError> {
        self.require_phase(GamePhase::Setup)?;
        if !self.board.is_in_bounds(coords) {
            return Err(GameError::InvalidSetup(format!("{} is outside the board", coords)));
        }
        match tile {
            Tile::Penguin(_) => {
                return Err(GameError::InvalidSetup(
                    "penguins are added with setup_penguin".to_string(),
                ))
            }
            Tile::Fish(0) => {
                return Err(GameError::InvalidSetup(format!(
                    "floe at {} needs at least one fish",
                    coords
                )))
            }
            _ => {}
        }
        if self.board.tile(coords).is_penguin() {
            return Err(GameError::InvalidSetup(format!("{} holds a penguin", coords)));
        }
        self.board.set(coords, tile);
        Ok(())
    }

    /// Puts a penguin of player `idx` on the board during setup
    pub fn setup_penguin(&mut self, idx: usize, coords: Coords) -> Result<(), GameError> {
        self.require_phase(GamePhase::Setup)?;
        if !self.board.is_in_bounds(coords) {
            return Err(GameError::InvalidSetup(format!("{} is outside the board", coords)));
        }
        if self.board.tile(coords).is_penguin() {
            return Err(GameError::InvalidSetup(format!(
                "{} already holds a penguin",
                coords
            )));
        }
        let limit = self.penguins_per_player;
        let player = self.player_mut(idx)?;
        if player.penguins.len() >= limit {
            return Err(GameError::InvalidSetup(format!(
                "player {} already has all {} penguins",
                player.id, limit
            )));
        }
        player.penguins.push(coords);
        let id = player.id;
        self.board.set(coords, Tile::Penguin(id));
        Ok(())
    }

    /// Replaces the whole board with a generated one
    pub fn generate_board(
        &mut self,
        generator: BoardGenerator,
        rng: &mut dyn RandomSource,
    ) -> Result<(), GameError> {
        self.require_phase(GamePhase::Setup)?;
        self.board.generate(generator, rng);
        for player in &mut self.players {
            player.penguins.clear();
        }
        Ok(())
    }

    /// Verifies that board and penguin lists agree and leaves the Setup phase
    pub fn end_setup(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::Setup)?;
        for (coords, tile) in self.board.tiles() {
            if tile == Tile::Fish(0) {
                return Err(GameError::InvalidSetup(format!("floe at {} has no fish", coords)));
            }
            if let Tile::Penguin(id) = tile {
                let owner = self.find_player_by_id(id).ok_or_else(|| {
                    GameError::InvalidSetup(format!("penguin at {} has no owner {}", coords, id))
                })?;
                if !self.players[owner].penguins.contains(&coords) {
                    return Err(GameError::InvalidSetup(format!(
                        "penguin at {} is not registered with player {}",
                        coords, id
                    )));
                }
            }
        }
        for player in &self.players {
            for (i, penguin) in player.penguins.iter().enumerate() {
                if player.penguins[..i].contains(penguin) {
                    return Err(GameError::InvalidSetup(format!(
                        "player {} has two penguins at {}",
                        player.id, penguin
                    )));
                }
                if self.board.tile(*penguin) != Tile::Penguin(player.id) {
                    return Err(GameError::InvalidSetup(format!(
                        "player {} has a penguin at {} which is not on the board",
                        player.id, penguin
                    )));
                }
            }
        }
        self.set_phase(GamePhase::SetupDone);
        Ok(())
    }

    // Phase and turn bookkeeping

    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        self.push_log_entry(GameLogEntry::PhaseChange {
            old_phase: self.phase,
            new_phase: phase,
        });
        self.phase = phase;
    }

    pub(crate) fn set_current_player(&mut self, idx: Option<usize>) {
        if self.current_player_index == idx {
            return;
        }
        self.push_log_entry(GameLogEntry::PlayerChange {
            old_player: self.current_player_index,
            new_player: idx,
        });
        self.current_player_index = idx;
    }

    /// The all-in-one progression: begins phases, switches players and ends
    /// the game once nobody can act. Several transitions may happen in one call.
    pub fn advance_state(&mut self) -> Result<(), GameError> {
        if self.phase == GamePhase::Setup {
            self.end_setup()?;
        }
        if self.phase == GamePhase::SetupDone && self.log_has_no_placement_phase() {
            self.placement_begin()?;
        }
        if self.phase == GamePhase::Placement && self.placement_switch_player().is_err() {
            self.placement_end()?;
            self.movement_begin()?;
        }
        if self.phase == GamePhase::Movement && self.movement_switch_player().is_none() {
            self.movement_end()?;
            self.game_end()?;
        }
        Ok(())
    }

    fn log_has_no_placement_phase(&self) -> bool {
        !self.log[..self.log_current].iter().any(|entry| {
            matches!(
                entry,
                GameLogEntry::PhaseChange {
                    new_phase: GamePhase::Placement,
                    ..
                }
            )
        })
    }

    /// Ends the game, only possible between phases
    pub fn game_end(&mut self) -> Result<(), GameError> {
        self.require_phase(GamePhase::SetupDone)?;
        self.set_current_player(None);
        self.set_phase(GamePhase::End);
        Ok(())
    }

    // Action log

    /// All recorded entries, including ones undone by a rewind
    pub fn log_entries(&self) -> &[GameLogEntry] {
        &self.log
    }

    /// Number of entries currently applied to the state
    pub fn log_current(&self) -> usize {
        self.log_current
    }

    pub fn is_log_at_head(&self) -> bool {
        self.log_current == self.log.len()
    }

    /// Records an entry; entries undone by a rewind are discarded first
    pub(crate) fn push_log_entry(&mut self, entry: GameLogEntry) {
        self.log.truncate(self.log_current);
        self.log.push(entry);
        self.log_current = self.log.len();
    }

    /// Removes the last entry, used when an action is retracted
    pub(crate) fn pop_log_entry(&mut self) -> Result<GameLogEntry, GameError> {
        if !self.is_log_at_head() {
            return Err(GameError::LogRewound {
                current: self.log_current,
                length: self.log.len(),
            });
        }
        let entry = self.log.pop().ok_or(GameError::NothingToUndo("logged action"))?;
        self.log_current = self.log.len();
        Ok(entry)
    }

    pub(crate) fn last_log_entry(&self) -> Option<&GameLogEntry> {
        if self.is_log_at_head() {
            self.log.last()
        } else {
            None
        }
    }

    /// Undoes or redoes logged entries until exactly `target` entries are applied
    ///
    /// No new entries are recorded while rewinding, the log itself stays intact
    /// so the state can be moved forward again.
    pub fn rewind_to_log_entry(&mut self, target: usize) -> Result<(), GameError> {
        if target > self.log.len() {
            return Err(GameError::NoSuchLogEntry(target));
        }
        while self.log_current > target {
            let entry = self.log[self.log_current - 1];
            self.revert_entry(entry)?;
            self.log_current -= 1;
        }
        while self.log_current < target {
            let entry = self.log[self.log_current];
            self.replay_entry(entry)?;
            self.log_current += 1;
        }
        Ok(())
    }

    fn revert_entry(&mut self, entry: GameLogEntry) -> Result<(), GameError> {
        match entry {
            GameLogEntry::PhaseChange { old_phase, .. } => self.phase = old_phase,
            GameLogEntry::PlayerChange { old_player, .. } => self.current_player_index = old_player,
            GameLogEntry::Placement {
                player,
                target,
                undo_tile,
            } => self.revert_placement(player, target, undo_tile)?,
            GameLogEntry::Movement {
                player,
                penguin,
                target,
                undo_tile,
            } => self.revert_movement(player, penguin, target, undo_tile)?,
        }
        Ok(())
    }

    fn replay_entry(&mut self, entry: GameLogEntry) -> Result<(), GameError> {
        match entry {
            GameLogEntry::PhaseChange { new_phase, .. } => self.phase = new_phase,
            GameLogEntry::PlayerChange { new_player, .. } => self.current_player_index = new_player,
            GameLogEntry::Placement { player, target, .. } => {
                self.apply_placement(player, target)?;
            }
            GameLogEntry::Movement {
                player,
                penguin,
                target,
                ..
            } => {
                self.apply_movement(player, penguin, target)?;
            }
        }
        Ok(())
    }
}
