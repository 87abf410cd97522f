// Turn dispatch
//
// A session pairs the shared game with who controls each player. Every turn
// is decided by one match over (phase, actor): human turns wait for an
// action from outside, bot turns start a background computation. Both kinds
// of action go through the same rule functions.

use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::bot::{BotError, BotOutcome};
use crate::bot_task::{BotTask, BotWorker};
use crate::debug_logger::DebugLogger;
use crate::game::{Game, GameError, GameLogEntry, GamePhase};
use crate::types::Coords;

/// Who makes the decisions for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Human,
    Bot,
}

/// An action submitted for the current player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Place(Coords),
    Move { penguin: Coords, target: Coords },
}

/// What the caller has to do next
pub enum TurnState {
    /// A human player has to submit an action for this phase
    AwaitingHuman { player: usize, phase: GamePhase },
    /// The bot is computing, wait for the task and apply its outcome
    BotStarted(BotTask),
    /// The bot computation was aborted, the turn is still open
    BotCancelled,
    GameOver,
}

pub struct Session {
    game: Arc<Mutex<Game>>,
    actors: Vec<Actor>,
    worker: BotWorker,
    logger: DebugLogger,
    emitted: usize,
}

impl Session {
    /// # Arguments
    /// * `game` - The game to play, usually still in the Setup phase
    /// * `actors` - One actor per player of the game
    /// * `worker` - Runs the computations of every bot player
    pub fn new(game: Game, actors: Vec<Actor>, worker: BotWorker) -> Result<Self, GameError> {
        if actors.len() != game.players_count() {
            return Err(GameError::InvalidSetup(format!(
                "{} actors given for {} players",
                actors.len(),
                game.players_count()
            )));
        }
        Ok(Session {
            game: Arc::new(Mutex::new(game)),
            actors,
            worker,
            logger: DebugLogger::disabled(),
            emitted: 0,
        })
    }

    pub fn with_logger(mut self, logger: DebugLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Shared handle to the game, lock it for a read-only snapshot
    pub fn game(&self) -> Arc<Mutex<Game>> {
        self.game.clone()
    }

    pub fn worker(&self) -> &BotWorker {
        &self.worker
    }

    /// Progresses the game to the next decision and dispatches it
    pub fn handle_turn(&mut self) -> Result<TurnState, BotError> {
        loop {
            let (phase, current) = {
                let game = self.game.lock();
                (game.phase(), game.current_player_index())
            };
            let actor = current.and_then(|idx| self.actors.get(idx).copied());

            match (phase, actor) {
                (GamePhase::End, _) => return Ok(TurnState::GameOver),
                (GamePhase::Placement, Some(Actor::Human)) | (GamePhase::Movement, Some(Actor::Human)) => {
                    let player = current.ok_or(GameError::NoCurrentPlayer)?;
                    return Ok(TurnState::AwaitingHuman { player, phase });
                }
                (GamePhase::Placement, Some(Actor::Bot)) => {
                    return Ok(TurnState::BotStarted(self.worker.request_placement(self.game.clone())?));
                }
                (GamePhase::Movement, Some(Actor::Bot)) => {
                    return Ok(TurnState::BotStarted(self.worker.request_move(self.game.clone())?));
                }
                _ => {
                    if self.worker.is_busy() {
                        return Err(BotError::Busy(self.worker.status()));
                    }
                    let progressed = {
                        let mut game = self.game.lock();
                        let before = game.log_current();
                        game.advance_state()?;
                        game.log_current() != before
                    };
                    if !progressed {
                        return Err(GameError::NoCurrentPlayer.into());
                    }
                    self.emit_events();
                }
            }
        }
    }

    /// Applies an action of the current player and moves the game forward
    ///
    /// Refused while a bot computation is in flight.
    pub fn submit_action(&mut self, action: PlayerAction) -> Result<(), GameError> {
        if self.worker.is_busy() {
            return Err(GameError::BotBusy);
        }
        {
            let mut game = self.game.lock();
            match action {
                PlayerAction::Place(target) => game.place_penguin(target)?,
                PlayerAction::Move { penguin, target } => game.move_penguin(penguin, target)?,
            }
            game.advance_state()?;
        }
        self.emit_events();
        Ok(())
    }

    /// Applies what a bot computation delivered
    pub fn apply_bot_outcome(&mut self, outcome: BotOutcome) -> Result<(), GameError> {
        match outcome {
            BotOutcome::Chosen(mv) => {
                let action = match mv.penguin {
                    None => PlayerAction::Place(mv.target),
                    Some(penguin) => PlayerAction::Move {
                        penguin,
                        target: mv.target,
                    },
                };
                self.submit_action(action)
            }
            BotOutcome::NoLegalAction => {
                // Switching players skips whoever cannot act, or ends the phase
                if self.worker.is_busy() {
                    return Err(GameError::BotBusy);
                }
                self.game.lock().advance_state()?;
                self.emit_events();
                Ok(())
            }
            BotOutcome::Cancelled => Ok(()),
        }
    }

    /// Plays bot turns until a human has to act or the game is over
    pub async fn play_bot_turns(&mut self) -> Result<TurnState, BotError> {
        loop {
            match self.handle_turn()? {
                TurnState::BotStarted(task) => {
                    let outcome = task.wait().await?;
                    if outcome == BotOutcome::Cancelled {
                        warn!("Bot turn was cancelled, stopping");
                        return Ok(TurnState::BotCancelled);
                    }
                    self.apply_bot_outcome(outcome)?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Forwards log entries recorded since the last call to the logger
    fn emit_events(&mut self) {
        let game = self.game.lock();
        let current = game.log_current();
        if current < self.emitted {
            self.emitted = current;
            return;
        }
        let events: Vec<GameLogEntry> = game.log_entries()[self.emitted..current].to_vec();
        drop(game);

        for event in &events {
            match event {
                GameLogEntry::PhaseChange { new_phase, .. } => info!("Phase: {:?}", new_phase),
                GameLogEntry::Placement { player, target, .. } => {
                    info!("Player {} placed a penguin on {}", player, target)
                }
                GameLogEntry::Movement {
                    player,
                    penguin,
                    target,
                    ..
                } => info!("Player {} moved {} -> {}", player, penguin, target),
                GameLogEntry::PlayerChange { .. } => {}
            }
        }
        self.logger.log_events(self.emitted, events);
        self.emitted = current;
    }
}
