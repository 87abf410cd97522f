// Background bot computations
//
// The bot runs on tokio's blocking thread pool so that the caller stays
// responsive. The caller keeps a handle to the shared control block and can
// abort at any time; the computation notices between two rated candidates.
// Every request delivers exactly one outcome through a oneshot channel.

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::bot::{BotControl, BotError, BotOutcome, BotParameters, BotState, BotStatus, BotSubstate};
use crate::game::Game;
use crate::rng::RandomSource;

/// Owns the bot, its parameters and its random source, runs one computation at a time
pub struct BotWorker {
    params: Arc<BotParameters>,
    state: Arc<Mutex<BotState>>,
    control: Arc<BotControl>,
    rng: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl BotWorker {
    /// Creates a worker with the given parameters
    ///
    /// # Arguments
    /// * `params` - Bot configuration, shared read-only with every computation
    /// * `rng` - Random source for the random strategies, used only by the worker
    pub fn new(params: BotParameters, rng: Box<dyn RandomSource>) -> Self {
        let control = Arc::new(BotControl::new());
        BotWorker {
            params: Arc::new(params),
            state: Arc::new(Mutex::new(BotState::with_control(control.clone()))),
            control,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn params(&self) -> &BotParameters {
        &self.params
    }

    pub fn status(&self) -> BotStatus {
        self.control.status()
    }

    pub fn is_busy(&self) -> bool {
        self.control.is_busy()
    }

    /// Asks the running computation to stop without a result
    pub fn abort(&self) {
        if self.control.is_busy() {
            info!("Aborting bot computation");
        }
        self.control.abort();
    }

    pub fn request_placement(&self, game: Arc<Mutex<Game>>) -> Result<BotTask, BotError> {
        self.spawn(game, BotSubstate::Placement)
    }

    pub fn request_move(&self, game: Arc<Mutex<Game>>) -> Result<BotTask, BotError> {
        self.spawn(game, BotSubstate::Movement)
    }

    fn spawn(&self, game: Arc<Mutex<Game>>, substate: BotSubstate) -> Result<BotTask, BotError> {
        // Refused synchronously so that a second request never reaches the pool
        self.control.enter(substate)?;

        let (sender, receiver) = oneshot::channel();
        let params = self.params.clone();
        let state = self.state.clone();
        let control = self.control.clone();
        let rng = self.rng.clone();

        debug!("Spawning bot {:?} computation", substate);
        let handle = tokio::task::spawn_blocking(move || {
            let guard = ComputationGuard::new(control);
            let mut state = state.lock();
            let mut game = game.lock();
            let mut rng = rng.lock();
            let outcome = match substate {
                BotSubstate::Placement => state.compute_placement(&mut game, &params, &mut **rng),
                BotSubstate::Movement => state.compute_move(&mut game, &params, &mut **rng),
            };
            drop(game);

            match &outcome {
                Ok(BotOutcome::Cancelled) => info!("Bot {:?} computation cancelled", substate),
                Ok(_) => debug!("Bot {:?} computation finished", substate),
                Err(e) => error!("Bot {:?} computation failed: {}", substate, e),
            }
            guard.release();
            if sender.send(outcome).is_err() {
                debug!("Bot result dropped, nobody is waiting for it");
            }
        });

        Ok(BotTask {
            substate,
            receiver,
            handle,
        })
    }
}

/// Keeps the status consistent when a computation unwinds before delivering
///
/// The normal path hands the control back through `release`. Dropping the
/// guard without it means the computation panicked, so the bot is reset to
/// Idle instead of staying busy forever.
struct ComputationGuard {
    control: Option<Arc<BotControl>>,
}

impl ComputationGuard {
    fn new(control: Arc<BotControl>) -> Self {
        ComputationGuard {
            control: Some(control),
        }
    }

    fn release(mut self) {
        if let Some(control) = self.control.take() {
            control.release();
        }
    }
}

impl Drop for ComputationGuard {
    fn drop(&mut self) {
        if let Some(control) = self.control.take() {
            if control.abandon() {
                warn!("Bot computation unwound, status reset to idle");
            }
        }
    }
}

/// A running bot computation
pub struct BotTask {
    substate: BotSubstate,
    receiver: oneshot::Receiver<Result<BotOutcome, BotError>>,
    handle: JoinHandle<()>,
}

impl BotTask {
    pub fn substate(&self) -> BotSubstate {
        self.substate
    }

    /// Waits for the single outcome of this computation
    pub async fn wait(self) -> Result<BotOutcome, BotError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                match self.handle.await {
                    Err(e) if e.is_panic() => {
                        error!("Bot {:?} computation panicked", self.substate)
                    }
                    _ => warn!("Bot {:?} computation ended without an outcome", self.substate),
                }
                Ok(BotOutcome::Cancelled)
            }
        }
    }
}
