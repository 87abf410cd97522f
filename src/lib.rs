// Library exports for the Penguins game
// Rules engine, bot and the turn driver used by the self-play binary

pub mod board;
pub mod bot;
pub mod bot_task;
pub mod config;
pub mod debug_logger;
pub mod flood_fill;
pub mod game;
pub mod movement;
pub mod placement;
pub mod rng;
pub mod turn;
pub mod types;
