pub mod collision;
pub mod command;
pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod logging;
pub mod game_state;
pub mod pool;
pub mod rng;
pub mod ticker;
pub mod types;
