pub const TICK_MS: u64 = 200;

/// Pixels per grid cell; entity pixel sizes are divided by this.
pub const SCALE: f32 = 30.0;
pub const BOARD_WIDTH: i32 = 33;
pub const BOARD_HEIGHT: i32 = 31;

pub const INITIAL_LIVES: u32 = 3;
pub const INITIAL_FUEL: u32 = 100;
pub const FUEL_DEPOT_REFUEL: i32 = 50;
pub const ENEMY_KILL_SCORE: i32 = 10;
pub const FUEL_DRAIN_INTERVAL_TICKS: u64 = 5;

pub const POOL_CAPACITY: usize = 20;
pub const MISSILE_POOL_MULTIPLIER: usize = 2;

pub const ENEMY_SPAWN_CHANCE: f32 = 0.3;
pub const FUEL_SPAWN_CHANCE: f32 = 0.08;
