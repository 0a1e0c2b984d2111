use clap::Args;

use crate::constants::{
    BOARD_HEIGHT, BOARD_WIDTH, ENEMY_SPAWN_CHANCE, FUEL_SPAWN_CHANCE, INITIAL_FUEL, INITIAL_LIVES,
    MISSILE_POOL_MULTIPLIER, POOL_CAPACITY, SCALE,
};
use crate::entity::Size;
use crate::types::EntityKind;

#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    pub scale: f32,
    /// Pixel edge of every entity; `entity_size()` converts it to grid units.
    pub entity_pixels: f32,
    pub board_width: i32,
    pub board_height: i32,
    pub initial_lives: u32,
    pub initial_fuel: u32,
    pub pool_capacity: usize,
    pub enemy_spawn_chance: f32,
    pub fuel_spawn_chance: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            scale: SCALE,
            entity_pixels: SCALE,
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            initial_lives: INITIAL_LIVES,
            initial_fuel: INITIAL_FUEL,
            pool_capacity: POOL_CAPACITY,
            enemy_spawn_chance: ENEMY_SPAWN_CHANCE,
            fuel_spawn_chance: FUEL_SPAWN_CHANCE,
        }
    }
}

impl WorldConfig {
    pub fn entity_size(&self) -> Size {
        let edge = if self.scale > 0.0 {
            self.entity_pixels / self.scale
        } else {
            1.0
        };
        Size {
            width: edge,
            height: edge,
        }
    }

    /// Missiles are short-lived and fired in bursts, so their pool is larger.
    pub fn pool_capacity_for(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Missile => self.pool_capacity * MISSILE_POOL_MULTIPLIER,
            _ => self.pool_capacity,
        }
    }

    pub fn player_spawn(&self) -> (f32, f32) {
        ((self.board_width / 2) as f32, (self.board_height - 1) as f32)
    }
}

/// World flags shared by every binary. Each one falls back to an env var.
#[derive(Args, Clone, Debug)]
pub struct WorldArgs {
    #[arg(long, env = "RIVER_RAID_SCALE", default_value_t = SCALE)]
    pub scale: f32,
    #[arg(long, env = "RIVER_RAID_ENTITY_PIXELS")]
    pub entity_pixels: Option<f32>,
    #[arg(long, env = "RIVER_RAID_BOARD_WIDTH", default_value_t = BOARD_WIDTH)]
    pub board_width: i32,
    #[arg(long, env = "RIVER_RAID_BOARD_HEIGHT", default_value_t = BOARD_HEIGHT)]
    pub board_height: i32,
    #[arg(long, env = "RIVER_RAID_LIVES", default_value_t = INITIAL_LIVES)]
    pub lives: u32,
    #[arg(long, env = "RIVER_RAID_POOL_CAPACITY", default_value_t = POOL_CAPACITY)]
    pub pool_capacity: usize,
}

impl WorldArgs {
    pub fn into_config(self) -> WorldConfig {
        WorldConfig {
            scale: self.scale,
            entity_pixels: self.entity_pixels.unwrap_or(self.scale),
            board_width: self.board_width.max(1),
            board_height: self.board_height.max(2),
            initial_lives: self.lives.max(1),
            pool_capacity: self.pool_capacity,
            ..WorldConfig::default()
        }
    }
}
