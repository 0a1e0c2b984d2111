use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::collision::{CollisionHandler, SweepStats};
use crate::config::WorldConfig;
use crate::constants::FUEL_DRAIN_INTERVAL_TICKS;
use crate::entity::{ContextId, Entity};
use crate::game_state::{GameState, World};
use crate::pool::EntityPool;
use crate::rng::SpawnRng;
use crate::types::EntityKind;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    pub tick: u64,
    pub culled: usize,
    pub spawned: usize,
    pub collisions: SweepStats,
}

/// Drives the world one step at a time: movement, the collision sweep,
/// pool bookkeeping and spawning.
pub struct Ticker {
    state: Arc<GameState>,
    pool: Arc<EntityPool>,
    collisions: CollisionHandler,
    config: WorldConfig,
    context: ContextId,
    rng: SpawnRng,
}

impl Ticker {
    pub fn new(state: Arc<GameState>, pool: Arc<EntityPool>, config: WorldConfig, seed: u32) -> Self {
        Self {
            collisions: CollisionHandler::new(Arc::clone(&state)),
            state,
            pool,
            config,
            context: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
            rng: SpawnRng::new(seed),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn tick(&mut self) -> TickOutcome {
        let (tick, culled) = {
            let mut world = self.state.lock();
            if !world.is_running() {
                return TickOutcome {
                    tick: world.tick(),
                    ..TickOutcome::default()
                };
            }
            let tick = world.advance_tick();
            advance_positions(&mut world, tick);
            let culled = cull_off_board(&mut world);
            if tick % FUEL_DRAIN_INTERVAL_TICKS == 0 {
                world.update_fuel(-1);
            }
            (tick, culled)
        };

        let culled_count = culled.len();
        self.pool.release_all(culled);

        let report = self.collisions.check_all_collisions();
        let stats = report.stats;
        if !report.is_empty() {
            let pooled = self.pool.release_all(report.removed);
            debug!(tick, ?stats, pooled, "collisions resolved");
        }

        let spawned = if stats.game_over { 0 } else { self.spawn() };
        if culled_count > 0 || spawned > 0 {
            debug!(tick, culled = culled_count, spawned, "tick bookkeeping");
        }

        TickOutcome {
            tick,
            culled: culled_count,
            spawned,
            collisions: stats,
        }
    }

    fn spawn(&mut self) -> usize {
        let mut fresh = Vec::new();
        if self.rng.chance(self.config.enemy_spawn_chance) {
            if let Some(kind) = self.rng.pick(&EntityKind::ENEMIES) {
                let x = self.random_column();
                fresh.push(self.pool.acquire(kind, x, 0.0, Some(self.context)));
            }
        }
        if self.rng.chance(self.config.fuel_spawn_chance) {
            let x = self.random_column();
            fresh.push(self.pool.acquire(EntityKind::FuelDepot, x, 0.0, None));
        }
        if fresh.is_empty() {
            return 0;
        }

        let rejected = {
            let mut world = self.state.lock();
            if world.is_running() {
                let count = fresh.len();
                for entity in fresh {
                    world.insert(entity);
                }
                return count;
            }
            fresh
        };
        self.pool.release_all(rejected);
        0
    }

    fn random_column(&mut self) -> f32 {
        self.rng.column(self.config.board_width) as f32
    }
}

fn advance_positions(world: &mut World, tick: u64) {
    let max_x = (world.config().board_width - 1).max(0) as f32;
    for missile in world.missiles_mut() {
        missile.y -= 1.0;
    }
    for enemy in world.enemies_mut() {
        match enemy.kind() {
            EntityKind::EnemyB => enemy.y += 1.0,
            EntityKind::EnemyJ => {
                enemy.y += 1.0;
                let sidestep = if tick % 2 == 0 { 1.0 } else { -1.0 };
                enemy.x = (enemy.x + sidestep).clamp(0.0, max_x);
            }
            EntityKind::EnemyH => enemy.y += 2.0,
            EntityKind::FuelDepot | EntityKind::Missile => {}
        }
    }
    for depot in world.fuel_depots_mut() {
        depot.y += 1.0;
    }
}

fn cull_off_board(world: &mut World) -> Vec<Entity> {
    let bottom = world.config().board_height as f32;
    let below = |entity: &Entity| entity.y >= bottom;
    let above = |entity: &Entity| entity.y + entity.size.height <= 0.0;

    let enemy_ids: Vec<_> = world.enemies().iter().filter(|e| below(*e)).map(Entity::id).collect();
    let depot_ids: Vec<_> = world
        .fuel_depots()
        .iter()
        .filter(|e| below(*e))
        .map(Entity::id)
        .collect();
    let missile_ids: Vec<_> = world.missiles().iter().filter(|e| above(*e)).map(Entity::id).collect();

    let mut culled = Vec::with_capacity(enemy_ids.len() + depot_ids.len() + missile_ids.len());
    culled.extend(enemy_ids.into_iter().filter_map(|id| world.remove_enemy(id)));
    culled.extend(depot_ids.into_iter().filter_map(|id| world.remove_fuel_depot(id)));
    culled.extend(missile_ids.into_iter().filter_map(|id| world.remove_missile(id)));
    culled
}
