use std::sync::Arc;

use serde::Serialize;

use crate::constants::{ENEMY_KILL_SCORE, FUEL_DEPOT_REFUEL};
use crate::entity::{Entity, EntityId};
use crate::game_state::{GameState, World};

/// What one sweep did. `removed` holds the entities taken out of the world;
/// the caller releases them to the pool once the state lock is dropped.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<Entity>,
    pub stats: SweepStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub lives_lost: u32,
    pub enemies_destroyed: u32,
    pub depots_collected: u32,
    pub game_over: bool,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.stats == SweepStats::default()
    }
}

/// Collision detection and resolution bound to one game state.
pub struct CollisionHandler {
    state: Arc<GameState>,
}

impl CollisionHandler {
    pub fn new(state: Arc<GameState>) -> Self {
        Self { state }
    }

    /// Runs the three passes under a single acquisition of the state lock.
    pub fn check_all_collisions(&self) -> SweepReport {
        let mut world = self.state.lock();
        sweep(&mut world)
    }
}

/// The same sweep, for a caller that already holds the state guard.
pub fn sweep(world: &mut World) -> SweepReport {
    let mut report = SweepReport::default();
    check_player_enemy_collisions(world, &mut report);
    check_missile_enemy_collisions(world, &mut report);
    check_player_fuel_collisions(world, &mut report);
    report
}

fn enemy_ids(world: &World) -> Vec<EntityId> {
    world.enemies().iter().map(Entity::id).collect()
}

fn check_player_enemy_collisions(world: &mut World, report: &mut SweepReport) {
    if !world.is_running() {
        return;
    }
    let player = world.player().rect();
    for id in enemy_ids(world) {
        let hit = world
            .enemy(id)
            .is_some_and(|enemy| player.overlaps(&enemy.rect()));
        if !hit {
            continue;
        }
        let game_over = world.lose_life();
        report.stats.lives_lost += 1;
        if let Some(enemy) = world.remove_enemy(id) {
            report.removed.push(enemy);
        }
        if game_over {
            report.stats.game_over = true;
            break;
        }
    }
}

fn check_missile_enemy_collisions(world: &mut World, report: &mut SweepReport) {
    let missile_ids: Vec<EntityId> = world.missiles().iter().map(Entity::id).collect();
    for missile_id in missile_ids {
        let Some(missile) = world.missile(missile_id).map(Entity::rect) else {
            continue;
        };
        // First match in insertion order, not the nearest enemy.
        let target = world
            .enemies()
            .iter()
            .find(|enemy| missile.overlaps(&enemy.rect()))
            .map(Entity::id);
        let Some(enemy_id) = target else {
            continue;
        };
        world.update_score(ENEMY_KILL_SCORE);
        report.stats.enemies_destroyed += 1;
        if let Some(enemy) = world.remove_enemy(enemy_id) {
            report.removed.push(enemy);
        }
        if let Some(missile) = world.remove_missile(missile_id) {
            report.removed.push(missile);
        }
    }
}

fn check_player_fuel_collisions(world: &mut World, report: &mut SweepReport) {
    let player = world.player().rect();
    let depot_ids: Vec<EntityId> = world.fuel_depots().iter().map(Entity::id).collect();
    for id in depot_ids {
        let hit = world
            .fuel_depot(id)
            .is_some_and(|depot| player.overlaps(&depot.rect()));
        if !hit {
            continue;
        }
        world.update_fuel(FUEL_DEPOT_REFUEL);
        report.stats.depots_collected += 1;
        if let Some(depot) = world.remove_fuel_depot(id) {
            report.removed.push(depot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::command::{Command, CommandHandler};
    use crate::config::WorldConfig;
    use crate::pool::EntityPool;
    use crate::types::{EntityKind, GamePhase};

    struct Fixture {
        state: Arc<GameState>,
        pool: Arc<EntityPool>,
        handler: CollisionHandler,
    }

    fn fixture() -> Fixture {
        let config = WorldConfig::default();
        let state = Arc::new(GameState::new(config.clone()));
        let pool = Arc::new(EntityPool::new(&config));
        let handler = CollisionHandler::new(Arc::clone(&state));
        Fixture {
            state,
            pool,
            handler,
        }
    }

    fn place(fx: &Fixture, kind: EntityKind, x: f32, y: f32) -> EntityId {
        let entity = fx.pool.acquire(kind, x, y, None);
        let id = entity.id();
        fx.state.lock().insert(entity);
        id
    }

    fn put_player(fx: &Fixture, x: f32, y: f32) {
        fx.state.lock().set_player_position(x, y);
    }

    #[test]
    fn enemy_hit_costs_a_life_and_removes_enemy() {
        let fx = fixture();
        put_player(&fx, 5.0, 5.0);
        let hit = place(&fx, EntityKind::EnemyB, 5.5, 5.0);
        let miss = place(&fx, EntityKind::EnemyJ, 10.0, 5.0);

        let report = fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.lives(), 2);
        assert!(world.enemy(hit).is_none());
        assert!(world.enemy(miss).is_some());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.stats.lives_lost, 1);
        assert!(!report.stats.game_over);
    }

    #[test]
    fn last_life_stops_player_enemy_pass() {
        let fx = fixture();
        put_player(&fx, 5.0, 5.0);
        fx.state.lock().set_lives(1);
        let first = place(&fx, EntityKind::EnemyB, 5.0, 5.0);
        let second = place(&fx, EntityKind::EnemyH, 5.2, 5.2);

        let report = fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.lives(), 0);
        assert_eq!(world.phase(), GamePhase::GameOver);
        assert!(world.enemy(first).is_none());
        assert!(world.enemy(second).is_some());
        assert_eq!(report.stats.lives_lost, 1);
        assert!(report.stats.game_over);
        assert_eq!(report.removed[0].id(), first);
    }

    #[test]
    fn game_over_world_loses_no_more_lives() {
        let fx = fixture();
        put_player(&fx, 5.0, 5.0);
        fx.state.lock().set_lives(1);
        place(&fx, EntityKind::EnemyB, 5.0, 5.0);
        fx.handler.check_all_collisions();
        let late = place(&fx, EntityKind::EnemyB, 5.0, 5.0);

        let report = fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.lives(), 0);
        assert!(world.enemy(late).is_some());
        assert_eq!(report.stats.lives_lost, 0);
    }

    #[test]
    fn missile_destroys_only_first_overlapping_enemy() {
        let fx = fixture();
        put_player(&fx, 0.0, 30.0);
        let first = place(&fx, EntityKind::EnemyB, 10.0, 10.0);
        let second = place(&fx, EntityKind::EnemyJ, 10.5, 10.0);
        let missile = place(&fx, EntityKind::Missile, 10.2, 10.0);

        let report = fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.score(), 10);
        assert!(world.enemy(first).is_none());
        assert!(world.enemy(second).is_some());
        assert!(world.missile(missile).is_none());
        assert_eq!(report.stats.enemies_destroyed, 1);
        let removed: HashSet<EntityId> = report.removed.iter().map(Entity::id).collect();
        assert_eq!(removed, HashSet::from([first, missile]));
    }

    #[test]
    fn two_missiles_cannot_share_one_enemy() {
        let fx = fixture();
        put_player(&fx, 0.0, 30.0);
        let enemy = place(&fx, EntityKind::EnemyB, 10.0, 10.0);
        let first = place(&fx, EntityKind::Missile, 10.0, 10.0);
        let second = place(&fx, EntityKind::Missile, 10.1, 10.1);

        fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.score(), 10);
        assert!(world.enemy(enemy).is_none());
        assert!(world.missile(first).is_none());
        assert!(world.missile(second).is_some());
    }

    #[test]
    fn fuel_depot_adds_fifty_fuel() {
        let fx = fixture();
        put_player(&fx, 5.0, 5.0);
        fx.state.lock().update_fuel(-20);
        let depot = place(&fx, EntityKind::FuelDepot, 5.0, 5.5);

        let report = fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert_eq!(world.fuel(), 130);
        assert!(world.fuel_depot(depot).is_none());
        assert_eq!(report.stats.depots_collected, 1);
    }

    #[test]
    fn passes_see_earlier_removals() {
        let fx = fixture();
        put_player(&fx, 5.0, 5.0);
        let enemy = place(&fx, EntityKind::EnemyH, 5.0, 5.0);
        let missile = place(&fx, EntityKind::Missile, 5.0, 5.0);

        fx.handler.check_all_collisions();
        let world = fx.state.lock();
        assert!(world.enemy(enemy).is_none());
        assert!(world.missile(missile).is_some());
        assert_eq!(world.score(), 0);
        assert_eq!(world.lives(), 2);
    }

    #[test]
    fn empty_sweep_reports_nothing() {
        let fx = fixture();
        place(&fx, EntityKind::EnemyB, 1.0, 1.0);
        assert!(fx.handler.check_all_collisions().is_empty());
    }

    #[test]
    fn released_missile_is_reused_by_the_next_shot() {
        let fx = fixture();
        put_player(&fx, 10.0, 20.0);
        place(&fx, EntityKind::EnemyB, 10.0, 19.0);
        place(&fx, EntityKind::EnemyB, 10.0, 19.0);
        let shooter = CommandHandler::new(Arc::clone(&fx.state), Arc::clone(&fx.pool));

        shooter.handle(Command::Shoot);
        let first = fx.handler.check_all_collisions();
        let first_missile = first
            .removed
            .iter()
            .find(|entity| entity.kind() == EntityKind::Missile)
            .map(Entity::id);
        fx.pool.release_all(first.removed);

        shooter.handle(Command::Shoot);
        let second = fx.handler.check_all_collisions();
        let second_missile = second
            .removed
            .iter()
            .find(|entity| entity.kind() == EntityKind::Missile)
            .map(Entity::id);

        assert!(first_missile.is_some());
        assert_eq!(first_missile, second_missile);
        assert_eq!(second.stats.enemies_destroyed, 1);
        assert_eq!(fx.state.lock().score(), 20);
    }

    #[test]
    fn interleaved_sweeps_and_shots_account_for_every_missile() {
        const ROUNDS: usize = 40;
        let fx = fixture();
        put_player(&fx, 10.0, 20.0);
        for i in 0..30 {
            place(&fx, EntityKind::EnemyB, 10.0, 19.0 - (i % 3) as f32);
        }
        let shooter = CommandHandler::new(Arc::clone(&fx.state), Arc::clone(&fx.pool));
        let barrier = Arc::new(Barrier::new(2));

        let shots = {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    barrier.wait();
                    shooter.handle(Command::Shoot);
                }
            })
        };

        let mut destroyed = 0;
        let mut missiles_removed = 0;
        let mut account = |report: SweepReport| {
            destroyed += report.stats.enemies_destroyed;
            let missiles: Vec<EntityId> = report
                .removed
                .iter()
                .filter(|entity| entity.kind() == EntityKind::Missile)
                .map(Entity::id)
                .collect();
            let unique: HashSet<EntityId> = missiles.iter().copied().collect();
            assert_eq!(unique.len(), missiles.len());
            missiles_removed += missiles.len();
            fx.pool.release_all(report.removed);
        };
        for _ in 0..ROUNDS {
            barrier.wait();
            account(fx.handler.check_all_collisions());
        }
        shots.join().expect("shooter panicked");
        account(fx.handler.check_all_collisions());

        let world = fx.state.lock();
        assert!(world.is_running());
        let live: HashSet<EntityId> = world.missiles().iter().map(Entity::id).collect();
        assert_eq!(live.len(), world.missiles().len());
        assert_eq!(world.missiles().len() + missiles_removed, ROUNDS);
        assert_eq!(missiles_removed as u32, destroyed);
        assert_eq!(destroyed, 10);
        assert_eq!(world.score(), destroyed * 10);
        assert_eq!(world.enemies().len() as u32 + destroyed, 30);
        let created = world.missiles().len() + fx.pool.free_count(EntityKind::Missile);
        assert!(created <= fx.pool.capacity(EntityKind::Missile));
    }
}
