use parking_lot::{Mutex, MutexGuard};
use tracing::info;

use crate::config::WorldConfig;
use crate::entity::{Entity, EntityId, Player};
use crate::types::{
    Direction, EntityKind, EnemyView, FuelDepotView, GamePhase, MissileView, PlayerView, Snapshot,
};

/// The authoritative world. Reachable only through `GameState::lock`, so
/// every mutator below runs with the state lock held.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    player: Player,
    enemies: Vec<Entity>,
    missiles: Vec<Entity>,
    fuel_depots: Vec<Entity>,
    score: u32,
    lives: u32,
    fuel: u32,
    phase: GamePhase,
    tick: u64,
}

impl World {
    fn new(config: WorldConfig) -> Self {
        let (x, y) = config.player_spawn();
        Self {
            player: Player::new(x, y, config.entity_size()),
            enemies: Vec::new(),
            missiles: Vec::new(),
            fuel_depots: Vec::new(),
            score: 0,
            lives: config.initial_lives,
            fuel: config.initial_fuel,
            phase: GamePhase::Running,
            tick: 0,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn missiles(&self) -> &[Entity] {
        &self.missiles
    }

    pub fn fuel_depots(&self) -> &[Entity] {
        &self.fuel_depots
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn fuel(&self) -> u32 {
        self.fuel
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Entity> {
        self.enemies.iter().find(|entity| entity.id() == id)
    }

    pub fn missile(&self, id: EntityId) -> Option<&Entity> {
        self.missiles.iter().find(|entity| entity.id() == id)
    }

    pub fn fuel_depot(&self, id: EntityId) -> Option<&Entity> {
        self.fuel_depots.iter().find(|entity| entity.id() == id)
    }

    pub(crate) fn enemies_mut(&mut self) -> &mut [Entity] {
        &mut self.enemies
    }

    pub(crate) fn missiles_mut(&mut self) -> &mut [Entity] {
        &mut self.missiles
    }

    pub(crate) fn fuel_depots_mut(&mut self) -> &mut [Entity] {
        &mut self.fuel_depots
    }

    /// Adds an entity to the live collection its kind belongs to.
    pub fn insert(&mut self, entity: Entity) {
        match entity.kind() {
            EntityKind::EnemyB | EntityKind::EnemyJ | EntityKind::EnemyH => {
                self.enemies.push(entity)
            }
            EntityKind::FuelDepot => self.fuel_depots.push(entity),
            EntityKind::Missile => self.missiles.push(entity),
        }
    }

    pub fn remove_enemy(&mut self, id: EntityId) -> Option<Entity> {
        remove_by_id(&mut self.enemies, id)
    }

    pub fn remove_missile(&mut self, id: EntityId) -> Option<Entity> {
        remove_by_id(&mut self.missiles, id)
    }

    pub fn remove_fuel_depot(&mut self, id: EntityId) -> Option<Entity> {
        remove_by_id(&mut self.fuel_depots, id)
    }

    pub fn update_score(&mut self, delta: i32) {
        self.score = self.score.saturating_add_signed(delta);
    }

    /// Fuel floors at zero; there is no upper bound.
    pub fn update_fuel(&mut self, delta: i32) {
        self.fuel = self.fuel.saturating_add_signed(delta);
    }

    /// Takes one life. Returns true when this call ended the game.
    pub fn lose_life(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = GamePhase::GameOver;
            info!(score = self.score, tick = self.tick, "game over");
            return true;
        }
        false
    }

    pub fn move_player(&mut self, direction: Direction) {
        let board_width = self.config.board_width;
        self.player.step(direction, board_width);
    }

    #[cfg(test)]
    pub(crate) fn set_player_position(&mut self, x: f32, y: f32) {
        self.player.x = x;
        self.player.y = y;
    }

    #[cfg(test)]
    pub(crate) fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            player: PlayerView {
                x: self.player.x,
                y: self.player.y,
            },
            enemies: self
                .enemies
                .iter()
                .map(|enemy| EnemyView {
                    id: enemy.id().0,
                    kind: enemy.kind().tag(),
                    x: enemy.x,
                    y: enemy.y,
                })
                .collect(),
            missiles: self
                .missiles
                .iter()
                .map(|missile| MissileView {
                    id: missile.id().0,
                    x: missile.x,
                    y: missile.y,
                    pattern: missile.pattern(),
                })
                .collect(),
            fuel_depots: self
                .fuel_depots
                .iter()
                .map(|depot| FuelDepotView {
                    id: depot.id().0,
                    x: depot.x,
                    y: depot.y,
                })
                .collect(),
            score: self.score,
            lives: self.lives,
            fuel: self.fuel,
            phase: self.phase,
            game_running: self.is_running(),
        }
    }

    /// Restores initial values and hands back every live entity.
    fn reset(&mut self) -> Vec<Entity> {
        let mut drained = Vec::with_capacity(
            self.enemies.len() + self.missiles.len() + self.fuel_depots.len(),
        );
        drained.append(&mut self.enemies);
        drained.append(&mut self.missiles);
        drained.append(&mut self.fuel_depots);
        let config = self.config.clone();
        *self = World::new(config);
        drained
    }
}

fn remove_by_id(list: &mut Vec<Entity>, id: EntityId) -> Option<Entity> {
    let idx = list.iter().position(|entity| entity.id() == id)?;
    Some(list.remove(idx))
}

/// Shared world state. One coarse lock covers every multi-field update.
pub struct GameState {
    world: Mutex<World>,
}

impl GameState {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            world: Mutex::new(World::new(config)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.world.lock().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.world.lock().is_running()
    }

    /// Starts a new game. The drained entities belong to the caller, who
    /// should hand them to the pool after this returns.
    pub fn reset(&self) -> Vec<Entity> {
        let drained = self.world.lock().reset();
        info!(returned = drained.len(), "game reset");
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::EntityPool;

    fn setup() -> (GameState, EntityPool) {
        let config = WorldConfig::default();
        (GameState::new(config.clone()), EntityPool::new(&config))
    }

    #[test]
    fn new_world_has_initial_values() {
        let (state, _) = setup();
        let world = state.lock();
        assert_eq!(world.score(), 0);
        assert_eq!(world.lives(), 3);
        assert_eq!(world.fuel(), 100);
        assert_eq!(world.phase(), GamePhase::Running);
        assert_eq!((world.player().x, world.player().y), (16.0, 30.0));
    }

    #[test]
    fn insert_routes_by_kind() {
        let (state, pool) = setup();
        let enemy = pool.acquire(EntityKind::EnemyH, 1.0, 1.0, None);
        let missile = pool.acquire(EntityKind::Missile, 2.0, 2.0, None);
        let depot = pool.acquire(EntityKind::FuelDepot, 3.0, 3.0, None);
        let mut world = state.lock();
        world.insert(enemy);
        world.insert(missile);
        world.insert(depot);
        assert_eq!(world.enemies().len(), 1);
        assert_eq!(world.missiles().len(), 1);
        assert_eq!(world.fuel_depots().len(), 1);
    }

    #[test]
    fn remove_keeps_insertion_order() {
        let (state, pool) = setup();
        let enemies: Vec<Entity> = (0..3)
            .map(|i| pool.acquire(EntityKind::EnemyB, i as f32, 0.0, None))
            .collect();
        let ids: Vec<EntityId> = enemies.iter().map(|e| e.id()).collect();
        let mut world = state.lock();
        for enemy in enemies {
            world.insert(enemy);
        }

        let removed = world.remove_enemy(ids[1]).expect("enemy present");
        assert_eq!(removed.id(), ids[1]);
        assert!(world.remove_enemy(ids[1]).is_none());
        let remaining: Vec<EntityId> = world.enemies().iter().map(|e| e.id()).collect();
        assert_eq!(remaining, vec![ids[0], ids[2]]);
    }

    #[test]
    fn lives_stop_at_zero_and_end_the_game() {
        let (state, _) = setup();
        let mut world = state.lock();
        assert!(!world.lose_life());
        assert!(!world.lose_life());
        assert!(world.lose_life());
        assert_eq!(world.lives(), 0);
        assert_eq!(world.phase(), GamePhase::GameOver);
        assert!(!world.lose_life());
        assert_eq!(world.lives(), 0);
    }

    #[test]
    fn fuel_floors_at_zero_without_upper_clamp() {
        let (state, _) = setup();
        let mut world = state.lock();
        world.update_fuel(-250);
        assert_eq!(world.fuel(), 0);
        world.update_fuel(500);
        assert_eq!(world.fuel(), 500);
        world.update_score(10);
        world.update_score(10);
        assert_eq!(world.score(), 20);
    }

    #[test]
    fn reset_drains_collections_and_restores_values() {
        let (state, pool) = setup();
        let enemy = pool.acquire(EntityKind::EnemyB, 1.0, 1.0, None);
        let missile = pool.acquire(EntityKind::Missile, 1.0, 1.0, None);
        {
            let mut world = state.lock();
            world.insert(enemy);
            world.insert(missile);
            world.update_score(40);
            world.set_lives(1);
            world.lose_life();
            world.move_player(Direction::Left);
        }
        let drained = state.reset();
        assert_eq!(drained.len(), 2);

        let snapshot = state.snapshot();
        assert!(snapshot.game_running);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert!(snapshot.enemies.is_empty());
        assert_eq!(snapshot.player.x, 16.0);
    }

    #[test]
    fn snapshot_serializes_wire_tags() {
        let (state, pool) = setup();
        let enemy = pool.acquire(EntityKind::EnemyJ, 4.0, 5.0, None);
        let missile = pool.acquire(EntityKind::Missile, 4.0, 6.0, None);
        {
            let mut world = state.lock();
            world.insert(enemy);
            world.insert(missile);
        }
        let value = serde_json::to_value(state.snapshot()).expect("snapshot serializes");
        assert_eq!(value["enemies"][0]["type"], "J");
        assert_eq!(value["missiles"][0]["type"], "straight");
        assert_eq!(value["phase"], "running");
        assert_eq!(value["game_running"], true);
    }
}
