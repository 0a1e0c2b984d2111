use parking_lot::Mutex;
use tracing::debug;

use crate::config::WorldConfig;
use crate::entity::{ContextId, Entity, Size};
use crate::error::GameError;
use crate::types::EntityKind;

const KIND_COUNT: usize = EntityKind::ALL.len();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    Pooled,
    /// The kind's free-list was full; the entity was dropped.
    Discarded,
}

/// Bounded per-kind free-lists of reusable entities.
///
/// All kinds share one lock. It is held only for the pop/push and the field
/// reset, never while the caller holds the game-state lock.
pub struct EntityPool {
    capacities: [usize; KIND_COUNT],
    entity_size: Size,
    free: Mutex<[Vec<Entity>; KIND_COUNT]>,
}

impl EntityPool {
    pub fn new(config: &WorldConfig) -> Self {
        let capacities = EntityKind::ALL.map(|kind| config.pool_capacity_for(kind));
        Self {
            capacities,
            entity_size: config.entity_size(),
            free: Mutex::new(capacities.map(Vec::with_capacity)),
        }
    }

    pub fn acquire(&self, kind: EntityKind, x: f32, y: f32, context: Option<ContextId>) -> Entity {
        let mut free = self.free.lock();
        if let Some(mut entity) = free[kind.index()].pop() {
            entity.reset(x, y, context);
            debug!(kind = %kind, id = entity.id().0, "reused entity from pool");
            return entity;
        }
        let entity = Entity::new(kind, x, y, self.entity_size, context);
        debug!(kind = %kind, id = entity.id().0, "created entity");
        entity
    }

    /// Same as `acquire`, keyed by wire tag (`B`, `J`, `H`, `fuel`, `missile`).
    pub fn acquire_tagged(
        &self,
        tag: &str,
        x: f32,
        y: f32,
        context: Option<ContextId>,
    ) -> Result<Entity, GameError> {
        let kind = tag.parse::<EntityKind>()?;
        Ok(self.acquire(kind, x, y, context))
    }

    pub fn release(&self, mut entity: Entity) -> Release {
        let kind = entity.kind();
        entity.active = false;
        let mut free = self.free.lock();
        let list = &mut free[kind.index()];
        if list.len() < self.capacities[kind.index()] {
            debug!(kind = %kind, id = entity.id().0, "released entity to pool");
            list.push(entity);
            Release::Pooled
        } else {
            debug!(kind = %kind, id = entity.id().0, "pool full, discarding entity");
            Release::Discarded
        }
    }

    pub fn release_all(&self, entities: impl IntoIterator<Item = Entity>) -> usize {
        entities
            .into_iter()
            .map(|entity| self.release(entity))
            .filter(|outcome| *outcome == Release::Pooled)
            .count()
    }

    pub fn free_count(&self, kind: EntityKind) -> usize {
        self.free.lock()[kind.index()].len()
    }

    pub fn capacity(&self, kind: EntityKind) -> usize {
        self.capacities[kind.index()]
    }
}
