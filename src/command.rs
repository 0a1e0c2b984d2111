use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::GameError;
use crate::game_state::GameState;
use crate::pool::EntityPool;
use crate::types::{Direction, EntityKind, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Shoot,
    Restart,
}

pub fn parse_command(raw: &str) -> Result<Command, GameError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| GameError::InvalidMessage(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| GameError::InvalidMessage("expected a JSON object".to_string()))?;
    let action = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| GameError::InvalidMessage("missing string field `action`".to_string()))?;

    match action {
        "move" => {
            let direction = object
                .get("direction")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    GameError::InvalidMessage("missing string field `direction`".to_string())
                })?;
            Direction::parse_move(direction)
                .map(Command::Move)
                .ok_or_else(|| GameError::UnknownDirection(direction.to_string()))
        }
        "shoot" => Ok(Command::Shoot),
        "restart" => Ok(Command::Restart),
        other => Err(GameError::UnknownAction(other.to_string())),
    }
}

/// Applies client commands. Pool calls always happen outside the state lock.
pub struct CommandHandler {
    state: Arc<GameState>,
    pool: Arc<EntityPool>,
}

impl CommandHandler {
    pub fn new(state: Arc<GameState>, pool: Arc<EntityPool>) -> Self {
        Self { state, pool }
    }

    pub fn handle(&self, command: Command) -> Snapshot {
        match command {
            Command::Move(direction) => {
                let mut world = self.state.lock();
                if world.is_running() {
                    world.move_player(direction);
                }
                world.snapshot()
            }
            Command::Shoot => self.shoot(),
            Command::Restart => self.restart(),
        }
    }

    fn shoot(&self) -> Snapshot {
        let origin = {
            let world = self.state.lock();
            if !world.is_running() {
                return world.snapshot();
            }
            let player = world.player();
            (player.x, player.y - 1.0)
        };

        let missile = self.pool.acquire(EntityKind::Missile, origin.0, origin.1, None);
        let (snapshot, rejected) = {
            let mut world = self.state.lock();
            if world.is_running() {
                world.insert(missile);
                (world.snapshot(), None)
            } else {
                (world.snapshot(), Some(missile))
            }
        };
        if let Some(missile) = rejected {
            debug!(id = missile.id().0, "game ended before missile launch");
            self.pool.release(missile);
        }
        snapshot
    }

    fn restart(&self) -> Snapshot {
        if self.state.is_running() {
            return self.state.snapshot();
        }
        let drained = self.state.reset();
        self.pool.release_all(drained);
        self.state.snapshot()
    }
}
