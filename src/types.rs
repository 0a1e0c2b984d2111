use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::GameError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn dx(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Every poolable entity carries one of these from construction on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    EnemyB,
    EnemyJ,
    EnemyH,
    FuelDepot,
    Missile,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::EnemyB,
        EntityKind::EnemyJ,
        EntityKind::EnemyH,
        EntityKind::FuelDepot,
        EntityKind::Missile,
    ];

    pub const ENEMIES: [EntityKind; 3] = [EntityKind::EnemyB, EntityKind::EnemyJ, EntityKind::EnemyH];

    pub fn index(self) -> usize {
        match self {
            Self::EnemyB => 0,
            Self::EnemyJ => 1,
            Self::EnemyH => 2,
            Self::FuelDepot => 3,
            Self::Missile => 4,
        }
    }

    /// Wire tag, as sent to clients and accepted by `EntityPool::acquire_tagged`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnemyB => "B",
            Self::EnemyJ => "J",
            Self::EnemyH => "H",
            Self::FuelDepot => "fuel",
            Self::Missile => "missile",
        }
    }

    pub fn is_enemy(self) -> bool {
        matches!(self, Self::EnemyB | Self::EnemyJ | Self::EnemyH)
    }

    /// Only enemies run behaviour callbacks, so only they keep a context.
    pub fn supports_context(self) -> bool {
        self.is_enemy()
    }
}

impl FromStr for EntityKind {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "B" => Ok(Self::EnemyB),
            "J" => Ok(Self::EnemyJ),
            "H" => Ok(Self::EnemyH),
            "fuel" => Ok(Self::FuelDepot),
            "missile" => Ok(Self::Missile),
            other => Err(GameError::UnknownEntityKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissilePattern {
    #[default]
    Straight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Running,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnemyView {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct MissileView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub pattern: MissilePattern,
}

#[derive(Clone, Debug, Serialize)]
pub struct FuelDepotView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

/// Owned copy of the world, safe to hold after the state lock is dropped.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub missiles: Vec<MissileView>,
    pub fuel_depots: Vec<FuelDepotView>,
    pub score: u32,
    pub lives: u32,
    pub fuel: u32,
    pub phase: GamePhase,
    pub game_running: bool,
}
