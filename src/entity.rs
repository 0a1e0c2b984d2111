use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Direction, EntityKind, MissilePattern};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifies the game-logic session an enemy's behaviour belongs to.
/// A plain value, so pooled enemies never keep a session alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Half-open AABB test: shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub size: Size,
}

impl Player {
    pub fn new(x: f32, y: f32, size: Size) -> Self {
        Self { x, y, size }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.size.width,
            height: self.size.height,
        }
    }

    pub fn step(&mut self, direction: Direction, board_width: i32) {
        let max_x = (board_width - 1).max(0) as f32;
        self.x = (self.x + direction.dx()).clamp(0.0, max_x);
    }
}

/// A pooled entity: enemy, fuel depot or missile.
///
/// Only `EntityPool` constructs these, so every instance has a unique id and
/// a kind tag that never changes.
#[derive(Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub size: Size,
    pub(crate) active: bool,
    pub(crate) context: Option<ContextId>,
    pub(crate) pattern: MissilePattern,
}

impl Entity {
    pub(crate) fn new(
        kind: EntityKind,
        x: f32,
        y: f32,
        size: Size,
        context: Option<ContextId>,
    ) -> Self {
        Self {
            id: EntityId::next(),
            kind,
            x,
            y,
            size,
            active: true,
            context: if kind.supports_context() { context } else { None },
            pattern: MissilePattern::Straight,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    pub fn pattern(&self) -> MissilePattern {
        self.pattern
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.size.width,
            height: self.size.height,
        }
    }

    pub(crate) fn reset(&mut self, x: f32, y: f32, context: Option<ContextId>) {
        self.x = x;
        self.y = y;
        self.active = true;
        if self.kind.supports_context() {
            self.context = context;
        }
    }
}
