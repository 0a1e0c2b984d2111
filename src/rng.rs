use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Spawn decisions for one ticker. Seeded, so a run replays exactly.
#[derive(Clone, Debug)]
pub struct SpawnRng {
    inner: StdRng,
}

impl SpawnRng {
    pub fn new(seed: u32) -> Self {
        Self {
            inner: StdRng::seed_from_u64(u64::from(seed)),
        }
    }

    /// A column in `0..board_width`; 0 on a board one cell wide.
    pub fn column(&mut self, board_width: i32) -> i32 {
        if board_width <= 1 {
            return 0;
        }
        self.inner.random_range(0..board_width)
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.inner.random_bool(f64::from(probability))
    }

    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        items.choose(&mut self.inner).copied()
    }
}
