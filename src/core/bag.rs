//! Bag module - 7-bag random piece supply
//!
//! Implements the "7-bag" discipline: a bag holds one of each tetromino,
//! drawn without repetition, and is refilled as a whole new shuffled bag
//! on exhaustion. Draws feed a lookahead queue kept at minimum depth so
//! the presentation layer can show upcoming pieces.
//!
//! Randomness is a seeded LCG, so engines are fully deterministic per seed.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::types::{Tet, QUEUE_MIN_DEPTH};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // A zero seed would lock the low bits; nudge it.
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Piece supply: shuffled 7-bag feeding a lookahead queue
#[derive(Debug, Clone)]
pub struct BagQueue {
    bag: ArrayVec<Tet, 7>,
    queue: VecDeque<Tet>,
    rng: SimpleRng,
}

impl BagQueue {
    pub fn new(seed: u32) -> Self {
        let mut bq = Self {
            bag: ArrayVec::new(),
            queue: VecDeque::with_capacity(QUEUE_MIN_DEPTH + 1),
            rng: SimpleRng::new(seed),
        };
        bq.top_up();
        bq
    }

    fn refill_bag(&mut self) {
        self.bag.clear();
        self.bag.extend(Tet::ALL);
        self.rng.shuffle(&mut self.bag);
    }

    fn top_up(&mut self) {
        while self.queue.len() < QUEUE_MIN_DEPTH {
            if self.bag.is_empty() {
                self.refill_bag();
            }
            let t = self.bag.pop().unwrap();
            self.queue.push_back(t);
        }
    }

    /// Draw the next piece, keeping the lookahead queue at depth
    pub fn draw(&mut self) -> Tet {
        self.top_up();
        let next = self.queue.pop_front().unwrap();
        self.top_up();
        next
    }

    /// Upcoming pieces, soonest first
    pub fn preview(&self) -> impl Iterator<Item = Tet> + '_ {
        self.queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_holds_minimum_depth() {
        let bq = BagQueue::new(42);
        assert!(bq.preview().count() >= QUEUE_MIN_DEPTH);
    }

    #[test]
    fn fourteen_draws_cover_each_shape_twice() {
        let mut bq = BagQueue::new(7);
        let mut counts = [0u8; 7];
        for _ in 0..14 {
            counts[bq.draw().as_u8() as usize] += 1;
        }
        assert_eq!(counts, [2; 7]);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = BagQueue::new(1234);
        let mut b = BagQueue::new(1234);
        for _ in 0..21 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn first_seven_draws_are_a_permutation() {
        let mut bq = BagQueue::new(99);
        let mut counts = [0u8; 7];
        for _ in 0..7 {
            counts[bq.draw().as_u8() as usize] += 1;
        }
        assert_eq!(counts, [1; 7]);
    }
}
