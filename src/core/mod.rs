//! Core module - pure game logic with no external dependencies
//!
//! Board rules, piece physics, randomization, and scoring live here.
//! Nothing in this module touches I/O, networking, or the clock; callers
//! supply seeds and elapsed milliseconds.

pub mod bag;
pub mod board;
pub mod frame;
pub mod pieces;
pub mod scoring;

// Re-export commonly used types
pub use bag::{BagQueue, SimpleRng};
pub use board::{Board, CELL_COUNT};
pub use frame::{EventOutcome, Frame, FrameTable, LockDelay, LockSummary, Piece};
