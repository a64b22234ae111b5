//! Frame module - one side's complete game state and physics
//!
//! A `Frame` ties together board, piece supply, active piece, hold slot,
//! scoring, gravity, and the pending garbage queue. It is deterministic:
//! all randomness comes from the construction seed, all time from the
//! caller's tick milliseconds, so two frames fed the same inputs agree.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::core::bag::{BagQueue, SimpleRng};
use crate::core::board::Board;
use crate::core::pieces;
use crate::core::scoring;
use crate::types::{
    Attack, Cell, Coord, Facing, GameEvent, Side, Tet, COLUMNS, LOCK_DELAY_MS, LOCK_MOVE_LIMIT,
    KICK_TRIES, SPAWN_U, SPAWN_V,
};

/// Lock-delay bookkeeping: once a piece grounds it may float for a bounded
/// time and a bounded number of successful moves before forced placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockDelay {
    pub locking: bool,
    pub elapsed_ms: u32,
    pub moves: u8,
}

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub tet: Tet,
    pub pos: Coord,
    pub facing: Facing,
    /// Lowest non-colliding row reachable by pure vertical translation
    pub drop_row: i8,
    pub lock: LockDelay,
}

impl Piece {
    /// Create a piece at the spawn anchor
    pub fn new(tet: Tet) -> Self {
        Self {
            tet,
            pos: Coord::new(SPAWN_U, SPAWN_V),
            facing: Facing::Up,
            drop_row: SPAWN_V,
            lock: LockDelay::default(),
        }
    }

    /// Absolute board coordinates of the four cells.
    /// Wire-supplied anchors can sit at the i8 extremes; wrapping keeps the
    /// addition total, and a wrapped cell always lands out of bounds.
    pub fn cells(&self) -> [Coord; 4] {
        let mut out = pieces::offsets(self.tet, self.facing);
        for o in &mut out {
            o.u = self.pos.u.wrapping_add(o.u);
            o.v = self.pos.v.wrapping_add(o.v);
        }
        out
    }
}

fn collides(board: &Board, tet: Tet, facing: Facing, pos: Coord) -> bool {
    pieces::offsets(tet, facing)
        .iter()
        .any(|o| !board.is_free(pos.u.wrapping_add(o.u), pos.v.wrapping_add(o.v)))
}

/// Lowest row the piece can reach by falling straight down from `pos`
fn compute_drop_row(board: &Board, tet: Tet, facing: Facing, pos: Coord) -> i8 {
    let mut v = pos.v;
    while !collides(board, tet, facing, Coord::new(pos.u, v - 1)) {
        v -= 1;
    }
    v
}

/// What a lock did: the piece that was written, rows cleared, garbage rows
/// taken, and the attack this clear sends to the opponent (if any)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockSummary {
    pub placed: Option<Piece>,
    pub cleared: u8,
    pub garbage_rows: u8,
    pub outgoing: Option<Attack>,
}

/// Result of feeding one input event to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing changed (rejected move, unusable swap, no piece)
    Ignored,
    /// The piece moved, rotated, or was swapped
    Moved,
    /// The piece locked into the board
    Locked(LockSummary),
}

/// One side's complete game state
#[derive(Debug, Clone)]
pub struct Frame {
    board: Board,
    bag: BagQueue,
    piece: Option<Piece>,
    held: Option<Tet>,
    /// Swap already used for the current piece
    swapped: bool,
    points: u32,
    level: u32,
    gravity_ms: u32,
    garbage: VecDeque<Attack>,
    attack_rng: SimpleRng,
    game_over: bool,
}

impl Frame {
    /// Create an idle frame (no active piece until `start`)
    pub fn new(seed: u32) -> Self {
        Self {
            board: Board::new(),
            bag: BagQueue::new(seed),
            piece: None,
            held: None,
            swapped: false,
            points: 0,
            level: 1,
            gravity_ms: 0,
            garbage: VecDeque::new(),
            attack_rng: SimpleRng::new(seed ^ 0x9e37_79b9),
            game_over: false,
        }
    }

    /// Spawn the first piece
    pub fn start(&mut self) -> bool {
        self.spawn_next()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn held(&self) -> Option<Tet> {
        self.held
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Upcoming pieces, soonest first
    pub fn preview(&self) -> impl Iterator<Item = Tet> + '_ {
        self.bag.preview()
    }

    pub fn pending_garbage(&self) -> usize {
        self.garbage.len()
    }

    /// Replace the whole board (authoritative network state for this side)
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// Replace the active piece (authoritative network state for this side)
    pub fn set_piece(&mut self, piece: Piece) {
        self.piece = Some(piece);
    }

    /// Queue an attack; it is applied when this side's piece locks
    pub fn queue_attack(&mut self, attack: Attack) {
        self.garbage.push_back(attack);
    }

    fn respawn(&mut self, tet: Tet) -> bool {
        let mut piece = Piece::new(tet);
        if collides(&self.board, piece.tet, piece.facing, piece.pos) {
            self.piece = None;
            self.game_over = true;
            return false;
        }
        piece.drop_row = compute_drop_row(&self.board, piece.tet, piece.facing, piece.pos);
        self.piece = Some(piece);
        true
    }

    /// Draw the next piece from the queue and spawn it.
    /// Returns false (and sets game over) when the spawn cell is blocked.
    pub fn spawn_next(&mut self) -> bool {
        self.swapped = false;
        let tet = self.bag.draw();
        self.respawn(tet)
    }

    /// Exchange the current piece with the hold slot (drawing fresh when
    /// the slot is empty). Usable at most once per piece lifetime.
    pub fn swap_hold(&mut self) -> bool {
        if self.game_over || self.swapped {
            return false;
        }
        let Some(piece) = self.piece else {
            return false;
        };
        let tet = match self.held.replace(piece.tet) {
            Some(held) => held,
            None => self.bag.draw(),
        };
        if !self.respawn(tet) {
            return false;
        }
        self.swapped = true;
        true
    }

    /// Attempt a move: `offset` is a coordinate delta, `rotation` a number
    /// of quarter turns in {0, 1, -1, 2}. Rotations try the target facing
    /// plus each kick candidate in order; the first non-colliding candidate
    /// is accepted, otherwise the piece is left unchanged.
    pub fn try_move(&mut self, offset: Coord, rotation: i8) -> bool {
        if self.game_over {
            return false;
        }
        let Some(piece) = self.piece else {
            return false;
        };
        let to_facing = piece.facing.rotated(rotation);
        let tries = if rotation == 0 { 1 } else { KICK_TRIES };

        for try_index in 0..tries {
            let mut pos = Coord::new(piece.pos.u + offset.u, piece.pos.v + offset.v);
            if rotation != 0 {
                let kick = pieces::kick_offset(piece.tet, piece.facing, to_facing, try_index);
                pos.u += kick.u;
                pos.v += kick.v;
            }
            if collides(&self.board, piece.tet, to_facing, pos) {
                continue;
            }

            let mut moved = piece;
            moved.pos = pos;
            moved.facing = to_facing;
            if offset.u != 0 || rotation != 0 {
                moved.drop_row = compute_drop_row(&self.board, moved.tet, moved.facing, moved.pos);
            }
            if moved.lock.locking {
                moved.lock.moves = moved.lock.moves.saturating_add(1);
                moved.lock.elapsed_ms = 0;
            }
            self.piece = Some(moved);
            return true;
        }
        false
    }

    fn grounded(&self) -> bool {
        match self.piece {
            Some(p) => collides(
                &self.board,
                p.tet,
                p.facing,
                Coord::new(p.pos.u, p.pos.v - 1),
            ),
            None => false,
        }
    }

    fn lock_expired(lock: &LockDelay) -> bool {
        lock.elapsed_ms >= LOCK_DELAY_MS || lock.moves >= LOCK_MOVE_LIMIT
    }

    /// A downward attempt was blocked: start the lock clock, or place the
    /// piece when the grace is already exhausted.
    fn on_grounded(&mut self) -> Option<LockSummary> {
        let Some(mut piece) = self.piece else {
            return None;
        };
        if !piece.lock.locking {
            piece.lock.locking = true;
            piece.lock.elapsed_ms = 0;
            piece.lock.moves = 0;
            self.piece = Some(piece);
            return None;
        }
        if Self::lock_expired(&piece.lock) {
            self.piece = Some(piece);
            return Some(self.lock_in_place());
        }
        self.piece = Some(piece);
        None
    }

    fn lock_in_place(&mut self) -> LockSummary {
        let summary = self.place_current();
        self.spawn_next();
        summary
    }

    /// Advance timers by `elapsed_ms`: accrue lock delay, fire gravity when
    /// due, and place the piece when its grace runs out.
    pub fn tick(&mut self, elapsed_ms: u32) -> Option<LockSummary> {
        if self.game_over {
            return None;
        }
        let Some(mut piece) = self.piece else {
            return None;
        };
        if piece.lock.locking {
            piece.lock.elapsed_ms = piece.lock.elapsed_ms.saturating_add(elapsed_ms);
        }
        self.piece = Some(piece);

        self.gravity_ms = self.gravity_ms.saturating_add(elapsed_ms);
        if self.gravity_ms >= scoring::gravity_interval_ms(self.level) {
            self.gravity_ms = 0;
            if !self.try_move(Coord::new(0, -1), 0) {
                return self.on_grounded();
            }
        }

        // Grace can also run out between gravity attempts.
        if let Some(p) = self.piece {
            if p.lock.locking && Self::lock_expired(&p.lock) && self.grounded() {
                return Some(self.lock_in_place());
            }
        }
        None
    }

    /// Teleport the piece to its drop row and lock it immediately
    pub fn hard_drop(&mut self) -> Option<LockSummary> {
        let Some(mut piece) = self.piece else {
            return None;
        };
        piece.pos.v = piece.drop_row;
        self.piece = Some(piece);
        self.swapped = false;
        Some(self.lock_in_place())
    }

    /// Write the current piece into the board, clear its full rows, score,
    /// and apply pending garbage (FIFO). Leaves no active piece; callers
    /// that own the side spawn the next piece afterwards.
    ///
    /// This is also the relay's bookkeeping entry point for Drop messages.
    pub fn place_current(&mut self) -> LockSummary {
        let Some(piece) = self.piece.take() else {
            return LockSummary::default();
        };

        let cells = piece.cells();
        for c in &cells {
            self.board.set(c.u, c.v, Cell::Tet(piece.tet));
        }

        let mut rows: ArrayVec<i8, 4> = ArrayVec::new();
        for c in &cells {
            rows.push(c.v);
        }
        let cleared = self.board.clear_lines(&rows);

        self.points += scoring::line_clear_points(cleared);
        if self.points > scoring::next_level_threshold(self.level) {
            self.level += 1;
        }

        let mut garbage_rows = 0u8;
        while let Some(attack) = self.garbage.pop_front() {
            self.board.inject_garbage(attack.rows, attack.column);
            garbage_rows = garbage_rows.saturating_add(attack.rows);
        }

        let outgoing = (cleared >= 2).then(|| Attack {
            rows: cleared - 1,
            column: self.attack_rng.next_range(COLUMNS as u32) as u8,
        });

        LockSummary {
            placed: Some(piece),
            cleared,
            garbage_rows,
            outgoing,
        }
    }

    /// Feed one abstract input event
    pub fn apply_event(&mut self, event: GameEvent) -> EventOutcome {
        let moved = |ok: bool| if ok { EventOutcome::Moved } else { EventOutcome::Ignored };
        match event {
            GameEvent::Left => moved(self.try_move(Coord::new(-1, 0), 0)),
            GameEvent::Right => moved(self.try_move(Coord::new(1, 0), 0)),
            GameEvent::Down => {
                if self.try_move(Coord::new(0, -1), 0) {
                    EventOutcome::Moved
                } else {
                    match self.on_grounded() {
                        Some(summary) => EventOutcome::Locked(summary),
                        None => EventOutcome::Ignored,
                    }
                }
            }
            GameEvent::Drop => match self.hard_drop() {
                Some(summary) => EventOutcome::Locked(summary),
                None => EventOutcome::Ignored,
            },
            GameEvent::SpinCw => moved(self.try_move(Coord::new(0, 0), 1)),
            GameEvent::SpinCcw => moved(self.try_move(Coord::new(0, 0), -1)),
            GameEvent::Spin180 => moved(self.try_move(Coord::new(0, 0), 2)),
            GameEvent::Swap => moved(self.swap_hold()),
        }
    }
}

/// The authoritative per-side state table, explicitly owned and passed
/// into engine and network code (no process-global side state).
#[derive(Debug, Clone)]
pub struct FrameTable {
    frames: [Frame; 2],
}

impl FrameTable {
    /// Seed each side's frame independently so their bags shuffle apart
    pub fn new(seed: u32) -> Self {
        Self {
            frames: [
                Frame::new(seed),
                Frame::new(seed.wrapping_add(0x6a09_e667)),
            ],
        }
    }

    pub fn get(&self, side: Side) -> &Frame {
        &self.frames[side.index()]
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Frame {
        &mut self.frames[side.index()]
    }
}
