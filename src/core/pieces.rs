//! Tetromino cell offsets and rotation kick tables.
//!
//! Each shape lists its four cell offsets from the anchor, per facing.
//! Rotation correction follows the SRS offset scheme: each shape carries a
//! per-facing row of five offsets, and the candidate kick for a rotation is
//! the entry-wise difference between the from-facing row and the to-facing
//! row. The O piece's rows are constant, so all five candidates collapse
//! into one trivial correction.

use crate::types::{Coord, Facing, Tet, KICK_TRIES};

const fn c(u: i8, v: i8) -> Coord {
    Coord::new(u, v)
}

/// Cell offsets, indexed by `[tet][facing]`
const OFFSETS: [[[Coord; 4]; 4]; 7] = [
    // Z
    [
        [c(0, 0), c(1, 0), c(0, 1), c(-1, 1)],
        [c(0, 0), c(0, -1), c(1, 0), c(1, 1)],
        [c(0, 0), c(0, -1), c(1, -1), c(-1, 0)],
        [c(0, 0), c(-1, 0), c(-1, -1), c(0, 1)],
    ],
    // L
    [
        [c(0, 0), c(-1, 0), c(1, 0), c(1, 1)],
        [c(0, 0), c(0, -1), c(1, -1), c(0, 1)],
        [c(0, 0), c(-1, 0), c(1, 0), c(-1, -1)],
        [c(0, 0), c(0, -1), c(0, 1), c(-1, 1)],
    ],
    // O
    [
        [c(0, 0), c(0, 1), c(1, 0), c(1, 1)],
        [c(0, 0), c(0, -1), c(1, 0), c(1, -1)],
        [c(0, 0), c(0, -1), c(-1, 0), c(-1, -1)],
        [c(0, 0), c(0, 1), c(-1, 0), c(-1, 1)],
    ],
    // S
    [
        [c(0, 0), c(-1, 0), c(0, 1), c(1, 1)],
        [c(0, 0), c(0, 1), c(1, 0), c(1, -1)],
        [c(0, 0), c(1, 0), c(0, -1), c(-1, -1)],
        [c(0, 0), c(0, -1), c(-1, 0), c(-1, 1)],
    ],
    // I
    [
        [c(0, 0), c(-1, 0), c(1, 0), c(2, 0)],
        [c(0, 0), c(0, 1), c(0, -1), c(0, -2)],
        [c(0, 0), c(1, 0), c(-1, 0), c(-2, 0)],
        [c(0, 0), c(0, -1), c(0, 1), c(0, 2)],
    ],
    // J
    [
        [c(0, 0), c(1, 0), c(-1, 0), c(-1, 1)],
        [c(0, 0), c(0, -1), c(0, 1), c(1, 1)],
        [c(0, 0), c(-1, 0), c(1, 0), c(1, -1)],
        [c(0, 0), c(0, 1), c(0, -1), c(-1, -1)],
    ],
    // T
    [
        [c(0, 0), c(-1, 0), c(1, 0), c(0, 1)],
        [c(0, 0), c(0, 1), c(1, 0), c(0, -1)],
        [c(0, 0), c(1, 0), c(0, -1), c(-1, 0)],
        [c(0, 0), c(-1, 0), c(0, -1), c(0, 1)],
    ],
];

type KickTable = [[Coord; KICK_TRIES]; 4];

/// Shared by Z, L, S, J, T
const ZLSJT_KICKS: KickTable = [
    [c(0, 0), c(0, 0), c(0, 0), c(0, 0), c(0, 0)],
    [c(0, 0), c(1, 0), c(1, -1), c(0, 2), c(1, 2)],
    [c(0, 0), c(0, 0), c(0, 0), c(0, 0), c(0, 0)],
    [c(0, 0), c(-1, 0), c(-1, -1), c(0, 2), c(-1, 2)],
];

const I_KICKS: KickTable = [
    [c(0, 0), c(-1, 0), c(2, 0), c(-1, 0), c(2, 0)],
    [c(-1, 0), c(0, 0), c(0, 0), c(0, 1), c(0, -2)],
    [c(-1, 1), c(1, 1), c(-2, 1), c(1, 0), c(-2, 0)],
    [c(0, 1), c(0, 1), c(0, 1), c(0, -1), c(0, 2)],
];

const O_KICKS: KickTable = [
    [c(0, 0), c(0, 0), c(0, 0), c(0, 0), c(0, 0)],
    [c(0, -1), c(0, -1), c(0, -1), c(0, -1), c(0, -1)],
    [c(-1, -1), c(-1, -1), c(-1, -1), c(-1, -1), c(-1, -1)],
    [c(-1, 0), c(-1, 0), c(-1, 0), c(-1, 0), c(-1, 0)],
];

/// Get the cell offsets for a piece kind and facing
pub fn offsets(tet: Tet, facing: Facing) -> [Coord; 4] {
    OFFSETS[tet.as_u8() as usize][facing.index()]
}

fn kick_table(tet: Tet) -> &'static KickTable {
    match tet {
        Tet::I => &I_KICKS,
        Tet::O => &O_KICKS,
        _ => &ZLSJT_KICKS,
    }
}

/// Kick candidate for rotating `tet` from one facing to another.
/// `try_index` ranges over `0..KICK_TRIES`; the first candidate that does
/// not collide wins.
pub fn kick_offset(tet: Tet, from: Facing, to: Facing, try_index: usize) -> Coord {
    let table = kick_table(tet);
    let a = table[from.index()][try_index];
    let b = table[to.index()][try_index];
    Coord::new(a.u - b.u, a.v - b.v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_anchor_cell() {
        for tet in Tet::ALL {
            for facing in [Facing::Up, Facing::Right, Facing::Down, Facing::Left] {
                assert!(offsets(tet, facing).contains(&c(0, 0)));
            }
        }
    }

    #[test]
    fn i_piece_is_a_line() {
        let cells = offsets(Tet::I, Facing::Up);
        assert!(cells.iter().all(|o| o.v == 0));
        let cells = offsets(Tet::I, Facing::Right);
        assert!(cells.iter().all(|o| o.u == 0));
    }

    #[test]
    fn o_kicks_collapse_to_single_candidate() {
        for try_index in 0..KICK_TRIES {
            let k = kick_offset(Tet::O, Facing::Up, Facing::Right, try_index);
            assert_eq!(k, c(0, 1));
        }
        for try_index in 0..KICK_TRIES {
            let k = kick_offset(Tet::O, Facing::Right, Facing::Down, try_index);
            assert_eq!(k, c(1, 0));
        }
    }

    #[test]
    fn zlsjt_first_kick_is_pure_rotation() {
        assert_eq!(kick_offset(Tet::T, Facing::Up, Facing::Right, 0), c(0, 0));
        assert_eq!(kick_offset(Tet::T, Facing::Up, Facing::Right, 1), c(-1, 0));
    }
}
