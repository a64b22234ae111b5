//! Board tests - bounds, line clears, garbage injection

use netris::core::Board;
use netris::types::{Cell, Tet, COLUMNS, ROWS};

#[test]
fn new_board_is_empty() {
    let board = Board::new();
    for v in 0..ROWS as i8 {
        for u in 0..COLUMNS as i8 {
            assert!(board.is_free(u, v), "cell ({u}, {v}) should be free");
        }
    }
    assert_eq!(board.filled_cells(), 0);
}

#[test]
fn out_of_bounds_get_and_set() {
    let mut board = Board::new();
    assert_eq!(board.get(-1, 0), None);
    assert_eq!(board.get(0, -1), None);
    assert_eq!(board.get(COLUMNS as i8, 0), None);
    assert_eq!(board.get(0, ROWS as i8), None);
    assert!(!board.set(-1, 0, Cell::Garbage));
    assert!(!board.set(0, ROWS as i8, Cell::Garbage));
}

#[test]
fn set_and_get_round_trip() {
    let mut board = Board::new();
    assert!(board.set(5, 10, Cell::Tet(Tet::T)));
    assert_eq!(board.get(5, 10), Some(Cell::Tet(Tet::T)));
    assert!(board.is_occupied(5, 10));
    assert!(!board.is_free(5, 10));

    assert!(board.set(5, 10, Cell::Empty));
    assert!(board.is_free(5, 10));
}

fn fill_row(board: &mut Board, v: i8) {
    for u in 0..COLUMNS as i8 {
        board.set(u, v, Cell::Tet(Tet::I));
    }
}

#[test]
fn clear_single_line_shifts_rows_down() {
    let mut board = Board::new();
    fill_row(&mut board, 0);
    board.set(3, 1, Cell::Tet(Tet::J));
    board.set(7, 2, Cell::Tet(Tet::L));

    let cleared = board.clear_lines(&[0, 1]);
    assert_eq!(cleared, 1);
    // Rows above drop by one
    assert_eq!(board.get(3, 0), Some(Cell::Tet(Tet::J)));
    assert_eq!(board.get(7, 1), Some(Cell::Tet(Tet::L)));
    assert_eq!(board.filled_cells(), 2);
}

#[test]
fn clear_multiple_lines_conserves_cells_above() {
    let mut board = Board::new();
    fill_row(&mut board, 0);
    fill_row(&mut board, 1);
    fill_row(&mut board, 3);
    board.set(0, 2, Cell::Tet(Tet::S));
    board.set(9, 4, Cell::Tet(Tet::Z));
    let filled_before = board.filled_cells();

    // Candidate rows include duplicates and a non-full row
    let cleared = board.clear_lines(&[0, 0, 1, 3]);
    assert_eq!(cleared, 3);
    assert_eq!(board.filled_cells(), filled_before - 3 * COLUMNS as usize);

    // Row 2 had one cleared row below shifted past it twice, row 4 three times
    assert_eq!(board.get(0, 0), Some(Cell::Tet(Tet::S)));
    assert_eq!(board.get(9, 1), Some(Cell::Tet(Tet::Z)));
}

#[test]
fn clear_ignores_rows_that_are_not_full() {
    let mut board = Board::new();
    fill_row(&mut board, 5);
    board.set(0, 5, Cell::Empty);
    assert_eq!(board.clear_lines(&[5]), 0);
    assert_eq!(board.filled_cells(), COLUMNS as usize - 1);
}

#[test]
fn garbage_shifts_board_up_and_leaves_hole() {
    let mut board = Board::new();
    board.set(2, 0, Cell::Tet(Tet::O));

    board.inject_garbage(2, 4);

    // Old bottom row moved up by two
    assert_eq!(board.get(2, 2), Some(Cell::Tet(Tet::O)));
    for v in 0..2 {
        for u in 0..COLUMNS as i8 {
            let expected = if u == 4 { Cell::Empty } else { Cell::Garbage };
            assert_eq!(board.get(u, v), Some(expected), "({u}, {v})");
        }
    }
}

#[test]
fn garbage_rows_do_not_clear_as_lines() {
    let mut board = Board::new();
    board.inject_garbage(1, 0);
    // A garbage row has a hole, so it is never full
    assert!(!board.is_row_full(0));
    assert_eq!(board.clear_lines(&[0]), 0);
}
