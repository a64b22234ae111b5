//! Wire codec tests - round trips across the full value ranges

use proptest::prelude::*;

use netris::core::Board;
use netris::types::{Attack, Cell, Facing, Side, Tet, COLUMNS};
use netris::wire::{
    decode_header, decode_payload, encode_to_vec, Message, Payload, PieceState, HEADER_SIZE,
};

fn decode_bytes(bytes: &[u8]) -> Message {
    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = decode_header(&header_buf).expect("header");
    decode_payload(&header, &bytes[HEADER_SIZE..]).expect("payload")
}

proptest! {
    #[test]
    fn piece_state_round_trips(
        side in 0u8..2,
        tet in 0u8..7,
        facing in 0u8..4,
        u in any::<i8>(),
        v in any::<i8>(),
        drop_row in any::<i8>(),
        is_drop in any::<bool>(),
    ) {
        let state = PieceState {
            tet: Tet::from_u8(tet).unwrap(),
            facing: Facing::from_u8(facing).unwrap(),
            u,
            v,
            drop_row,
        };
        let payload = if is_drop {
            Payload::Drop(state)
        } else {
            Payload::Move(state)
        };
        let message = Message::new(Side::from_u8(side).unwrap(), payload);
        prop_assert_eq!(decode_bytes(&encode_to_vec(&message)), message);
    }

    #[test]
    fn attack_round_trips(side in 0u8..2, rows in any::<u8>(), column in any::<u8>()) {
        let message = Message::new(
            Side::from_u8(side).unwrap(),
            Payload::Attack(Attack { rows, column }),
        );
        prop_assert_eq!(decode_bytes(&encode_to_vec(&message)), message);
    }

    #[test]
    fn field_round_trips(cells in proptest::collection::vec(0u8..9, 400)) {
        let mut board = Board::new();
        for (i, &b) in cells.iter().enumerate() {
            let u = (i % COLUMNS as usize) as i8;
            let v = (i / COLUMNS as usize) as i8;
            board.set(u, v, Cell::from_u8(b).unwrap());
        }
        let message = Message::new(Side::Zero, Payload::Field(board));
        prop_assert_eq!(decode_bytes(&encode_to_vec(&message)), message);
    }

    #[test]
    fn header_decode_never_panics(bytes in any::<[u8; HEADER_SIZE]>()) {
        let _ = decode_header(&bytes);
    }
}

#[test]
fn side_assign_round_trips() {
    for side in Side::ALL {
        let message = Message::new(side, Payload::SideAssign);
        let bytes = encode_to_vec(&message);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(decode_bytes(&bytes), message);
    }
}

#[test]
fn corrupt_payload_bytes_are_rejected() {
    let state = PieceState {
        tet: Tet::T,
        facing: Facing::Up,
        u: 4,
        v: 20,
        drop_row: 0,
    };
    let mut bytes = encode_to_vec(&Message::new(Side::Zero, Payload::Move(state)));
    bytes[HEADER_SIZE] = 200; // not a tetromino

    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = decode_header(&header_buf).expect("header still fine");
    assert!(decode_payload(&header, &bytes[HEADER_SIZE..]).is_err());
}
