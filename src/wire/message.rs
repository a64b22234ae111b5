//! Message framing: 4-byte header plus a typed, fixed-size payload.
//!
//! Header layout: `type: u8`, `side: u8`, `length: u16` in wire order.
//! Header decoding is fixed-size and unconditional; payload decoding
//! requires the caller to have buffered `length` bytes first. That split
//! is what lets the assembler resume on partial reads.

use crate::bswap;
use crate::core::board::{Board, CELL_COUNT};
use crate::core::frame::Piece;
use crate::types::{Attack, Cell, Facing, Side, Tet};

use super::error::{DecodeError, EncodeError, WireResult};

/// Header size in bytes
pub const HEADER_SIZE: usize = 4;

/// Fixed payload sizes per message type
pub const FIELD_SIZE: usize = CELL_COUNT;
pub const PIECE_SIZE: usize = 5;
pub const ATTACK_SIZE: usize = 2;

/// Largest encoded message (header + full board)
pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + FIELD_SIZE;

/// Wire message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Server grants the header's side to the receiving connection
    SideAssign,
    /// Full board snapshot for the header's side
    Field,
    /// Piece state update for the header's side
    Move,
    /// Piece state that locked (placement) for the header's side
    Drop,
    /// Garbage attack against the header's side
    Attack,
}

impl MessageType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(MessageType::SideAssign),
            1 => Some(MessageType::Field),
            2 => Some(MessageType::Move),
            3 => Some(MessageType::Drop),
            4 => Some(MessageType::Attack),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            MessageType::SideAssign => 0,
            MessageType::Field => 1,
            MessageType::Move => 2,
            MessageType::Drop => 3,
            MessageType::Attack => 4,
        }
    }

    /// Fixed payload size for this type
    pub fn payload_size(&self) -> usize {
        match self {
            MessageType::SideAssign => 0,
            MessageType::Field => FIELD_SIZE,
            MessageType::Move | MessageType::Drop => PIECE_SIZE,
            MessageType::Attack => ATTACK_SIZE,
        }
    }
}

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageType,
    pub side: Side,
    pub length: u16,
}

/// Piece state as carried on the wire (no lock bookkeeping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceState {
    pub tet: Tet,
    pub facing: Facing,
    pub u: i8,
    pub v: i8,
    pub drop_row: i8,
}

impl From<&Piece> for PieceState {
    fn from(p: &Piece) -> Self {
        Self {
            tet: p.tet,
            facing: p.facing,
            u: p.pos.u,
            v: p.pos.v,
            drop_row: p.drop_row,
        }
    }
}

impl From<PieceState> for Piece {
    fn from(s: PieceState) -> Self {
        let mut piece = Piece::new(s.tet);
        piece.facing = s.facing;
        piece.pos.u = s.u;
        piece.pos.v = s.v;
        piece.drop_row = s.drop_row;
        piece
    }
}

/// Typed payload, one active shape per message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    SideAssign,
    Field(Board),
    Move(PieceState),
    Drop(PieceState),
    Attack(Attack),
}

impl Payload {
    pub fn kind(&self) -> MessageType {
        match self {
            Payload::SideAssign => MessageType::SideAssign,
            Payload::Field(_) => MessageType::Field,
            Payload::Move(_) => MessageType::Move,
            Payload::Drop(_) => MessageType::Drop,
            Payload::Attack(_) => MessageType::Attack,
        }
    }
}

/// One complete wire message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub side: Side,
    pub payload: Payload,
}

impl Message {
    pub fn new(side: Side, payload: Payload) -> Self {
        Self { side, payload }
    }

    pub fn kind(&self) -> MessageType {
        self.payload.kind()
    }

    /// Total encoded size, header included
    pub fn encoded_size(&self) -> usize {
        HEADER_SIZE + self.kind().payload_size()
    }
}

/// Decode the fixed-size header. Never needs more than `HEADER_SIZE` bytes.
pub fn decode_header(buf: &[u8; HEADER_SIZE]) -> WireResult<Header> {
    let kind = MessageType::from_u8(buf[0]).ok_or(DecodeError::UnknownType(buf[0]))?;
    let side = Side::from_u8(buf[1]).ok_or(DecodeError::InvalidSide(buf[1]))?;
    let length = bswap::ntoh16(u16::from_ne_bytes([buf[2], buf[3]]));
    if length as usize != kind.payload_size() {
        return Err(DecodeError::LengthMismatch {
            kind,
            expected: kind.payload_size(),
            actual: length as usize,
        });
    }
    Ok(Header { kind, side, length })
}

fn decode_piece_state(buf: &[u8]) -> WireResult<PieceState> {
    let tet = Tet::from_u8(buf[0]).ok_or(DecodeError::InvalidTet(buf[0]))?;
    let facing = Facing::from_u8(buf[1]).ok_or(DecodeError::InvalidFacing(buf[1]))?;
    Ok(PieceState {
        tet,
        facing,
        u: buf[2] as i8,
        v: buf[3] as i8,
        drop_row: buf[4] as i8,
    })
}

fn decode_field(buf: &[u8]) -> WireResult<Board> {
    let mut board = Board::new();
    for (i, &b) in buf.iter().enumerate() {
        let cell = Cell::from_u8(b).ok_or(DecodeError::InvalidCell(b))?;
        let u = (i % crate::types::COLUMNS as usize) as i8;
        let v = (i / crate::types::COLUMNS as usize) as i8;
        board.set(u, v, cell);
    }
    Ok(board)
}

/// Decode a payload whose `header.length` bytes the caller has buffered
pub fn decode_payload(header: &Header, payload: &[u8]) -> WireResult<Message> {
    if payload.len() != header.length as usize {
        return Err(DecodeError::LengthMismatch {
            kind: header.kind,
            expected: header.length as usize,
            actual: payload.len(),
        });
    }
    let payload = match header.kind {
        MessageType::SideAssign => Payload::SideAssign,
        MessageType::Field => Payload::Field(decode_field(payload)?),
        MessageType::Move => Payload::Move(decode_piece_state(payload)?),
        MessageType::Drop => Payload::Drop(decode_piece_state(payload)?),
        MessageType::Attack => Payload::Attack(Attack {
            rows: payload[0],
            column: payload[1],
        }),
    };
    Ok(Message {
        side: header.side,
        payload,
    })
}

fn encode_piece_state(state: &PieceState, buf: &mut [u8]) {
    buf[0] = state.tet.as_u8();
    buf[1] = state.facing.as_u8();
    buf[2] = state.u as u8;
    buf[3] = state.v as u8;
    buf[4] = state.drop_row as u8;
}

/// Encode header and payload into `buf`, returning total bytes written
pub fn encode(message: &Message, buf: &mut [u8]) -> Result<usize, EncodeError> {
    let total = message.encoded_size();
    if buf.len() < total {
        return Err(EncodeError::BufferTooSmall {
            needed: total,
            available: buf.len(),
        });
    }

    let kind = message.kind();
    buf[0] = kind.as_u8();
    buf[1] = message.side.as_u8();
    let length = bswap::hton16(kind.payload_size() as u16).to_ne_bytes();
    buf[2] = length[0];
    buf[3] = length[1];

    let body = &mut buf[HEADER_SIZE..total];
    match &message.payload {
        Payload::SideAssign => {}
        Payload::Field(board) => {
            for (dst, cell) in body.iter_mut().zip(board.cells().iter()) {
                *dst = cell.as_u8();
            }
        }
        Payload::Move(state) | Payload::Drop(state) => encode_piece_state(state, body),
        Payload::Attack(attack) => {
            body[0] = attack.rows;
            body[1] = attack.column;
        }
    }
    Ok(total)
}

/// Encode into a fresh buffer (convenience for queueing)
pub fn encode_to_vec(message: &Message) -> Vec<u8> {
    let mut buf = vec![0u8; message.encoded_size()];
    let n = encode(message, &mut buf).expect("buffer sized from encoded_size");
    buf.truncate(n);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    fn round_trip(message: Message) {
        let bytes = encode_to_vec(&message);
        assert_eq!(bytes.len(), message.encoded_size());

        let mut header_buf = [0u8; HEADER_SIZE];
        header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = decode_header(&header_buf).expect("header decodes");
        assert_eq!(header.kind, message.kind());
        assert_eq!(header.side, message.side);

        let decoded = decode_payload(&header, &bytes[HEADER_SIZE..]).expect("payload decodes");
        assert_eq!(decoded, message);
    }

    #[test]
    fn side_assign_round_trip() {
        round_trip(Message::new(Side::One, Payload::SideAssign));
    }

    #[test]
    fn field_round_trip() {
        let mut board = Board::new();
        board.set(0, 0, Cell::Tet(Tet::T));
        board.set(9, 39, Cell::Garbage);
        board.set(4, 20, Cell::Tet(Tet::I));
        round_trip(Message::new(Side::Zero, Payload::Field(board)));
    }

    #[test]
    fn piece_state_round_trip_boundary_coords() {
        for (u, v, drop_row) in [(-128i8, 127i8, 0i8), (127, -128, -1), (4, 20, 19)] {
            let state = PieceState {
                tet: Tet::J,
                facing: Facing::Left,
                u,
                v,
                drop_row,
            };
            round_trip(Message::new(Side::Zero, Payload::Move(state)));
            round_trip(Message::new(Side::One, Payload::Drop(state)));
        }
    }

    #[test]
    fn attack_round_trip() {
        round_trip(Message::new(
            Side::One,
            Payload::Attack(Attack { rows: 3, column: 7 }),
        ));
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = decode_header(&[9, 0, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownType(9));
    }

    #[test]
    fn invalid_side_is_reported() {
        let err = decode_header(&[0, 5, 0, 0]).unwrap_err();
        assert_eq!(err, DecodeError::InvalidSide(5));
    }

    #[test]
    fn length_mismatch_is_reported() {
        // Move declares 7 bytes instead of 5
        let buf = [2u8, 0, 0, 7];
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, DecodeError::LengthMismatch { .. }));
    }

    #[test]
    fn length_field_is_big_endian() {
        let board = Board::new();
        let bytes = encode_to_vec(&Message::new(Side::Zero, Payload::Field(board)));
        // 400 == 0x0190
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x90);
    }

    #[test]
    fn encode_rejects_short_buffers() {
        let message = Message::new(Side::Zero, Payload::SideAssign);
        let mut buf = [0u8; HEADER_SIZE - 1];
        assert!(matches!(
            encode(&message, &mut buf),
            Err(EncodeError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn piece_state_converts_from_piece() {
        let mut piece = Piece::new(Tet::S);
        piece.pos = Coord::new(3, 17);
        piece.drop_row = 2;
        let state = PieceState::from(&piece);
        assert_eq!(state.u, 3);
        assert_eq!(state.v, 17);
        assert_eq!(state.drop_row, 2);
        let back = Piece::from(state);
        assert_eq!(back.pos, piece.pos);
        assert_eq!(back.drop_row, 2);
    }
}
