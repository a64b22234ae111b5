//! Wire protocol: binary message codec and stream reassembly.
//!
//! The codec knows nothing about sockets; it converts between typed
//! messages and bytes, and the assembler turns an arbitrary byte stream
//! back into whole messages. Multi-byte integers use wire order via
//! [`crate::bswap`].

mod assembler;
mod error;
mod message;

pub use assembler::{Assembler, RECV_BUFFER_SIZE};
pub use error::{DecodeError, EncodeError, WireResult};
pub use message::{
    decode_header, decode_payload, encode, encode_to_vec, Header, Message, MessageType, Payload,
    PieceState, ATTACK_SIZE, FIELD_SIZE, HEADER_SIZE, MAX_MESSAGE_SIZE, PIECE_SIZE,
};
