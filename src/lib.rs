//! Netris: synchronization core for a two-player falling-block game.
//!
//! The crate splits into a byte-order codec ([`bswap`]), the binary wire
//! protocol ([`wire`]), the deterministic per-side game engine ([`core`]),
//! and the relay server plus client session ([`net`]). Rendering and input
//! polling are external: the engine consumes abstract events and exposes
//! read-only state for presentation.

pub mod bswap;
pub mod core;
pub mod net;
pub mod types;
pub mod wire;
