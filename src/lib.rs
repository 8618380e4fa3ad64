//! Draughts match engine library.
//!
//! Exposes the board model, move generation, the per-match turn engine, the
//! multiplayer coordinator, and the wire protocol for use by the driver
//! binary, the playout harness, and integration tests.

pub mod board;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod movegen;
pub mod playout;
pub mod protocol;
pub mod server;
