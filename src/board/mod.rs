//! Board representation.
//!
//! Contains the piece and square types and the grid that owns them.

pub mod grid;
pub mod piece;
pub mod square;

pub use grid::{Board, BoardObserver, SquareEvent};
pub use piece::{Color, Occupant, ALL_COLORS};
pub use square::{Parity, Square, SquareId};
