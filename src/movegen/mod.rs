//! Legal move generation.
//!
//! Combines simple forward moves and captures under the forced-capture rule:
//! while any piece of a color can jump, that color may only jump.

pub mod capture;
pub mod movement;

pub use capture::{find_captures, has_any_capture, mark_captures, resolve_jump, Capture};
pub use movement::{all_diagonal_neighbors, neighbors_toward_opponent, simple_moves};

use crate::board::{Board, Color, SquareId};

/// A single legal move. `captured` is set for jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: SquareId,
    pub to: SquareId,
    pub captured: Option<SquareId>,
}

impl Move {
    pub fn is_jump(&self) -> bool {
        self.captured.is_some()
    }
}

/// Legal destinations for one piece.
///
/// At most one of the two lists is non-empty: a piece that can jump may only
/// jump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    pub moves: Vec<SquareId>,
    pub captures: Vec<Capture>,
}

impl Destinations {
    /// Landing squares of the available captures.
    pub fn landings(&self) -> impl Iterator<Item = SquareId> + '_ {
        self.captures.iter().map(|c| c.landing)
    }

    /// Every square the piece may move to.
    pub fn targets(&self) -> Vec<SquareId> {
        self.moves.iter().copied().chain(self.landings()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.captures.is_empty()
    }

    pub fn contains(&self, to: SquareId) -> bool {
        self.moves.contains(&to) || self.landings().any(|l| l == to)
    }
}

/// True when any piece of `color` has a capture available.
pub fn color_has_capture(board: &Board, color: Color) -> bool {
    board.pieces(color).any(|sq| has_any_capture(board, sq.id))
}

/// Legal destinations for the piece on `id`.
///
/// A piece with captures gets only its capture landings. A piece without
/// captures gets nothing while another piece of its color can capture, and
/// its vacant forward neighbours otherwise.
pub fn legal_destinations(board: &Board, id: SquareId) -> Destinations {
    let Some(color) = board.color_at(id) else {
        return Destinations::default();
    };

    let captures = find_captures(board, id);
    if !captures.is_empty() {
        return Destinations {
            moves: Vec::new(),
            captures,
        };
    }
    if color_has_capture(board, color) {
        return Destinations::default();
    }
    Destinations {
        moves: simple_moves(board, id),
        captures: Vec::new(),
    }
}

/// Every legal move for `color`.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let must_capture = color_has_capture(board, color);
    let mut moves = Vec::new();

    for sq in board.pieces(color) {
        if must_capture {
            for c in find_captures(board, sq.id) {
                moves.push(Move {
                    from: sq.id,
                    to: c.landing,
                    captured: Some(c.captured),
                });
            }
        } else {
            for to in simple_moves(board, sq.id) {
                moves.push(Move {
                    from: sq.id,
                    to,
                    captured: None,
                });
            }
        }
    }

    moves
}

/// True when `color` has at least one legal move.
pub fn has_legal_move(board: &Board, color: Color) -> bool {
    board.pieces(color).any(|sq| {
        has_any_capture(board, sq.id) || !simple_moves(board, sq.id).is_empty()
    })
}
