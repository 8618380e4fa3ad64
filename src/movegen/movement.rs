//! Diagonal neighbourhoods and simple (non-capturing) moves.

use crate::board::{Board, Color, SquareId};

/// Diagonal step offsets in `(dx, dy)` form.
pub const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Returns the up-to-two diagonal neighbours one step forward for `color`.
///
/// Squares off the board are skipped.
pub fn neighbors_toward_opponent(board: &Board, id: SquareId, color: Color) -> Vec<SquareId> {
    let Some(sq) = board.square(id) else {
        return Vec::new();
    };
    let (x, y) = (sq.x as i32, sq.y as i32);
    let dy = color.forward();
    [-1, 1]
        .iter()
        .filter_map(|dx| board.id_at(x + dx, y + dy))
        .collect()
}

/// Returns every diagonal neighbour of a square, forward and backward.
pub fn all_diagonal_neighbors(board: &Board, id: SquareId) -> Vec<SquareId> {
    let Some(sq) = board.square(id) else {
        return Vec::new();
    };
    let (x, y) = (sq.x as i32, sq.y as i32);
    DIAGONALS
        .iter()
        .filter_map(|(dx, dy)| board.id_at(x + dx, y + dy))
        .collect()
}

/// Forward neighbours of the piece on `id` that are free to move into.
///
/// Empty when the square holds no piece.
pub fn simple_moves(board: &Board, id: SquareId) -> Vec<SquareId> {
    let Some(color) = board.color_at(id) else {
        return Vec::new();
    };
    neighbors_toward_opponent(board, id, color)
        .into_iter()
        .filter(|&n| board.occupant(n).is_vacant())
        .collect()
}
