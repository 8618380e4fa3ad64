//! Capture detection.
//!
//! A capture jumps a diagonally adjacent opponent piece and lands on the
//! vacant square directly beyond it. Captures may go in any diagonal
//! direction, backward included.

use crate::board::{Board, SquareId};

use super::movement::all_diagonal_neighbors;

/// Two-step diagonal offsets tried as landing squares.
const JUMPS: [(i32, i32); 4] = [(-2, -2), (2, -2), (-2, 2), (2, 2)];

/// One available jump: the opponent piece removed and where the jumper lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    pub captured: SquareId,
    pub landing: SquareId,
}

/// Returns true when `m` lies strictly between `a` and `b`.
fn strictly_between(a: i32, m: i32, b: i32) -> bool {
    (a < m && m < b) || (b < m && m < a)
}

/// Lists every capture available to the piece on `id`.
///
/// Empty when the square holds no piece.
pub fn find_captures(board: &Board, id: SquareId) -> Vec<Capture> {
    let Some(color) = board.color_at(id) else {
        return Vec::new();
    };
    let Some(origin) = board.square(id) else {
        return Vec::new();
    };
    let (ox, oy) = (origin.x as i32, origin.y as i32);
    let mut captures = Vec::new();

    for n in all_diagonal_neighbors(board, id) {
        if board.color_at(n) != Some(color.opponent()) {
            continue;
        }
        let Some(neighbor) = board.square(n) else {
            continue;
        };
        let (nx, ny) = (neighbor.x as i32, neighbor.y as i32);

        for (dx, dy) in JUMPS {
            let (lx, ly) = (ox + dx, oy + dy);
            let Some(landing) = board.id_at(lx, ly) else {
                continue;
            };
            if !board.occupant(landing).is_vacant() {
                continue;
            }
            if strictly_between(ox, nx, lx) && strictly_between(oy, ny, ly) {
                captures.push(Capture { captured: n, landing });
            }
        }
    }

    captures
}

/// True when the piece on `id` can capture something.
pub fn has_any_capture(board: &Board, id: SquareId) -> bool {
    !find_captures(board, id).is_empty()
}

/// Marks the pieces capturable from `id` so a renderer can show them.
/// Returns the captures found.
pub fn mark_captures(board: &mut Board, id: SquareId) -> Vec<Capture> {
    let captures = find_captures(board, id);
    for c in &captures {
        board.set_marked(c.captured, true);
    }
    captures
}

/// Works out which square a move from `from` to `to` jumps over.
///
/// Returns the jumped square only when `to` is a two-step diagonal away and
/// the square in between holds an opponent piece. Own pieces and empty
/// squares are never jumped.
pub fn resolve_jump(board: &Board, from: SquareId, to: SquareId) -> Option<SquareId> {
    let color = board.color_at(from)?;
    let (f, t) = (board.square(from)?, board.square(to)?);
    let (dx, dy) = (t.x as i32 - f.x as i32, t.y as i32 - f.y as i32);
    if dx.abs() != 2 || dy.abs() != 2 {
        return None;
    }
    let mid = board.id_at(f.x as i32 + dx / 2, f.y as i32 + dy / 2)?;
    (board.color_at(mid) == Some(color.opponent())).then_some(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, Occupant, Parity};

    fn board() -> Board {
        Board::new(8, 8, Parity::Even)
    }

    fn put(b: &mut Board, x: i32, y: i32, c: Color) -> SquareId {
        let id = b.id_at(x, y).unwrap();
        assert!(b.place(id, Occupant::Piece(c)));
        id
    }

    #[test]
    fn forward_capture_found() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        let victim = put(&mut b, 3, 3, Color::White);
        let caps = find_captures(&b, from);
        assert_eq!(caps, vec![Capture { captured: victim, landing: b.id_at(4, 4).unwrap() }]);
    }

    #[test]
    fn backward_capture_found() {
        let mut b = board();
        let from = put(&mut b, 4, 4, Color::Black);
        let victim = put(&mut b, 3, 3, Color::White);
        let caps = find_captures(&b, from);
        assert_eq!(caps, vec![Capture { captured: victim, landing: b.id_at(2, 2).unwrap() }]);
    }

    #[test]
    fn blocked_landing_is_not_a_capture() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        put(&mut b, 3, 3, Color::White);
        put(&mut b, 4, 4, Color::White);
        assert!(find_captures(&b, from).is_empty());
        assert!(!has_any_capture(&b, from));
    }

    #[test]
    fn destination_marker_does_not_block_landing() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        put(&mut b, 3, 3, Color::White);
        b.place(b.id_at(4, 4).unwrap(), Occupant::Destination);
        assert!(has_any_capture(&b, from));
    }

    #[test]
    fn own_piece_is_not_captured() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        put(&mut b, 3, 3, Color::Black);
        assert!(find_captures(&b, from).is_empty());
    }

    #[test]
    fn captures_near_edges_stay_in_bounds() {
        let mut b = board();
        // Landing would be (-1, 7) and (8, 0): both off the board.
        let from = put(&mut b, 1, 5, Color::White);
        put(&mut b, 0, 6, Color::Black);
        assert!(find_captures(&b, from).is_empty());

        let from = put(&mut b, 6, 2, Color::White);
        put(&mut b, 7, 1, Color::Black);
        assert!(find_captures(&b, from).is_empty());

        // Landing exactly on row 0 / column 0 is legal.
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::White);
        put(&mut b, 1, 1, Color::Black);
        let caps = find_captures(&b, from);
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].landing, b.id_at(0, 0).unwrap());
    }

    #[test]
    fn multiple_captures_from_one_square() {
        let mut b = board();
        let from = put(&mut b, 3, 3, Color::White);
        put(&mut b, 2, 2, Color::Black);
        put(&mut b, 4, 4, Color::Black);
        put(&mut b, 4, 2, Color::Black);
        assert_eq!(find_captures(&b, from).len(), 3);
    }

    #[test]
    fn empty_square_has_no_captures() {
        let b = board();
        assert!(find_captures(&b, 0).is_empty());
    }

    #[test]
    fn mark_captures_sets_flags() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        let victim = put(&mut b, 3, 3, Color::White);
        mark_captures(&mut b, from);
        assert!(b.square(victim).unwrap().marked_capturable());
    }

    #[test]
    fn resolve_jump_over_opponent() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        let victim = put(&mut b, 3, 3, Color::White);
        assert_eq!(resolve_jump(&b, from, b.id_at(4, 4).unwrap()), Some(victim));
    }

    #[test]
    fn resolve_jump_rejects_empty_and_own_color() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        let to = b.id_at(4, 4).unwrap();
        assert_eq!(resolve_jump(&b, from, to), None);
        put(&mut b, 3, 3, Color::Black);
        assert_eq!(resolve_jump(&b, from, to), None);
    }

    #[test]
    fn resolve_jump_ignores_simple_steps() {
        let mut b = board();
        let from = put(&mut b, 2, 2, Color::Black);
        assert_eq!(resolve_jump(&b, from, b.id_at(3, 3).unwrap()), None);
        assert_eq!(resolve_jump(&b, from, b.id_at(4, 2).unwrap()), None);
    }
}
