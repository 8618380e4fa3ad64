//! The board grid.
//!
//! Owns every square and the pieces on them. All occupant and mark changes go
//! through this type so subscribed observers see each one.

use std::fmt;
use std::sync::Arc;

use super::piece::{Color, Occupant};
use super::square::{Parity, Square, SquareId};

/// A change to a single square, delivered to observers after it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareEvent {
    pub id: SquareId,
    pub occupant: Occupant,
    pub marked_capturable: bool,
}

/// Receives square change notifications.
///
/// Rendering layers and mirrors subscribe here instead of polling the board.
pub trait BoardObserver: Send + Sync {
    fn square_changed(&self, event: &SquareEvent);
}

#[derive(Clone, Default)]
struct Observers(Vec<Arc<dyn BoardObserver>>);

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observers({})", self.0.len())
    }
}

/// A `width x height` grid of squares.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    parity: Parity,
    squares: Vec<Square>,
    observers: Observers,
}

impl Board {
    /// Creates an empty board. Playability of each square is fixed here.
    pub fn new(width: usize, height: usize, parity: Parity) -> Self {
        let mut squares = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                squares.push(Square::new(y * width + x, x, y, parity.is_playable(x, y)));
            }
        }
        Board {
            width,
            height,
            parity,
            squares,
            observers: Observers::default(),
        }
    }

    /// Creates an 8x8 board with the standard starting position.
    pub fn standard() -> Self {
        let mut board = Board::new(8, 8, Parity::Even);
        board.setup_pieces(3);
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Total number of squares, playable or not.
    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    pub fn square(&self, id: SquareId) -> Option<&Square> {
        self.squares.get(id)
    }

    /// Looks up a square by coordinates. Anything outside
    /// `[0, width) x [0, height)` is `None`; coordinates never wrap.
    pub fn square_at(&self, x: i32, y: i32) -> Option<&Square> {
        self.id_at(x, y).map(|id| &self.squares[id])
    }

    /// Returns the id of the square at `(x, y)` if it is on the board.
    pub fn id_at(&self, x: i32, y: i32) -> Option<SquareId> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Occupant of a square; out-of-range ids read as empty.
    pub fn occupant(&self, id: SquareId) -> Occupant {
        self.squares.get(id).map_or(Occupant::Empty, |s| s.occupant)
    }

    /// Color of the piece on a square, ignoring destination markers.
    pub fn color_at(&self, id: SquareId) -> Option<Color> {
        self.occupant(id).color()
    }

    /// Puts an occupant on a square, replacing whatever was there.
    ///
    /// Returns false and changes nothing when the id is out of range or the
    /// square is not playable.
    pub fn place(&mut self, id: SquareId, occupant: Occupant) -> bool {
        match self.squares.get_mut(id) {
            Some(sq) if sq.playable => {
                sq.occupant = occupant;
            }
            _ => return false,
        }
        self.notify(id);
        true
    }

    /// Empties a square and returns what it held.
    pub fn remove(&mut self, id: SquareId) -> Occupant {
        let prev = match self.squares.get_mut(id) {
            Some(sq) => std::mem::take(&mut sq.occupant),
            None => return Occupant::Empty,
        };
        self.notify(id);
        prev
    }

    /// Sets or clears the capturable mark on a square.
    pub fn set_marked(&mut self, id: SquareId, marked: bool) {
        match self.squares.get_mut(id) {
            Some(sq) => sq.marked_capturable = marked,
            None => return,
        }
        self.notify(id);
    }

    /// Resets every capturable mark and removes all destination markers.
    pub fn clear_highlights(&mut self) {
        for id in 0..self.squares.len() {
            let sq = &self.squares[id];
            if sq.marked_capturable {
                self.set_marked(id, false);
            }
            if self.squares[id].occupant == Occupant::Destination {
                self.remove(id);
            }
        }
    }

    /// Fills the first `rows` rows with Black and the last `rows` rows with
    /// White, on playable squares only.
    pub fn setup_pieces(&mut self, rows: usize) {
        let rows = rows.min(self.height);
        for y in 0..rows {
            for x in 0..self.width {
                self.place(y * self.width + x, Occupant::Piece(Color::Black));
            }
        }
        for y in self.height - rows..self.height {
            for x in 0..self.width {
                self.place(y * self.width + x, Occupant::Piece(Color::White));
            }
        }
    }

    /// Iterates the squares holding a piece of `color`.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &Square> + '_ {
        self.squares
            .iter()
            .filter(move |s| s.occupant == Occupant::Piece(color))
    }

    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces(color).count()
    }

    /// Registers an observer for all subsequent square changes.
    pub fn subscribe(&mut self, observer: Arc<dyn BoardObserver>) {
        self.observers.0.push(observer);
    }

    fn notify(&self, id: SquareId) {
        if self.observers.0.is_empty() {
            return;
        }
        let sq = &self.squares[id];
        let event = SquareEvent {
            id,
            occupant: sq.occupant,
            marked_capturable: sq.marked_capturable,
        };
        for obs in &self.observers.0 {
            obs.square_changed(&event);
        }
    }
}
