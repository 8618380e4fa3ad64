//! A single board cell.

use super::piece::Occupant;

/// Row-major index of a square: `y * width + x`.
pub type SquareId = usize;

/// Which checkerboard color is playable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// Squares with `(x + y)` even are playable; the top-left square is playable.
    #[default]
    Even,
    /// Squares with `(x + y)` odd are playable.
    Odd,
}

impl Parity {
    /// Returns whether the square at `(x, y)` is playable under this parity.
    pub const fn is_playable(self, x: usize, y: usize) -> bool {
        let odd = (x + y) % 2 == 1;
        match self {
            Parity::Even => !odd,
            Parity::Odd => odd,
        }
    }

    pub fn from_name(s: &str) -> Option<Parity> {
        match s {
            "even" => Some(Parity::Even),
            "odd" => Some(Parity::Odd),
            _ => None,
        }
    }
}

/// One cell of the grid.
///
/// `playable` is fixed at construction. The occupant and the capture mark are
/// only changed through [`Board`](super::Board) so that every change is
/// reported to its observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Square {
    pub id: SquareId,
    pub x: usize,
    pub y: usize,
    pub playable: bool,
    pub(crate) occupant: Occupant,
    pub(crate) marked_capturable: bool,
}

impl Square {
    pub(crate) fn new(id: SquareId, x: usize, y: usize, playable: bool) -> Self {
        Square {
            id,
            x,
            y,
            playable,
            occupant: Occupant::Empty,
            marked_capturable: false,
        }
    }

    pub fn occupant(&self) -> Occupant {
        self.occupant
    }

    /// True when this square's piece is currently shown as capturable.
    pub fn marked_capturable(&self) -> bool {
        self.marked_capturable
    }
}
