//! Compact text notation for a board position.
//!
//! Rows are listed from row 0 to the last row, separated by `/`. Each row has
//! exactly `width` characters: `b` for a black piece, `w` for a white piece,
//! `.` for an empty square.
//!
//! The standard opening position:
//! `b.b.b.b./.b.b.b.b/b.b.b.b./......../......../.w.w.w.w/w.w.w.w./.w.w.w.w`

use crate::board::{Board, Color, Occupant, Parity};

/// The standard 8x8 opening position with even parity.
pub const STANDARD_LAYOUT: &str =
    "b.b.b.b./.b.b.b.b/b.b.b.b./......../......../.w.w.w.w/w.w.w.w./.w.w.w.w";

/// Errors that can occur during layout parsing.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid square character '{0}'")]
    InvalidChar(char),

    #[error("piece on unplayable square ({x}, {y})")]
    UnplayableSquare { x: usize, y: usize },
}

/// Parses a layout into a board with the given parity.
pub fn parse_layout(s: &str, parity: Parity) -> Result<Board, LayoutError> {
    let rows: Vec<&str> = s.trim().split('/').collect();
    let width = rows.first().map_or(0, |r| r.chars().count());
    if width == 0 {
        return Err(LayoutError::Empty);
    }

    let mut board = Board::new(width, rows.len(), parity);
    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LayoutError::RaggedRow {
                row: y,
                found,
                expected: width,
            });
        }
        for (x, c) in row.chars().enumerate() {
            if c == '.' {
                continue;
            }
            let color = Color::from_layout_char(c).ok_or(LayoutError::InvalidChar(c))?;
            if !board.place(y * width + x, Occupant::Piece(color)) {
                return Err(LayoutError::UnplayableSquare { x, y });
            }
        }
    }

    Ok(board)
}

/// Encodes a board as a layout string. Destination markers encode as empty.
pub fn encode_layout(board: &Board) -> String {
    let mut out = String::with_capacity(board.len() + board.height());
    for (i, sq) in board.squares().iter().enumerate() {
        if i > 0 && sq.x == 0 {
            out.push('/');
        }
        match sq.occupant().color() {
            Some(c) => out.push(c.layout_char()),
            None => out.push('.'),
        }
    }
    out
}
