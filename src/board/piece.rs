//! Piece colors and square occupants.
//!
//! A square is either empty, holds a player's piece, or carries a transient
//! destination marker placed while a piece is selected. Markers are never
//! owned by a player and never count as occupants for capture purposes.

use serde::{Deserialize, Serialize};

/// The color of a player's piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

/// Both colors in turn order. Black always moves first.
pub const ALL_COLORS: [Color; 2] = [Color::Black, Color::White];

impl Color {
    /// Returns the other player's color.
    pub const fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Row step for a forward move. Black advances toward increasing rows,
    /// White toward decreasing rows.
    pub const fn forward(self) -> i32 {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }

    /// Index into per-color arrays.
    pub const fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Returns the single-character layout abbreviation.
    pub const fn layout_char(self) -> char {
        match self {
            Color::Black => 'b',
            Color::White => 'w',
        }
    }

    /// Parses a color from its single-character layout abbreviation.
    pub fn from_layout_char(c: char) -> Option<Color> {
        match c {
            'b' => Some(Color::Black),
            'w' => Some(Color::White),
            _ => None,
        }
    }

    /// Lowercase name used in the line protocol and JSON payloads.
    pub const fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }

    /// Parses a color from its lowercase name.
    pub fn from_name(s: &str) -> Option<Color> {
        match s {
            "black" => Some(Color::Black),
            "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a square currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Piece(Color),
    /// Legal-destination marker shown while a piece is selected.
    Destination,
}

impl Occupant {
    /// Returns the piece color, or `None` for empty squares and markers.
    pub const fn color(self) -> Option<Color> {
        match self {
            Occupant::Piece(c) => Some(c),
            Occupant::Empty | Occupant::Destination => None,
        }
    }

    /// True when a real piece sits on the square.
    pub const fn is_piece(self) -> bool {
        matches!(self, Occupant::Piece(_))
    }

    /// True when a piece could land here. Markers do not block.
    pub const fn is_vacant(self) -> bool {
        !self.is_piece()
    }
}
