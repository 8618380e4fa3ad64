//! Board-update deltas.
//!
//! A delta describes the new content of one square: either emptied or
//! holding a piece of some color. A move is sent to the opponent as an
//! ordered list of deltas.
//!
//! Line notation: comma-separated `<id>:removed` or `<id>:changed:<color>`
//! entries, or `-` for an empty list. Example: `5:removed,12:changed:white`.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Occupant, SquareId};

/// What happened to a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaAction {
    Removed,
    Changed,
}

/// One square's change in a board update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquareDelta {
    pub square_id: SquareId,
    pub action: DeltaAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl SquareDelta {
    pub fn removed(square_id: SquareId) -> Self {
        SquareDelta {
            square_id,
            action: DeltaAction::Removed,
            color: None,
        }
    }

    pub fn changed(square_id: SquareId, color: Color) -> Self {
        SquareDelta {
            square_id,
            action: DeltaAction::Changed,
            color: Some(color),
        }
    }
}

/// Errors that can occur when parsing delta line notation.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeltaParseError {
    #[error("invalid square id: '{0}'")]
    InvalidSquare(String),

    #[error("invalid delta action: '{0}'")]
    InvalidAction(String),

    #[error("invalid color: '{0}'")]
    InvalidColor(String),

    #[error("malformed delta entry: '{0}'")]
    Malformed(String),
}

impl Board {
    /// Applies deltas in order, overwriting prior square content.
    ///
    /// Entries naming an unknown or unplayable square, and `changed` entries
    /// without a color, are skipped. Returns how many deltas took effect.
    pub fn apply_deltas(&mut self, deltas: &[SquareDelta]) -> usize {
        let mut applied = 0;
        for d in deltas {
            let playable = self.square(d.square_id).is_some_and(|s| s.playable);
            if !playable {
                continue;
            }
            match (d.action, d.color) {
                (DeltaAction::Removed, _) => {
                    self.remove(d.square_id);
                    applied += 1;
                }
                (DeltaAction::Changed, Some(color)) => {
                    if self.place(d.square_id, Occupant::Piece(color)) {
                        applied += 1;
                    }
                }
                (DeltaAction::Changed, None) => {}
            }
        }
        applied
    }
}

/// Parses delta line notation.
pub fn parse_deltas(s: &str) -> Result<Vec<SquareDelta>, DeltaParseError> {
    let s = s.trim();
    if s == "-" || s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(parse_delta).collect()
}

fn parse_delta(entry: &str) -> Result<SquareDelta, DeltaParseError> {
    let parts: Vec<&str> = entry.trim().split(':').collect();
    let id: SquareId = parts[0]
        .parse()
        .map_err(|_| DeltaParseError::InvalidSquare(parts[0].to_string()))?;

    match parts.as_slice() {
        [_, "removed"] => Ok(SquareDelta::removed(id)),
        [_, "changed", color] => {
            let color = Color::from_name(color)
                .ok_or_else(|| DeltaParseError::InvalidColor(color.to_string()))?;
            Ok(SquareDelta::changed(id, color))
        }
        [_, action] | [_, action, _] => Err(DeltaParseError::InvalidAction(action.to_string())),
        _ => Err(DeltaParseError::Malformed(entry.to_string())),
    }
}

/// Formats deltas in line notation.
pub fn format_deltas(deltas: &[SquareDelta]) -> String {
    if deltas.is_empty() {
        return "-".to_string();
    }
    deltas
        .iter()
        .map(|d| match (d.action, d.color) {
            (DeltaAction::Changed, Some(c)) => format!("{}:changed:{}", d.square_id, c.name()),
            _ => format!("{}:removed", d.square_id),
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Parity;

    #[test]
    fn apply_overwrites_prior_content() {
        let mut board = Board::new(8, 8, Parity::Odd);
        board.place(5, Occupant::Piece(Color::Black));
        board.place(12, Occupant::Piece(Color::Black));

        let deltas = [SquareDelta::removed(5), SquareDelta::changed(12, Color::White)];
        assert_eq!(board.apply_deltas(&deltas), 2);
        assert_eq!(board.occupant(5), Occupant::Empty);
        assert_eq!(board.occupant(12), Occupant::Piece(Color::White));
    }

    #[test]
    fn apply_skips_unplayable_and_unknown_squares() {
        let mut board = Board::new(8, 8, Parity::Even);
        let deltas = [
            SquareDelta::changed(1, Color::White),
            SquareDelta::removed(500),
            SquareDelta {
                square_id: 0,
                action: DeltaAction::Changed,
                color: None,
            },
        ];
        assert_eq!(board.apply_deltas(&deltas), 0);
        assert_eq!(board.occupant(1), Occupant::Empty);
        assert_eq!(board.occupant(0), Occupant::Empty);
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_string(&[
            SquareDelta::removed(5),
            SquareDelta::changed(12, Color::White),
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"[{"squareId":5,"action":"removed"},{"squareId":12,"action":"changed","color":"white"}]"#
        );
    }

    #[test]
    fn json_parse() {
        let deltas: Vec<SquareDelta> = serde_json::from_str(
            r#"[{"squareId":5,"action":"removed"},{"squareId":12,"action":"changed","color":"white"}]"#,
        )
        .unwrap();
        assert_eq!(
            deltas,
            vec![SquareDelta::removed(5), SquareDelta::changed(12, Color::White)]
        );
    }

    #[test]
    fn parse_line_notation() {
        let deltas = parse_deltas("5:removed,12:changed:white").unwrap();
        assert_eq!(
            deltas,
            vec![SquareDelta::removed(5), SquareDelta::changed(12, Color::White)]
        );
        assert_eq!(format_deltas(&deltas), "5:removed,12:changed:white");
        assert!(parse_deltas("-").unwrap().is_empty());
        assert_eq!(format_deltas(&[]), "-");
    }

    #[test]
    fn parse_line_notation_errors() {
        assert_eq!(
            parse_deltas("x:removed"),
            Err(DeltaParseError::InvalidSquare("x".into()))
        );
        assert_eq!(
            parse_deltas("3:moved"),
            Err(DeltaParseError::InvalidAction("moved".into()))
        );
        assert_eq!(
            parse_deltas("3:changed:red"),
            Err(DeltaParseError::InvalidColor("red".into()))
        );
        assert_eq!(parse_deltas("3"), Err(DeltaParseError::Malformed("3".into())));
        assert_eq!(
            parse_deltas("3:changed:white:x"),
            Err(DeltaParseError::Malformed("3:changed:white:x".into()))
        );
    }
}
