//! Error types shared by the engine, the coordinator, and configuration.
//!
//! Every rule violation is recoverable: the operation that reports it leaves
//! match state unchanged.

use crate::board::SquareId;
use crate::coordinator::MatchId;

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveReason {
    #[error("match is not in progress")]
    NotInProgress,

    #[error("no piece of the mover's color on square {0}")]
    NotOwnPiece(SquareId),

    #[error("square {0} is not a legal destination")]
    NotADestination(SquareId),

    #[error("a capture is available and must be taken")]
    CaptureRequired,

    #[error("capture chain must continue from square {0}")]
    ChainPending(SquareId),

    #[error("no move has been made this turn")]
    NothingMoved,

    #[error("turn is already complete and must be ended first")]
    TurnComplete,

    #[error("submitted board update does not describe a legal move")]
    DeltaMismatch,
}

/// Errors reported by match operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMoveReason),

    #[error("unknown match {0}")]
    UnknownMatch(MatchId),

    #[error("unknown player {player} in match {match_id}")]
    UnknownPlayer { match_id: MatchId, player: usize },

    #[error("unknown connection '{0}'")]
    UnknownConnection(String),

    #[error("match {0} already has two players")]
    MatchFull(MatchId),

    #[error("connection is already seated in match {0}")]
    AlreadySeated(MatchId),

    #[error("player {0} acted out of turn")]
    OutOfTurn(usize),
}

impl GameError {
    /// True for errors that name something that does not exist.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(
            self,
            GameError::UnknownMatch(_)
                | GameError::UnknownPlayer { .. }
                | GameError::UnknownConnection(_)
        )
    }
}

/// Errors that can occur when loading or changing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_move_display() {
        let err = GameError::from(IllegalMoveReason::CaptureRequired);
        assert_eq!(
            err.to_string(),
            "illegal move: a capture is available and must be taken"
        );
    }

    #[test]
    fn invalid_reference_classification() {
        assert!(GameError::UnknownMatch(MatchId(3)).is_invalid_reference());
        assert!(GameError::UnknownConnection("c1".into()).is_invalid_reference());
        assert!(!GameError::MatchFull(MatchId(0)).is_invalid_reference());
        assert!(!GameError::OutOfTurn(1).is_invalid_reference());
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            name: "Width".into(),
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "invalid value 'abc' for option 'Width'");
    }
}
