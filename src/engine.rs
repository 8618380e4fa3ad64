//! Match engine: the turn state machine.
//!
//! Owns the board, the two players, and the turn pointer. A turn runs
//! `AwaitingSelection -> PieceSelected -> (AwaitingContinuation) -> TurnComplete`.
//! Captures score one point each. After every completed turn the engine
//! checks whether someone reached the score threshold or whether the player
//! to move is left without a legal move.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Occupant, SquareId, ALL_COLORS};
use crate::config::MatchConfig;
use crate::error::{GameError, IllegalMoveReason};
use crate::movegen::{
    color_has_capture, find_captures, has_any_capture, has_legal_move, legal_destinations,
    legal_moves, mark_captures, resolve_jump, Move,
};
use crate::protocol::delta::{DeltaAction, SquareDelta};

/// A participant in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub color: Color,
    pub score: u32,
}

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingSelection,
    PieceSelected(SquareId),
    /// A capture landed on this square and another capture from it is available.
    AwaitingContinuation(SquareId),
    TurnComplete,
}

/// The result of applying one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub mv: Move,
    pub color: Color,
    /// Square changes in the order they were applied.
    pub deltas: Vec<SquareDelta>,
    /// The same piece must capture again before the turn can end.
    pub continuation: bool,
}

/// State after a turn has been handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    pub turn_count: u32,
    pub current_player: usize,
    pub winner: Option<usize>,
}

/// What an interactive square selection did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing to do for this square.
    Ignored,
    /// A piece was selected and its destinations marked.
    Selected {
        square: SquareId,
        destinations: Vec<SquareId>,
    },
    /// The selected piece was clicked again.
    Deselected,
    /// A move was made. `turn` is set when it also ended the turn.
    Moved {
        report: MoveReport,
        turn: Option<TurnSummary>,
    },
}

/// Turn state machine for one match.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    board: Board,
    players: Vec<Player>,
    current: usize,
    turn_count: u32,
    score_threshold: u32,
    selected: Option<SquareId>,
    chain: Option<SquareId>,
    moved: bool,
    winner: Option<usize>,
}

impl MatchEngine {
    /// Creates a ready-to-play engine with the configured starting position
    /// and two default players.
    pub fn new(config: &MatchConfig) -> Self {
        let mut engine = Self::without_players(config);
        engine.add_player("Player 1");
        engine.add_player("Player 2");
        engine
    }

    /// Creates an engine with the starting position and no players yet.
    pub fn without_players(config: &MatchConfig) -> Self {
        let mut board = Board::new(config.width, config.height, config.parity);
        board.setup_pieces(config.rows_per_side);
        Self::with_board(board, config)
    }

    /// Creates an engine over an arbitrary position with no players.
    pub fn with_board(board: Board, config: &MatchConfig) -> Self {
        MatchEngine {
            board,
            players: Vec::with_capacity(2),
            current: 0,
            turn_count: 0,
            score_threshold: config.score_threshold,
            selected: None,
            chain: None,
            moved: false,
            winner: None,
        }
    }

    /// Adds the next player. The first gets Black, the second White.
    /// Returns `None` when both seats are taken.
    pub fn add_player(&mut self, name: &str) -> Option<&Player> {
        let id = self.players.len();
        let color = *ALL_COLORS.get(id)?;
        self.players.push(Player {
            id,
            name: name.to_string(),
            color,
            score: 0,
        });
        self.players.last()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn current_player_index(&self) -> usize {
        self.current
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current)
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn selected(&self) -> Option<SquareId> {
        self.selected
    }

    pub fn pending_chain(&self) -> Option<SquareId> {
        self.chain
    }

    pub fn phase(&self) -> TurnPhase {
        match (self.selected, self.chain) {
            (Some(sq), _) => TurnPhase::PieceSelected(sq),
            (None, Some(sq)) => TurnPhase::AwaitingContinuation(sq),
            (None, None) if self.moved || self.winner.is_some() => TurnPhase::TurnComplete,
            (None, None) => TurnPhase::AwaitingSelection,
        }
    }

    fn in_progress(&self) -> bool {
        self.players.len() == ALL_COLORS.len() && self.winner.is_none()
    }

    fn current_color(&self) -> Color {
        ALL_COLORS[self.current % ALL_COLORS.len()]
    }

    /// Legal moves for the player to move, honouring a pending chain.
    pub fn legal_moves(&self) -> Vec<Move> {
        if !self.in_progress() || (self.moved && self.chain.is_none()) {
            return Vec::new();
        }
        match self.chain {
            Some(from) => find_captures(&self.board, from)
                .into_iter()
                .map(|c| Move {
                    from,
                    to: c.landing,
                    captured: Some(c.captured),
                })
                .collect(),
            None => legal_moves(&self.board, self.current_color()),
        }
    }

    /// Handles a click on a square by the player to move.
    ///
    /// Own piece: select it and mark its destinations, or deselect it if it
    /// was already selected. Marked destination: move the selected piece
    /// there, ending the turn unless a capture chain continues. Anything
    /// else is ignored. A rejected move clears the selection.
    pub fn select(&mut self, id: SquareId) -> Result<Selection, GameError> {
        if !self.in_progress() {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        let color = self.current_color();

        match self.board.occupant(id) {
            Occupant::Piece(c) if c == color => {
                if let Some(ch) = self.chain {
                    if ch != id {
                        return Err(IllegalMoveReason::ChainPending(ch).into());
                    }
                }
                self.board.clear_highlights();
                if self.selected == Some(id) {
                    self.selected = None;
                    return Ok(Selection::Deselected);
                }
                self.selected = Some(id);
                let destinations = legal_destinations(&self.board, id).targets();
                mark_captures(&mut self.board, id);
                for &d in &destinations {
                    self.board.place(d, Occupant::Destination);
                }
                Ok(Selection::Selected {
                    square: id,
                    destinations,
                })
            }
            Occupant::Destination => {
                let Some(from) = self.selected.take() else {
                    return Ok(Selection::Ignored);
                };
                self.board.clear_highlights();
                let report = self.play(from, id)?;
                let turn = if report.continuation {
                    None
                } else {
                    Some(self.end_turn()?)
                };
                Ok(Selection::Moved { report, turn })
            }
            _ => Ok(Selection::Ignored),
        }
    }

    /// Checks a move for the player to move without applying it.
    fn validate(&self, from: SquareId, to: SquareId) -> Result<Move, GameError> {
        if !self.in_progress() {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        if self.moved && self.chain.is_none() {
            return Err(IllegalMoveReason::TurnComplete.into());
        }
        let color = self.current_color();
        if self.board.color_at(from) != Some(color) {
            return Err(IllegalMoveReason::NotOwnPiece(from).into());
        }
        if let Some(ch) = self.chain {
            if ch != from {
                return Err(IllegalMoveReason::ChainPending(ch).into());
            }
        }

        let captured = resolve_jump(&self.board, from, to);
        if captured.is_none() && color_has_capture(&self.board, color) {
            return Err(IllegalMoveReason::CaptureRequired.into());
        }
        if !legal_destinations(&self.board, from).contains(to) {
            return Err(IllegalMoveReason::NotADestination(to).into());
        }
        Ok(Move { from, to, captured })
    }

    fn deltas_for(mv: &Move, color: Color) -> Vec<SquareDelta> {
        let mut deltas = vec![SquareDelta::removed(mv.from)];
        if let Some(c) = mv.captured {
            deltas.push(SquareDelta::removed(c));
        }
        deltas.push(SquareDelta::changed(mv.to, color));
        deltas
    }

    /// Returns the deltas a move would produce, without applying it.
    pub fn preview(&self, from: SquareId, to: SquareId) -> Result<Vec<SquareDelta>, GameError> {
        let mv = self.validate(from, to)?;
        Ok(Self::deltas_for(&mv, self.current_color()))
    }

    /// Applies a move for the player to move. Does not end the turn.
    pub fn play(&mut self, from: SquareId, to: SquareId) -> Result<MoveReport, GameError> {
        let mv = self.validate(from, to)?;
        let color = self.current_color();

        self.selected = None;
        self.board.clear_highlights();
        if let Some(c) = mv.captured {
            self.board.remove(c);
            self.players[self.current].score += 1;
        }
        let piece = self.board.remove(from);
        self.board.place(to, piece);
        self.moved = true;

        let continuation = mv.captured.is_some() && has_any_capture(&self.board, to);
        self.chain = continuation.then_some(to);

        tracing::debug!(
            from = mv.from,
            to = mv.to,
            captured = ?mv.captured,
            continuation,
            "move applied"
        );

        Ok(MoveReport {
            deltas: Self::deltas_for(&mv, color),
            mv,
            color,
            continuation,
        })
    }

    /// Applies relayed deltas without checking them against the rules.
    ///
    /// Removals of opponent pieces are scored for the player to move.
    /// Returns the number of pieces captured.
    pub fn apply_unverified(&mut self, deltas: &[SquareDelta]) -> Result<u32, GameError> {
        if !self.in_progress() {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        let opponent = self.current_color().opponent();
        let captured = deltas
            .iter()
            .filter(|d| d.action == DeltaAction::Removed)
            .filter(|d| self.board.color_at(d.square_id) == Some(opponent))
            .count() as u32;

        self.board.clear_highlights();
        self.board.apply_deltas(deltas);
        self.players[self.current].score += captured;
        self.selected = None;
        self.chain = None;
        self.moved = true;
        Ok(captured)
    }

    /// Ends the turn of the player to move.
    ///
    /// Fails while a capture chain is pending or before anything has moved.
    pub fn end_turn(&mut self) -> Result<TurnSummary, GameError> {
        if !self.in_progress() {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        if let Some(ch) = self.chain {
            return Err(IllegalMoveReason::ChainPending(ch).into());
        }
        if !self.moved {
            return Err(IllegalMoveReason::NothingMoved.into());
        }
        Ok(self.advance())
    }

    /// Hands the turn over unconditionally.
    pub fn force_end_turn(&mut self) -> Result<TurnSummary, GameError> {
        if !self.in_progress() {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        Ok(self.advance())
    }

    fn advance(&mut self) -> TurnSummary {
        self.board.clear_highlights();
        self.selected = None;
        self.chain = None;
        self.moved = false;
        self.turn_count += 1;
        self.current = self.turn_count as usize % self.players.len();
        self.winner = self.evaluate_winner();
        if let Some(w) = self.winner {
            tracing::info!(winner = w, turns = self.turn_count, "match decided");
        }
        TurnSummary {
            turn_count: self.turn_count,
            current_player: self.current,
            winner: self.winner,
        }
    }

    fn evaluate_winner(&self) -> Option<usize> {
        if let Some(p) = self.players.iter().find(|p| p.score >= self.score_threshold) {
            return Some(p.id);
        }
        let to_move = &self.players[self.current];
        if !has_legal_move(&self.board, to_move.color) {
            return Some((self.current + 1) % self.players.len());
        }
        None
    }

    /// Records a winner decided outside the rules (resignation, disconnect).
    pub fn declare_winner(&mut self, player: usize) {
        if player < self.players.len() {
            self.winner = Some(player);
            self.selected = None;
            self.board.clear_highlights();
        }
    }
}
