//! Match records held by the coordinator.

use serde::{Deserialize, Serialize};

use crate::engine::{MatchEngine, Player};
use crate::protocol::layout::encode_layout;

/// Transport-level identity of a connected participant.
pub type ConnectionId = String;

/// Stable index of a match in the coordinator's arena. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub usize);

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MatchId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MatchId(s.parse()?))
    }
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// Waiting for a second player.
    Lobby,
    Started,
    Ended,
}

/// One match: its lifecycle state, the authoritative engine, and the
/// connection behind each player seat.
#[derive(Debug)]
pub struct Match {
    pub(crate) id: MatchId,
    pub(crate) state: MatchState,
    pub(crate) engine: MatchEngine,
    pub(crate) connections: Vec<ConnectionId>,
    pub(crate) winner: Option<usize>,
}

impl Match {
    pub(crate) fn new(id: MatchId, engine: MatchEngine) -> Self {
        Match {
            id,
            state: MatchState::Lobby,
            engine,
            connections: Vec::with_capacity(2),
            winner: None,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn is_open(&self) -> bool {
        self.state == MatchState::Lobby && self.engine.players().len() < 2
    }

    /// Connection of the given seat, if filled.
    pub fn connection(&self, player: usize) -> Option<&ConnectionId> {
        self.connections.get(player)
    }

    /// Serialisable view of the match, as sent in state syncs.
    pub fn snapshot(&self) -> MatchRecord {
        MatchRecord {
            id: self.id,
            players: self.engine.players().to_vec(),
            current_player_index: self.engine.current_player_index(),
            turn_count: self.engine.turn_count(),
            state: self.state,
            winner: self.winner.and_then(|w| self.engine.player(w).cloned()),
            board: encode_layout(self.engine.board()),
        }
    }
}

/// Snapshot of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub turn_count: u32,
    pub state: MatchState,
    pub winner: Option<Player>,
    /// Board position in layout notation.
    pub board: String,
}
