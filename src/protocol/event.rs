//! Broadcast payloads sent to connected participants.
//!
//! Every payload serialises as a JSON object tagged by `type`, with camelCase
//! field names.

use serde::{Deserialize, Serialize};

use crate::coordinator::{ConnectionId, MatchId, MatchRecord};
use crate::engine::Player;

use super::delta::SquareDelta;

/// A payload for one or more participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// A new lobby match was opened for the requester.
    MatchCreated { match_id: MatchId },

    /// The requester was seated in a match.
    MatchJoined { match_id: MatchId },

    /// The requester's own player record.
    PlayerCreated { player: Player },

    /// Another participant took a seat in the match.
    PlayerJoined { player: Player },

    /// Full match state for reconciliation.
    StateSync {
        #[serde(rename = "match")]
        record: MatchRecord,
    },

    /// Both seats are filled and play begins.
    MatchStart {
        #[serde(rename = "match")]
        record: MatchRecord,
    },

    /// Square changes made by a move.
    BoardUpdate {
        match_id: MatchId,
        player_id: usize,
        deltas: Vec<SquareDelta>,
        continuation: bool,
    },

    MatchEnded {
        #[serde(rename = "match")]
        record: MatchRecord,
    },

    /// The sender's last action was refused. State is unchanged.
    Rejected { reason: String },
}

/// An event addressed to specific connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub to: Vec<ConnectionId>,
    pub event: Event,
}

impl Outbound {
    pub fn new(to: Vec<ConnectionId>, event: Event) -> Self {
        Outbound { to, event }
    }

    pub fn single(to: &str, event: Event) -> Self {
        Outbound {
            to: vec![to.to_string()],
            event,
        }
    }

    /// Formats as a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
