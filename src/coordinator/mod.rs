//! Server-side match coordinator.
//!
//! Holds every in-progress match, pairs participants into them, and relays
//! moves between the two players of a match. Matches live in an arena and
//! are referenced by [`MatchId`]; each one sits behind its own lock so that
//! joins and moves on a match are serialised while different matches proceed
//! independently.

pub mod record;

pub use record::{ConnectionId, Match, MatchId, MatchRecord, MatchState};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::board::SquareId;
use crate::config::MatchConfig;
use crate::engine::{MatchEngine, Player};
use crate::error::{GameError, IllegalMoveReason};
use crate::protocol::delta::{DeltaAction, SquareDelta};

type MatchSlot = Option<Arc<Mutex<Match>>>;

/// Result of asking for a match to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    pub record: MatchRecord,
    /// True when no open match existed and this one was just created.
    pub created: bool,
}

/// A move accepted for relay to the opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub match_id: MatchId,
    pub player_id: usize,
    /// Connection of the player who did not move.
    pub recipient: Option<ConnectionId>,
    pub deltas: Vec<SquareDelta>,
    /// The mover must keep capturing before ending the turn.
    pub continuation: bool,
}

/// Registry of all matches in the process.
#[derive(Debug, Default)]
pub struct MatchCoordinator {
    config: RwLock<MatchConfig>,
    matches: RwLock<Vec<MatchSlot>>,
    connections: RwLock<HashMap<ConnectionId, (MatchId, usize)>>,
}

impl MatchCoordinator {
    pub fn new(config: MatchConfig) -> Self {
        MatchCoordinator {
            config: RwLock::new(config),
            matches: RwLock::new(Vec::new()),
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> MatchConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration used for matches created from now on.
    pub fn set_config(&self, config: MatchConfig) {
        *self.config.write() = config;
    }

    fn get(&self, id: MatchId) -> Result<Arc<Mutex<Match>>, GameError> {
        self.matches
            .read()
            .get(id.0)
            .and_then(|slot| slot.clone())
            .ok_or(GameError::UnknownMatch(id))
    }

    /// Returns an open lobby match, creating one if none exists.
    ///
    /// Matches that have started or ended are never handed out again.
    pub fn request_match(&self, participant: &str) -> MatchTicket {
        let mut matches = self.matches.write();
        for slot in matches.iter().flatten() {
            let m = slot.lock();
            if m.is_open() {
                return MatchTicket {
                    record: m.snapshot(),
                    created: false,
                };
            }
        }

        let id = MatchId(matches.len());
        let engine = MatchEngine::without_players(&self.config.read());
        let m = Match::new(id, engine);
        let record = m.snapshot();
        matches.push(Some(Arc::new(Mutex::new(m))));
        tracing::info!(match_id = %id, participant, "match created");
        MatchTicket {
            record,
            created: true,
        }
    }

    /// Seats a participant in a lobby match. The first seat plays Black, the
    /// second White.
    pub fn join_match(
        &self,
        match_id: MatchId,
        name: &str,
        connection: &str,
    ) -> Result<Player, GameError> {
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        if !m.is_open() {
            tracing::warn!(match_id = %match_id, connection, "join refused: match full");
            return Err(GameError::MatchFull(match_id));
        }
        let player = m
            .engine
            .add_player(name)
            .cloned()
            .ok_or(GameError::MatchFull(match_id))?;
        m.connections.push(connection.to_string());
        self.connections
            .write()
            .insert(connection.to_string(), (match_id, player.id));
        tracing::info!(match_id = %match_id, player = player.id, color = %player.color, name, "player joined");
        Ok(player)
    }

    /// Starts a lobby match once both seats are filled. Returns the started
    /// match, or `None` if it was not ready or already running.
    pub fn try_start(&self, match_id: MatchId) -> Result<Option<MatchRecord>, GameError> {
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        if m.state != MatchState::Lobby || m.engine.players().len() < 2 {
            return Ok(None);
        }
        m.state = MatchState::Started;
        tracing::info!(match_id = %match_id, "match started");
        Ok(Some(m.snapshot()))
    }

    /// Checks that a match is running and `player_id` is the one to move.
    fn check_turn(m: &Match, player_id: usize) -> Result<(), GameError> {
        if player_id >= m.engine.players().len() {
            return Err(GameError::UnknownPlayer {
                match_id: m.id,
                player: player_id,
            });
        }
        if m.state != MatchState::Started {
            return Err(IllegalMoveReason::NotInProgress.into());
        }
        if m.engine.current_player_index() != player_id {
            return Err(GameError::OutOfTurn(player_id));
        }
        Ok(())
    }

    fn relay(m: &Match, player_id: usize, deltas: Vec<SquareDelta>, continuation: bool) -> Relay {
        Relay {
            match_id: m.id,
            player_id,
            recipient: m.connection((player_id + 1) % 2).cloned(),
            deltas,
            continuation,
        }
    }

    /// Accepts a board update from the player to move and returns it for
    /// relay to the opponent.
    ///
    /// With `verify_relays` on, the update must describe exactly one legal
    /// move of the sender; the engine's canonical deltas are relayed. With it
    /// off, the update is applied and relayed as given.
    pub fn apply_move(
        &self,
        match_id: MatchId,
        player_id: usize,
        deltas: &[SquareDelta],
    ) -> Result<Relay, GameError> {
        let verify = self.config.read().verify_relays;
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        Self::check_turn(&m, player_id)?;

        if !verify {
            m.engine.apply_unverified(deltas)?;
            return Ok(Self::relay(&m, player_id, deltas.to_vec(), false));
        }

        let (from, to) = match infer_move(&m.engine, deltas) {
            Some(mv) => mv,
            None => {
                tracing::warn!(match_id = %match_id, player = player_id, "board update does not describe a move");
                return Err(IllegalMoveReason::DeltaMismatch.into());
            }
        };
        let expected = m.engine.preview(from, to)?;
        let submitted: HashSet<&SquareDelta> = deltas.iter().collect();
        if expected.len() != deltas.len() || !expected.iter().all(|d| submitted.contains(d)) {
            tracing::warn!(match_id = %match_id, player = player_id, "board update disagrees with engine");
            return Err(IllegalMoveReason::DeltaMismatch.into());
        }
        let report = m.engine.play(from, to)?;
        Ok(Self::relay(&m, player_id, report.deltas, report.continuation))
    }

    /// Applies a move given as source and destination squares.
    pub fn submit_move(
        &self,
        match_id: MatchId,
        player_id: usize,
        from: SquareId,
        to: SquareId,
    ) -> Result<Relay, GameError> {
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        Self::check_turn(&m, player_id)?;
        let report = m.engine.play(from, to)?;
        Ok(Self::relay(&m, player_id, report.deltas, report.continuation))
    }

    /// Hands the turn from `player_id` to the other player. Ends the match if
    /// that decides it.
    pub fn end_turn(&self, match_id: MatchId, player_id: usize) -> Result<MatchRecord, GameError> {
        let verify = self.config.read().verify_relays;
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        Self::check_turn(&m, player_id)?;
        let summary = if verify {
            m.engine.end_turn()?
        } else {
            m.engine.force_end_turn()?
        };
        if let Some(w) = summary.winner {
            self.finish(&mut m, Some(w));
        }
        Ok(m.snapshot())
    }

    /// Ends a match. When a player leaves a started match, the other player
    /// wins. A lobby match is closed without a winner. Ending an ended match
    /// changes nothing.
    pub fn end_match(
        &self,
        match_id: MatchId,
        departing: Option<usize>,
    ) -> Result<MatchRecord, GameError> {
        let slot = self.get(match_id)?;
        let mut m = slot.lock();
        if let Some(p) = departing {
            if p >= m.engine.players().len() {
                return Err(GameError::UnknownPlayer {
                    match_id,
                    player: p,
                });
            }
        }
        match m.state {
            MatchState::Ended => {}
            MatchState::Lobby => self.finish(&mut m, None),
            MatchState::Started => {
                let winner = departing.map(|p| (p + 1) % 2).or(m.engine.winner());
                self.finish(&mut m, winner);
            }
        }
        Ok(m.snapshot())
    }

    fn finish(&self, m: &mut Match, winner: Option<usize>) {
        m.state = MatchState::Ended;
        m.winner = winner;
        if let Some(w) = winner {
            m.engine.declare_winner(w);
        }
        let mut conns = self.connections.write();
        for c in &m.connections {
            conns.remove(c);
        }
        tracing::info!(match_id = %m.id, winner = ?winner, "match ended");
    }

    /// Handles a dropped connection by ending its match.
    pub fn disconnect(&self, connection: &str) -> Result<MatchRecord, GameError> {
        let (match_id, player) = self
            .connections
            .write()
            .remove(connection)
            .ok_or_else(|| GameError::UnknownConnection(connection.to_string()))?;
        tracing::info!(match_id = %match_id, player, connection, "participant disconnected");
        self.end_match(match_id, Some(player))
    }

    /// Drops a match from the arena. Its id stays reserved.
    pub fn remove_match(&self, match_id: MatchId) -> Result<(), GameError> {
        let removed = self
            .matches
            .write()
            .get_mut(match_id.0)
            .and_then(Option::take)
            .ok_or(GameError::UnknownMatch(match_id))?;
        let m = removed.lock();
        let mut conns = self.connections.write();
        for c in &m.connections {
            conns.remove(c);
        }
        Ok(())
    }

    pub fn snapshot(&self, match_id: MatchId) -> Result<MatchRecord, GameError> {
        Ok(self.get(match_id)?.lock().snapshot())
    }

    /// Connections seated in a match, in seat order.
    pub fn connections_of(&self, match_id: MatchId) -> Result<Vec<ConnectionId>, GameError> {
        Ok(self.get(match_id)?.lock().connections.clone())
    }

    /// The match and seat a connection is playing in.
    pub fn seat_of(&self, connection: &str) -> Option<(MatchId, usize)> {
        self.connections.read().get(connection).copied()
    }

    pub fn open_match_count(&self) -> usize {
        self.matches
            .read()
            .iter()
            .flatten()
            .filter(|m| m.lock().is_open())
            .count()
    }
}

/// Reads a `(from, to)` move out of a board update for the player to move:
/// one removal of an own piece and one own piece appearing elsewhere.
fn infer_move(engine: &MatchEngine, deltas: &[SquareDelta]) -> Option<(SquareId, SquareId)> {
    let color = engine.current_player()?.color;
    let board = engine.board();

    let mut from = deltas
        .iter()
        .filter(|d| d.action == DeltaAction::Removed && board.color_at(d.square_id) == Some(color))
        .map(|d| d.square_id);
    let mut to = deltas
        .iter()
        .filter(|d| d.action == DeltaAction::Changed && d.color == Some(color))
        .map(|d| d.square_id);

    match (from.next(), from.next(), to.next(), to.next()) {
        (Some(f), None, Some(t), None) => Some((f, t)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    fn started() -> (MatchCoordinator, MatchId) {
        let coord = MatchCoordinator::new(MatchConfig::default());
        let id = coord.request_match("alice").record.id;
        coord.join_match(id, "alice", "c1").unwrap();
        coord.join_match(id, "bob", "c2").unwrap();
        assert!(coord.try_start(id).unwrap().is_some());
        (coord, id)
    }

    #[test]
    fn lobby_pairing_reuses_open_match() {
        let coord = MatchCoordinator::default();
        let first = coord.request_match("a");
        assert!(first.created);
        assert_eq!(first.record.state, MatchState::Lobby);

        let second = coord.request_match("b");
        assert!(!second.created);
        assert_eq!(second.record.id, first.record.id);

        coord.join_match(first.record.id, "a", "c1").unwrap();
        coord.join_match(first.record.id, "b", "c2").unwrap();
        let third = coord.request_match("c");
        assert!(third.created);
        assert_ne!(third.record.id, first.record.id);
    }

    #[test]
    fn join_assigns_colors_and_rejects_third() {
        let coord = MatchCoordinator::default();
        let id = coord.request_match("a").record.id;
        let p1 = coord.join_match(id, "a", "c1").unwrap();
        let p2 = coord.join_match(id, "b", "c2").unwrap();
        assert_eq!((p1.id, p1.color), (0, Color::Black));
        assert_eq!((p2.id, p2.color), (1, Color::White));
        assert_eq!(coord.join_match(id, "c", "c3").unwrap_err(), GameError::MatchFull(id));
        assert_eq!(coord.seat_of("c2"), Some((id, 1)));
        assert_eq!(coord.seat_of("c3"), None);
    }

    #[test]
    fn try_start_needs_two_players() {
        let coord = MatchCoordinator::default();
        let id = coord.request_match("a").record.id;
        coord.join_match(id, "a", "c1").unwrap();
        assert_eq!(coord.try_start(id).unwrap(), None);
        coord.join_match(id, "b", "c2").unwrap();
        let rec = coord.try_start(id).unwrap().unwrap();
        assert_eq!(rec.state, MatchState::Started);
        assert_eq!(rec.current_player_index, 0);
        assert_eq!(coord.try_start(id).unwrap(), None);
    }

    #[test]
    fn unknown_match_is_invalid_reference() {
        let coord = MatchCoordinator::default();
        assert_eq!(coord.snapshot(MatchId(9)).unwrap_err(), GameError::UnknownMatch(MatchId(9)));
        assert!(coord.join_match(MatchId(9), "a", "c").unwrap_err().is_invalid_reference());
        assert!(coord.end_turn(MatchId(9), 0).unwrap_err().is_invalid_reference());
    }

    #[test]
    fn verified_relay_accepts_legal_update() {
        let (coord, id) = started();
        let deltas = [SquareDelta::removed(18), SquareDelta::changed(27, Color::Black)];
        let relay = coord.apply_move(id, 0, &deltas).unwrap();
        assert_eq!(relay.recipient.as_deref(), Some("c2"));
        assert_eq!(relay.deltas, deltas.to_vec());
        assert!(!relay.continuation);

        let rec = coord.end_turn(id, 0).unwrap();
        assert_eq!(rec.current_player_index, 1);
        assert_eq!(rec.turn_count, 1);
    }

    #[test]
    fn verified_relay_rejects_illegal_update() {
        let (coord, id) = started();
        // Teleport from (2,2) to (2,4).
        let deltas = [SquareDelta::removed(18), SquareDelta::changed(34, Color::Black)];
        assert!(matches!(
            coord.apply_move(id, 0, &deltas).unwrap_err(),
            GameError::IllegalMove(IllegalMoveReason::NotADestination(34))
        ));
        // Extra removal of a white piece alongside a legal step.
        let deltas = [
            SquareDelta::removed(18),
            SquareDelta::removed(41),
            SquareDelta::changed(27, Color::Black),
        ];
        assert_eq!(
            coord.apply_move(id, 0, &deltas).unwrap_err(),
            GameError::IllegalMove(IllegalMoveReason::DeltaMismatch)
        );
        let rec = coord.snapshot(id).unwrap();
        assert_eq!(rec.board, crate::protocol::layout::STANDARD_LAYOUT);
    }

    #[test]
    fn out_of_turn_rejected() {
        let (coord, id) = started();
        let deltas = [SquareDelta::removed(41), SquareDelta::changed(32, Color::White)];
        assert_eq!(coord.apply_move(id, 1, &deltas).unwrap_err(), GameError::OutOfTurn(1));
        assert!(matches!(
            coord.apply_move(id, 5, &deltas).unwrap_err(),
            GameError::UnknownPlayer { player: 5, .. }
        ));
    }

    #[test]
    fn end_turn_by_waiting_player_is_out_of_turn() {
        let (coord, id) = started();
        coord.submit_move(id, 0, 18, 27).unwrap();
        assert_eq!(coord.end_turn(id, 1).unwrap_err(), GameError::OutOfTurn(1));
        let rec = coord.snapshot(id).unwrap();
        assert_eq!(rec.current_player_index, 0);
        assert_eq!(rec.turn_count, 0);
    }

    #[test]
    fn relay_mode_end_turn_advances_once_per_turn() {
        let coord = MatchCoordinator::new(MatchConfig {
            verify_relays: false,
            ..MatchConfig::default()
        });
        let id = coord.request_match("a").record.id;
        coord.join_match(id, "a", "c1").unwrap();
        coord.join_match(id, "b", "c2").unwrap();
        coord.try_start(id).unwrap();

        assert_eq!(coord.end_turn(id, 0).unwrap().current_player_index, 1);
        assert_eq!(coord.end_turn(id, 0).unwrap_err(), GameError::OutOfTurn(0));
        assert_eq!(coord.snapshot(id).unwrap().turn_count, 1);
    }

    #[test]
    fn unverified_relay_passes_through() {
        let coord = MatchCoordinator::new(MatchConfig {
            verify_relays: false,
            ..MatchConfig::default()
        });
        let id = coord.request_match("a").record.id;
        coord.join_match(id, "a", "c1").unwrap();
        coord.join_match(id, "b", "c2").unwrap();
        coord.try_start(id).unwrap();

        let deltas = [SquareDelta::removed(18), SquareDelta::changed(34, Color::Black)];
        let relay = coord.apply_move(id, 0, &deltas).unwrap();
        assert_eq!(relay.deltas, deltas.to_vec());
        assert_eq!(coord.end_turn(id, 0).unwrap().current_player_index, 1);
    }

    #[test]
    fn submit_move_produces_deltas() {
        let (coord, id) = started();
        let relay = coord.submit_move(id, 0, 18, 27).unwrap();
        assert_eq!(
            relay.deltas,
            vec![SquareDelta::removed(18), SquareDelta::changed(27, Color::Black)]
        );
    }

    #[test]
    fn moves_rejected_before_start() {
        let coord = MatchCoordinator::default();
        let id = coord.request_match("a").record.id;
        coord.join_match(id, "a", "c1").unwrap();
        assert_eq!(
            coord.submit_move(id, 0, 18, 27).unwrap_err(),
            GameError::IllegalMove(IllegalMoveReason::NotInProgress)
        );
        assert_eq!(
            coord.end_turn(id, 0).unwrap_err(),
            GameError::IllegalMove(IllegalMoveReason::NotInProgress)
        );
    }

    #[test]
    fn disconnect_mid_match_awards_opponent() {
        let (coord, id) = started();
        let rec = coord.disconnect("c1").unwrap();
        assert_eq!(rec.state, MatchState::Ended);
        assert_eq!(rec.winner.unwrap().id, 1);
        assert_eq!(coord.seat_of("c2"), None);
        assert!(coord.disconnect("c1").unwrap_err().is_invalid_reference());
        assert_eq!(
            coord.submit_move(id, 1, 41, 32).unwrap_err(),
            GameError::IllegalMove(IllegalMoveReason::NotInProgress)
        );
    }

    #[test]
    fn lobby_disconnect_closes_match() {
        let coord = MatchCoordinator::default();
        let id = coord.request_match("a").record.id;
        coord.join_match(id, "a", "c1").unwrap();
        let rec = coord.disconnect("c1").unwrap();
        assert_eq!(rec.state, MatchState::Ended);
        assert!(rec.winner.is_none());
        assert_eq!(coord.open_match_count(), 0);
        assert!(coord.request_match("b").created);
    }

    #[test]
    fn removed_match_is_unknown() {
        let (coord, id) = started();
        coord.remove_match(id).unwrap();
        assert_eq!(coord.snapshot(id).unwrap_err(), GameError::UnknownMatch(id));
        assert_eq!(coord.seat_of("c1"), None);
        assert_eq!(coord.remove_match(id).unwrap_err(), GameError::UnknownMatch(id));
        // Ids are not reused.
        assert_eq!(coord.request_match("x").record.id, MatchId(1));
    }
}
