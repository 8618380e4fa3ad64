//! Session handling.
//!
//! Turns parsed connection commands into coordinator operations and returns
//! the events each participant should receive. Refused actions produce a
//! `rejected` event for the sender and leave all state unchanged.

use crate::config::MatchConfig;
use crate::coordinator::{ConnectionId, MatchCoordinator, MatchId, MatchState, Relay};
use crate::error::{ConfigError, GameError};
use crate::protocol::event::{Event, Outbound};
use crate::protocol::parser::Action;

/// How many times `find` retries when the open match fills up under it.
const FIND_ATTEMPTS: usize = 3;

/// Process-wide session state.
#[derive(Debug, Default)]
pub struct Server {
    coordinator: MatchCoordinator,
}

impl Server {
    pub fn new(config: MatchConfig) -> Self {
        Server {
            coordinator: MatchCoordinator::new(config),
        }
    }

    pub fn coordinator(&self) -> &MatchCoordinator {
        &self.coordinator
    }

    /// Sets a match option for matches created from now on.
    pub fn set_option(&self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let mut config = self.coordinator.config();
        config.set_option(name, value.unwrap_or(""))?;
        self.coordinator.set_config(config);
        Ok(())
    }

    /// Handles one action from a connection.
    pub fn handle(&self, connection: &str, action: Action) -> Vec<Outbound> {
        let result = match action {
            Action::Find { name } => self.find(connection, &name),
            Action::Join { match_id, name } => self.join(connection, match_id, &name, Vec::new()),
            Action::Move { from, to } => self.seat(connection).and_then(|(m, p)| {
                let relay = self.coordinator.submit_move(m, p, from, to)?;
                Ok(vec![board_update(relay, Some(connection))])
            }),
            Action::Update { deltas } => self.seat(connection).and_then(|(m, p)| {
                let relay = self.coordinator.apply_move(m, p, &deltas)?;
                Ok(vec![board_update(relay, None)])
            }),
            Action::EndTurn => self.end_turn(connection),
            Action::Sync => self.seat(connection).and_then(|(m, _)| {
                let record = self.coordinator.snapshot(m)?;
                Ok(vec![Outbound::single(connection, Event::StateSync { record })])
            }),
            Action::Leave => self.leave(connection),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(connection, error = %e, "action rejected");
            vec![Outbound::single(
                connection,
                Event::Rejected {
                    reason: e.to_string(),
                },
            )]
        })
    }

    fn seat(&self, connection: &str) -> Result<(MatchId, usize), GameError> {
        self.coordinator
            .seat_of(connection)
            .ok_or_else(|| GameError::UnknownConnection(connection.to_string()))
    }

    fn find(&self, connection: &str, name: &str) -> Result<Vec<Outbound>, GameError> {
        if let Some((current, _)) = self.coordinator.seat_of(connection) {
            return Err(GameError::AlreadySeated(current));
        }
        let mut last = None;
        for _ in 0..FIND_ATTEMPTS {
            let ticket = self.coordinator.request_match(name);
            let mut out = Vec::new();
            if ticket.created {
                out.push(Outbound::single(
                    connection,
                    Event::MatchCreated {
                        match_id: ticket.record.id,
                    },
                ));
            }
            match self.join(connection, ticket.record.id, name, out) {
                Err(e @ GameError::MatchFull(_)) => last = Some(e),
                other => return other,
            }
        }
        Err(last.unwrap_or_else(|| GameError::UnknownConnection(connection.to_string())))
    }

    fn join(
        &self,
        connection: &str,
        match_id: MatchId,
        name: &str,
        mut out: Vec<Outbound>,
    ) -> Result<Vec<Outbound>, GameError> {
        if let Some((current, _)) = self.coordinator.seat_of(connection) {
            return Err(GameError::AlreadySeated(current));
        }
        let player = self.coordinator.join_match(match_id, name, connection)?;
        let others: Vec<ConnectionId> = self
            .coordinator
            .connections_of(match_id)?
            .into_iter()
            .filter(|c| c != connection)
            .collect();

        out.push(Outbound::single(connection, Event::MatchJoined { match_id }));
        out.push(Outbound::single(
            connection,
            Event::PlayerCreated {
                player: player.clone(),
            },
        ));
        if !others.is_empty() {
            out.push(Outbound::new(others, Event::PlayerJoined { player }));
        }
        out.push(Outbound::single(
            connection,
            Event::StateSync {
                record: self.coordinator.snapshot(match_id)?,
            },
        ));
        if let Some(record) = self.coordinator.try_start(match_id)? {
            let everyone = self.coordinator.connections_of(match_id)?;
            out.push(Outbound::new(everyone, Event::MatchStart { record }));
        }
        Ok(out)
    }

    fn end_turn(&self, connection: &str) -> Result<Vec<Outbound>, GameError> {
        let (match_id, player) = self.seat(connection)?;
        let record = self.coordinator.end_turn(match_id, player)?;
        let everyone = self.coordinator.connections_of(match_id)?;
        let mut out = vec![Outbound::new(
            everyone.clone(),
            Event::StateSync {
                record: record.clone(),
            },
        )];
        if record.state == MatchState::Ended {
            out.push(Outbound::new(everyone, Event::MatchEnded { record }));
            self.coordinator.remove_match(match_id)?;
        }
        Ok(out)
    }

    fn leave(&self, connection: &str) -> Result<Vec<Outbound>, GameError> {
        let record = self.coordinator.disconnect(connection)?;
        let remaining: Vec<ConnectionId> = self
            .coordinator
            .connections_of(record.id)?
            .into_iter()
            .filter(|c| c != connection)
            .collect();
        let mut out = vec![Outbound::single(
            connection,
            Event::MatchEnded {
                record: record.clone(),
            },
        )];
        let match_id = record.id;
        if !remaining.is_empty() {
            out.push(Outbound::new(remaining, Event::MatchEnded { record }));
        }
        self.coordinator.remove_match(match_id)?;
        Ok(out)
    }
}

fn board_update(relay: Relay, echo_to: Option<&str>) -> Outbound {
    let mut to: Vec<ConnectionId> = relay.recipient.into_iter().collect();
    if let Some(sender) = echo_to {
        to.insert(0, sender.to_string());
    }
    Outbound::new(
        to,
        Event::BoardUpdate {
            match_id: relay.match_id,
            player_id: relay.player_id,
            deltas: relay.deltas,
            continuation: relay.continuation,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::protocol::delta::SquareDelta;

    fn types(out: &[Outbound]) -> Vec<String> {
        out.iter()
            .map(|o| serde_json::to_value(&o.event).unwrap()["type"].as_str().unwrap().to_string())
            .collect()
    }

    fn paired() -> Server {
        let server = Server::default();
        server.handle("c1", Action::Find { name: "alice".into() });
        server.handle("c2", Action::Find { name: "bob".into() });
        server
    }

    #[test]
    fn first_find_creates_and_joins() {
        let server = Server::default();
        let out = server.handle("c1", Action::Find { name: "alice".into() });
        assert_eq!(types(&out), ["matchCreated", "matchJoined", "playerCreated", "stateSync"]);
        assert!(out.iter().all(|o| o.to == ["c1"]));
    }

    #[test]
    fn second_find_starts_match() {
        let server = Server::default();
        server.handle("c1", Action::Find { name: "alice".into() });
        let out = server.handle("c2", Action::Find { name: "bob".into() });
        assert_eq!(
            types(&out),
            ["matchJoined", "playerCreated", "playerJoined", "stateSync", "matchStart"]
        );
        assert_eq!(out[2].to, ["c1"]);
        assert_eq!(out[4].to, ["c1", "c2"]);
    }

    #[test]
    fn seated_connection_cannot_find_again() {
        let server = paired();
        let out = server.handle("c1", Action::Find { name: "alice".into() });
        assert_eq!(types(&out), ["rejected"]);
    }

    #[test]
    fn move_echoes_to_both_and_update_relays_to_opponent() {
        let server = paired();
        let out = server.handle("c1", Action::Move { from: 18, to: 27 });
        assert_eq!(types(&out), ["boardUpdate"]);
        assert_eq!(out[0].to, ["c1", "c2"]);

        let out = server.handle("c1", Action::EndTurn);
        assert_eq!(types(&out), ["stateSync"]);

        let out = server.handle(
            "c2",
            Action::Update {
                deltas: vec![SquareDelta::removed(41), SquareDelta::changed(32, Color::White)],
            },
        );
        assert_eq!(types(&out), ["boardUpdate"]);
        assert_eq!(out[0].to, ["c1"]);
    }

    #[test]
    fn end_turn_by_waiting_player_rejected() {
        let server = paired();
        server.handle("c1", Action::Move { from: 18, to: 27 });
        let out = server.handle("c2", Action::EndTurn);
        assert_eq!(types(&out), ["rejected"]);
        match &out[0].event {
            Event::Rejected { reason } => assert!(reason.contains("out of turn")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_connection_rejected() {
        let server = Server::default();
        let out = server.handle("ghost", Action::Sync);
        assert_eq!(types(&out), ["rejected"]);
        assert_eq!(out[0].to, ["ghost"]);
    }

    #[test]
    fn leave_ends_match_for_both() {
        let server = paired();
        let out = server.handle("c2", Action::Leave);
        assert_eq!(types(&out), ["matchEnded", "matchEnded"]);
        assert_eq!(out[1].to, ["c1"]);
        match &out[1].event {
            Event::MatchEnded { record } => assert_eq!(record.winner.as_ref().unwrap().id, 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn seated_find_does_not_open_a_lobby() {
        let server = paired();
        assert_eq!(server.coordinator().open_match_count(), 0);
        server.handle("c1", Action::Find { name: "alice".into() });
        assert_eq!(server.coordinator().open_match_count(), 0);
        assert!(server.coordinator().snapshot(MatchId(1)).is_err());
    }

    #[test]
    fn finished_matches_leave_the_arena() {
        let server = Server::default();
        for i in 0..20 {
            server.handle("c1", Action::Find { name: "alice".into() });
            server.handle("c2", Action::Find { name: "bob".into() });
            server.handle(if i % 2 == 0 { "c1" } else { "c2" }, Action::Leave);
        }
        for i in 0..20 {
            assert!(server.coordinator().snapshot(MatchId(i)).is_err());
        }
        assert_eq!(server.coordinator().open_match_count(), 0);
        assert_eq!(server.coordinator().seat_of("c1"), None);
    }

    #[test]
    fn decided_match_is_removed_after_end_turn() {
        let config = MatchConfig {
            score_threshold: 1,
            ..MatchConfig::default()
        };
        let server = Server::new(config);
        server.handle("c1", Action::Find { name: "alice".into() });
        server.handle("c2", Action::Find { name: "bob".into() });
        // Black (2,2)->(3,3), White (5,5)->(4,4), Black jumps (3,3) over (4,4).
        server.handle("c1", Action::Move { from: 18, to: 27 });
        server.handle("c1", Action::EndTurn);
        server.handle("c2", Action::Move { from: 45, to: 36 });
        server.handle("c2", Action::EndTurn);
        let out = server.handle("c1", Action::Move { from: 27, to: 45 });
        assert_eq!(types(&out), ["boardUpdate"]);

        let out = server.handle("c1", Action::EndTurn);
        assert_eq!(types(&out), ["stateSync", "matchEnded"]);
        assert!(server.coordinator().snapshot(MatchId(0)).is_err());
    }

    #[test]
    fn set_option_applies_to_new_matches() {
        let server = Server::default();
        server.set_option("ScoreThreshold", Some("4")).unwrap();
        assert_eq!(server.coordinator().config().score_threshold, 4);
        assert!(server.set_option("Bogus", Some("1")).is_err());
    }
}
