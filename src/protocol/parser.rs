//! Line protocol command parser.
//!
//! Each line carries one command. Session commands start with the sending
//! connection's id: `<conn> <verb> [args...]`. Two commands are not tied to a
//! connection: `setoption name <id> [value <x>]` and `quit`.

use crate::board::SquareId;
use crate::coordinator::MatchId;

use super::delta::{parse_deltas, SquareDelta};

/// What a connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Find or open a lobby match and take a seat in it.
    Find { name: String },

    /// Take a seat in a specific match.
    Join { match_id: MatchId, name: String },

    /// Move a piece; the server computes the resulting update.
    Move { from: SquareId, to: SquareId },

    /// Relay a board update computed by the client.
    Update { deltas: Vec<SquareDelta> },

    EndTurn,

    /// Ask for the full match state.
    Sync,

    /// Leave the current match.
    Leave,
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change a match option for matches created from now on.
    SetOption { name: String, value: Option<String> },

    Session { connection: String, action: Action },

    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines, unknown verbs, and malformed arguments.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => None,
        ["quit"] => Some(Command::Quit),
        ["setoption", ..] => parse_setoption(&tokens),
        [connection, verb, args @ ..] => {
            let action = parse_action(verb, args)?;
            Some(Command::Session {
                connection: connection.to_string(),
                action,
            })
        }
        [other] => {
            tracing::warn!(command = other, "unknown command");
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        tracing::warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let (name, value) = match tokens.iter().position(|&t| t == "value") {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            if name_parts.is_empty() {
                tracing::warn!("malformed setoption: empty name");
                return None;
            }
            let value_parts = &tokens[vi + 1..];
            let value = (!value_parts.is_empty()).then(|| value_parts.join(" "));
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

fn parse_action(verb: &str, args: &[&str]) -> Option<Action> {
    match (verb, args) {
        ("find", [name]) => Some(Action::Find {
            name: name.to_string(),
        }),
        ("join", [id, name]) => match id.parse() {
            Ok(match_id) => Some(Action::Join {
                match_id,
                name: name.to_string(),
            }),
            Err(_) => {
                tracing::warn!(value = id, "invalid match id");
                None
            }
        },
        ("move", [from, to]) => match (from.parse(), to.parse()) {
            (Ok(from), Ok(to)) => Some(Action::Move { from, to }),
            _ => {
                tracing::warn!(from, to, "invalid square id");
                None
            }
        },
        ("update", [deltas]) => match parse_deltas(deltas) {
            Ok(deltas) => Some(Action::Update { deltas }),
            Err(e) => {
                tracing::warn!(error = %e, "invalid board update");
                None
            }
        },
        ("endturn", []) => Some(Action::EndTurn),
        ("sync", []) => Some(Action::Sync),
        ("leave", []) => Some(Action::Leave),
        (verb, args) => {
            tracing::warn!(verb, argc = args.len(), "unknown or malformed command");
            None
        }
    }
}
