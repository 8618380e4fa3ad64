//! Draughts match server driven over stdin/stdout.
//!
//! Each input line is a command from one connection; each output line is a
//! JSON object naming the recipients and the event they receive. Logs go to
//! stderr and are filtered by `RUST_LOG` (default `draughts=info`).

use std::io::{self, BufRead, Write};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use draughts::config::MatchConfig;
use draughts::protocol::parser::{parse_command, Command};
use draughts::server::Server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draughts=info")))
        .init();

    let config = match std::env::var("DRAUGHTS_CONFIG") {
        Ok(path) => MatchConfig::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => MatchConfig::default(),
    };
    let server = Server::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::SetOption { name, value } => {
                if let Err(e) = server.set_option(&name, value.as_deref()) {
                    tracing::warn!(error = %e, "setoption rejected");
                }
            }
            Command::Session { connection, action } => {
                for outbound in server.handle(&connection, action) {
                    writeln!(out, "{}", outbound.to_json()?)?;
                }
                out.flush()?;
            }
            Command::Quit => break,
        }
    }

    tracing::info!(open = server.coordinator().open_match_count(), "shutting down");
    Ok(())
}
