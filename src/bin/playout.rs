//! Random playout CLI.
//!
//! Plays batches of random matches and writes one JSON record per match.
//!
//! Usage:
//!   cargo run --release --bin playout -- [OPTIONS]
//!
//! Options:
//!   --games N       Number of matches to play (default: 10)
//!   --max-turns N   Turn limit per match (default: 500)
//!   --threads N     Number of parallel threads (default: 4)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --config FILE   Match configuration JSON
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress per-match logging

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use draughts::config::MatchConfig;
use draughts::playout::{self, PlayoutConfig};

fn value<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    args.get(i)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| format!("invalid {} value", flag))
}

fn parse_args(args: &[String]) -> Result<Option<(PlayoutConfig, Option<String>)>, String> {
    let mut config = PlayoutConfig::default();
    let mut output_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                config.num_games = value(args, i, "--games")?;
            }
            "--max-turns" => {
                i += 1;
                config.max_turns = value(args, i, "--max-turns")?;
            }
            "--threads" => {
                i += 1;
                config.threads = value(args, i, "--threads")?;
            }
            "--seed" => {
                i += 1;
                config.seed = value(args, i, "--seed")?;
            }
            "--config" => {
                i += 1;
                let path: String = value(args, i, "--config")?;
                let text = std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
                config.match_config = MatchConfig::from_json(&text).map_err(|e| e.to_string())?;
            }
            "--output" => {
                i += 1;
                output_path = Some(value(args, i, "--output")?);
            }
            "--quiet" => config.quiet = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(Some((config, output_path)))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draughts=info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let (config, output_path) = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        games = config.num_games,
        max_turns = config.max_turns,
        threads = config.threads,
        seed = config.seed,
        "starting playouts"
    );

    let start = Instant::now();
    let games = playout::run_playouts(&config);
    tracing::info!(
        games = games.len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "playouts complete"
    );
    if !config.quiet {
        playout::log_summary(&games);
    }

    let written = match &output_path {
        Some(path) => File::create(path)
            .and_then(|file| playout::write_jsonl(&games, &mut BufWriter::new(file))),
        None => playout::write_jsonl(&games, &mut BufWriter::new(io::stdout().lock())),
    };
    match written {
        Ok(()) => {
            if let Some(path) = output_path {
                tracing::info!(games = games.len(), path = %path, "wrote records");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to write output");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("Usage: playout [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of matches to play (default: 10)");
    eprintln!("  --max-turns N    Turn limit per match (default: 500)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --config FILE    Match configuration JSON");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress per-match logging");
    eprintln!("  --help           Show this help");
}
