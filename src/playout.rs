//! Random playouts of complete matches.
//!
//! Plays matches to completion by picking uniformly random legal moves for
//! both sides through the regular engine API. Used as a soak test of the
//! rules and as benchmark input, and written out as JSONL for inspection.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::board::{Color, ALL_COLORS};
use crate::config::MatchConfig;
use crate::engine::MatchEngine;
use crate::error::GameError;

/// Configuration for a batch of playouts.
#[derive(Debug, Clone)]
pub struct PlayoutConfig {
    pub num_games: usize,
    /// Turn limit after which a match is recorded without a winner.
    pub max_turns: u32,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Base random seed; game `i` uses `seed + i`. 0 uses entropy.
    pub seed: u64,
    /// Suppress per-game progress logging.
    pub quiet: bool,
    pub match_config: MatchConfig,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        PlayoutConfig {
            num_games: 10,
            max_turns: 500,
            threads: 4,
            seed: 0,
            quiet: false,
            match_config: MatchConfig::default(),
        }
    }
}

/// Outcome of one playout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoutRecord {
    pub game_id: usize,
    pub winner: Option<Color>,
    pub turns: u32,
    /// Pieces captured by each side, indexed by `Color::index`.
    pub captures: [u32; 2],
    /// Pieces left on the board for each side.
    pub remaining: [usize; 2],
}

fn rng_for(config: &PlayoutConfig, game_id: usize) -> SmallRng {
    if config.seed != 0 {
        SmallRng::seed_from_u64(config.seed.wrapping_add(game_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays a single match with random moves and returns its record.
pub fn play_game(
    config: &PlayoutConfig,
    game_id: usize,
    rng: &mut SmallRng,
) -> Result<PlayoutRecord, GameError> {
    let mut engine = MatchEngine::new(&config.match_config);

    while engine.winner().is_none() && engine.turn_count() < config.max_turns {
        loop {
            let moves = engine.legal_moves();
            let Some(mv) = moves.choose(rng) else {
                break;
            };
            if !engine.play(mv.from, mv.to)?.continuation {
                break;
            }
        }
        engine.end_turn()?;
    }

    let mut captures = [0u32; 2];
    for player in engine.players() {
        captures[player.color.index()] = player.score;
    }
    let remaining = ALL_COLORS.map(|c| engine.board().piece_count(c));

    Ok(PlayoutRecord {
        game_id,
        winner: engine
            .winner()
            .and_then(|w| engine.player(w))
            .map(|p| p.color),
        turns: engine.turn_count(),
        captures,
        remaining,
    })
}

/// Runs a batch of playouts and collects the records.
///
/// When `config.threads > 1`, games are played concurrently using rayon.
pub fn run_playouts(config: &PlayoutConfig) -> Vec<PlayoutRecord> {
    let mut games = Vec::with_capacity(config.num_games);
    run_playouts_with_callback(config, |game| games.push(game));
    games.sort_by_key(|g| g.game_id);
    games
}

/// Runs a batch of playouts, calling `on_game` as each one completes.
pub fn run_playouts_with_callback<F>(config: &PlayoutConfig, on_game: F)
where
    F: FnMut(PlayoutRecord) + Send,
{
    if config.threads > 1 {
        run_parallel(config, on_game);
    } else {
        run_sequential(config, on_game);
    }
}

fn finish_game(config: &PlayoutConfig, game_id: usize, completed: usize) -> Option<PlayoutRecord> {
    let start = Instant::now();
    let mut rng = rng_for(config, game_id);
    match play_game(config, game_id, &mut rng) {
        Ok(game) => {
            if !config.quiet {
                tracing::info!(
                    game = completed,
                    total = config.num_games,
                    winner = ?game.winner,
                    turns = game.turns,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "playout finished"
                );
            }
            Some(game)
        }
        Err(e) => {
            tracing::error!(game_id, error = %e, "playout aborted");
            None
        }
    }
}

fn run_sequential<F>(config: &PlayoutConfig, mut on_game: F)
where
    F: FnMut(PlayoutRecord),
{
    for i in 0..config.num_games {
        if let Some(game) = finish_game(config, i, i + 1) {
            on_game(game);
        }
    }
}

/// Plays games on a rayon pool and hands them to `on_game` on the calling
/// thread through a channel.
fn run_parallel<F>(config: &PlayoutConfig, mut on_game: F)
where
    F: FnMut(PlayoutRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "thread pool unavailable, playing sequentially");
            return run_sequential(config, on_game);
        }
    };

    let (tx, rx) = mpsc::channel::<PlayoutRecord>();
    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        let completed = AtomicUsize::new(0);
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(game) = finish_game(&config_clone, i, n) {
                        let _ = tx.send(game);
                    }
                });
        });
    });

    for game in rx {
        on_game(game);
    }

    if handle.join().is_err() {
        tracing::error!("playout worker thread panicked");
    }
}

/// Writes records as JSONL, one object per line.
pub fn write_jsonl<W: Write>(games: &[PlayoutRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Logs aggregate results of a batch.
pub fn log_summary(games: &[PlayoutRecord]) {
    let total = games.len().max(1) as f64;
    let mut wins = [0usize; 2];
    let mut undecided = 0usize;
    let mut turns = 0u64;
    for game in games {
        turns += u64::from(game.turns);
        match game.winner {
            Some(c) => wins[c.index()] += 1,
            None => undecided += 1,
        }
    }
    tracing::info!(
        games = games.len(),
        black_wins = wins[Color::Black.index()],
        white_wins = wins[Color::White.index()],
        undecided,
        avg_turns = turns as f64 / total,
        "playout summary"
    );
}
