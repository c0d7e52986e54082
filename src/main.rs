use anyhow::{Context, Result};
use clap::Parser;
use pgn_label::chess::{
    self, Compression, DEFAULT_ENGINE_PATH, DEFAULT_MAX_GAMES, DEFAULT_MIN_PLY, DEFAULT_NODES,
    DEFAULT_STRIDE, EngineConfig, LabelerConfig, SamplingConfig,
};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Label sampled PGN positions with engine scores and game outcomes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input PGN file (or glob pattern)
    pgn: String,

    /// Output file, truncated if it exists
    #[arg(long)]
    out: PathBuf,

    /// Maximum number of decided games to label
    #[arg(long, default_value_t = DEFAULT_MAX_GAMES)]
    games: usize,

    /// Engine node budget per sampled position
    #[arg(long, default_value_t = DEFAULT_NODES)]
    nodes: u64,

    /// Evaluate every Nth ply
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    stride: NonZeroU32,

    /// First ply eligible for sampling
    #[arg(long, default_value_t = DEFAULT_MIN_PLY)]
    minply: u32,

    /// Path to the UCI engine executable
    #[arg(long, default_value = DEFAULT_ENGINE_PATH)]
    sf: PathBuf,

    /// Extra argument passed to the engine executable (repeatable)
    #[arg(long = "sf-arg", allow_hyphen_values = true)]
    sf_args: Vec<String>,

    /// Input compression (only "zstd" is supported)
    #[arg(long, value_parser = Compression::parse)]
    compression: Option<Compression>,
}

impl From<Args> for LabelerConfig {
    fn from(args: Args) -> Self {
        let mut engine = EngineConfig::new(args.sf);
        engine.args = args.sf_args;

        Self {
            input: args.pgn,
            output: args.out,
            compression: args.compression.unwrap_or_default(),
            sampling: SamplingConfig {
                max_games: args.games,
                nodes: args.nodes,
                stride: args.stride,
                min_ply: args.minply,
            },
            engine,
        }
    }
}

fn main() -> Result<()> {
    chess::log::init();

    let config = LabelerConfig::from(Args::parse());
    let stats = chess::run(&config)
        .with_context(|| format!("labeling '{}' failed", config.input))?;

    log::info!(
        "Done: {} games, {} positions",
        stats.games_processed,
        stats.positions_written
    );
    Ok(())
}
