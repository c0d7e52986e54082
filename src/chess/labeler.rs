use super::{
    engine::{EngineConfig, Evaluator, UciEngine},
    error::{LabelError, Result},
    reader::{Compression, GameReader, resolve_inputs},
    replay::{Replay, should_sample},
    types::{GameRecord, LabeledPosition},
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;

pub const DEFAULT_ENGINE_PATH: &str = "/usr/games/stockfish";
pub const DEFAULT_MAX_GAMES: usize = 200;
pub const DEFAULT_NODES: u64 = 800;
pub const DEFAULT_STRIDE: NonZeroU32 = NonZeroU32::new(4).unwrap();
pub const DEFAULT_MIN_PLY: u32 = 8;

/// Sampling parameters for one labeling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    pub max_games: usize,
    pub nodes: u64,
    pub stride: NonZeroU32,
    pub min_ply: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_games: DEFAULT_MAX_GAMES,
            nodes: DEFAULT_NODES,
            stride: DEFAULT_STRIDE,
            min_ply: DEFAULT_MIN_PLY,
        }
    }
}

/// Everything a full run needs: where to read, where to write, which engine.
#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub input: String,
    pub output: PathBuf,
    pub compression: Compression,
    pub sampling: SamplingConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelStats {
    pub games_processed: usize,
    pub games_skipped: usize,
    pub positions_written: usize,
}

/// Drives an evaluator over a stream of games and writes labeled rows.
pub struct Labeler<E, W> {
    sampling: SamplingConfig,
    evaluator: E,
    out: W,
    stats: LabelStats,
}

impl<E: Evaluator, W: Write> Labeler<E, W> {
    pub fn new(sampling: SamplingConfig, evaluator: E, out: W) -> Self {
        Self {
            sampling,
            evaluator,
            out,
            stats: LabelStats::default(),
        }
    }

    pub fn stats(&self) -> LabelStats {
        self.stats
    }

    pub fn into_parts(self) -> (E, W) {
        (self.evaluator, self.out)
    }

    /// Label games until the cap is reached or the input runs out.
    pub fn label_games(&mut self, games: &mut GameReader) -> Result<LabelStats> {
        while self.stats.games_processed < self.sampling.max_games {
            let Some(game) = games.next_game()? else {
                break;
            };
            self.label_game(games.games_read(), &game)?;
        }
        self.out.flush().map_err(LabelError::Output)?;
        Ok(self.stats)
    }

    /// Returns the number of rows written, `None` when the game was skipped
    /// for lack of a decided result.
    pub fn label_game(&mut self, index: usize, game: &GameRecord) -> Result<Option<usize>> {
        let Some(outcome) = game.game_result().outcome_label() else {
            log::debug!(
                "Skipping game {} ({}): result {:?}",
                index,
                game.describe(),
                game.result.as_deref().unwrap_or("missing")
            );
            self.stats.games_skipped += 1;
            return Ok(None);
        };

        let mut replay = Replay::new(index, game.fen.as_deref())?;

        let mut written = 0;
        for san in &game.moves {
            replay.push(san)?;
            if !should_sample(replay.ply(), self.sampling.min_ply, self.sampling.stride) {
                continue;
            }

            // Engine state is reset only for games that reach a sample.
            if written == 0 {
                self.evaluator.new_game()?;
            }

            let score = self
                .evaluator
                .analyse(&replay.position_command(), self.sampling.nodes)?
                .white_pov(replay.turn());

            let row = LabeledPosition {
                fen: replay.fen(),
                score_cp: score.label_cp(),
                outcome,
            };
            writeln!(self.out, "{row}").map_err(LabelError::Output)?;
            written += 1;
        }

        self.out.flush().map_err(LabelError::Output)?;
        self.stats.games_processed += 1;
        self.stats.positions_written += written;
        log::debug!(
            "Game {} ({}): {} plies, {} positions",
            index,
            game.describe(),
            replay.ply(),
            written
        );
        Ok(Some(written))
    }
}

/// Full run: start the engine, truncate the output, stream the input, then
/// flush and shut the engine down.
pub fn run(config: &LabelerConfig) -> Result<LabelStats> {
    let engine = UciEngine::spawn(&config.engine)?;

    let output = File::create(&config.output).map_err(|source| LabelError::CreateOutput {
        path: config.output.clone(),
        source,
    })?;
    let paths = resolve_inputs(&config.input)?;
    let mut games = GameReader::open(paths, config.compression)?;

    let mut labeler = Labeler::new(config.sampling, engine, BufWriter::new(output));
    let stats = labeler.label_games(&mut games)?;

    let (engine, out) = labeler.into_parts();
    out.into_inner()
        .map_err(|e| LabelError::Output(e.into_error()))?;
    engine.quit()?;

    log::info!(
        "Labeled {} games ({} skipped), wrote {} positions to '{}'",
        stats.games_processed,
        stats.games_skipped,
        stats.positions_written,
        config.output.display()
    );
    Ok(stats)
}
