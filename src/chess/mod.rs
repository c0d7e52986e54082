mod engine;
mod error;
pub mod log;
mod labeler;
mod reader;
mod replay;
mod score;
mod types;
mod visitor;

pub use engine::{EngineConfig, Evaluator, UciEngine};
pub use error::{LabelError, Result};
pub use labeler::{
    DEFAULT_ENGINE_PATH, DEFAULT_MAX_GAMES, DEFAULT_MIN_PLY, DEFAULT_NODES, DEFAULT_STRIDE,
    LabelStats, Labeler, LabelerConfig, SamplingConfig, run,
};
pub use reader::{Compression, GameReader, resolve_inputs};
pub use replay::{Replay, should_sample};
pub use score::{MATE_SCORE, Score, parse_info_score};
pub use types::{GameRecord, GameResult, LabeledPosition};
pub use visitor::GameVisitor;
