use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = LabelError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Failed to open file '{path}': {source}")]
    OpenInput { path: PathBuf, source: io::Error },

    #[error("Failed to initialize zstd decoder for '{path}': {source}")]
    Decoder { path: PathBuf, source: io::Error },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("No input files match '{0}'")]
    NoInput(String),

    #[error("Invalid compression value '{0}'. Supported values: 'zstd' or omitted.")]
    Compression(String),

    #[error("Invalid FEN tag '{fen}' in game {game}: {reason}")]
    SetupPosition {
        game: usize,
        fen: String,
        reason: String,
    },

    #[error("Illegal move {san} at ply {ply} in game {game}: {reason}")]
    IllegalMove {
        game: usize,
        ply: u32,
        san: String,
        reason: String,
    },

    #[error("Failed to spawn engine at {path}: {source}")]
    EngineSpawn { path: PathBuf, source: io::Error },

    #[error("Engine I/O failed: {0}")]
    EngineIo(#[source] io::Error),

    #[error("Engine protocol error: {0}")]
    EngineProtocol(String),

    #[error("Failed to create output file '{path}': {source}")]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}
