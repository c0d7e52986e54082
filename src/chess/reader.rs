use super::{
    error::{LabelError, Result},
    types::GameRecord,
    visitor::GameVisitor,
};
use pgn_reader::Reader;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder as ZstdDecoder;

pub type PgnInput = Box<dyn Read + Send>;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    Plain,
    Zstd,
}

impl Compression {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(LabelError::Compression(normalized.to_string()))
        }
    }
}

/// Expand the input argument into concrete paths: a single file, or every
/// match of a glob pattern in sorted order.
pub fn resolve_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    if !(pattern.contains('*') || pattern.contains('?')) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|source| LabelError::Glob {
            pattern: pattern.to_string(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(LabelError::NoInput(pattern.to_string()));
    }
    Ok(paths)
}

pub fn open_input_stream(path: &Path, compression: Compression) -> Result<PgnInput> {
    let file = File::open(path).map_err(|source| LabelError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    match compression {
        Compression::Plain => Ok(Box::new(file)),
        Compression::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|source| LabelError::Decoder {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Turns the first read error into end of input.
///
/// pgn-reader fills its buffer ahead of the game it is parsing, so an error
/// surfacing from `read_game` would discard games that were already fully
/// buffered. Reporting EOF instead lets those games, and the partial game in
/// progress, come out before the input ends.
struct EndOnError {
    inner: PgnInput,
    source: String,
    failed: bool,
}

impl EndOnError {
    fn wrap(inner: PgnInput, source: String) -> PgnInput {
        Box::new(Self {
            inner,
            source,
            failed: false,
        })
    }
}

impl Read for EndOnError {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => {
                    log::warn!("Stopped reading '{}': {}", self.source, error);
                    self.failed = true;
                    return Ok(0);
                }
                ok => return ok,
            }
        }
    }
}

/// Sequential game source over one or more PGN files.
///
/// pgn-reader buffers the underlying reader itself, so no extra `BufReader`
/// layer is added.
pub struct GameReader {
    paths: Vec<PathBuf>,
    compression: Compression,
    next_path_idx: usize,
    current: Option<Reader<PgnInput>>,
    visitor: GameVisitor,
    games_read: usize,
}

impl GameReader {
    /// Opens the first input eagerly so a bad path fails before any work.
    pub fn open(paths: Vec<PathBuf>, compression: Compression) -> Result<Self> {
        let mut reader = Self {
            paths,
            compression,
            next_path_idx: 0,
            current: None,
            visitor: GameVisitor::new(),
            games_read: 0,
        };
        reader.advance_path()?;
        Ok(reader)
    }

    pub fn from_reader(input: PgnInput) -> Self {
        Self {
            paths: Vec::new(),
            compression: Compression::Plain,
            next_path_idx: 0,
            current: Some(Reader::new(EndOnError::wrap(
                input,
                "<stream>".to_string(),
            ))),
            visitor: GameVisitor::new(),
            games_read: 0,
        }
    }

    /// Number of records handed out so far, 1-based index of the last one.
    pub fn games_read(&self) -> usize {
        self.games_read
    }

    fn advance_path(&mut self) -> Result<bool> {
        let Some(path) = self.paths.get(self.next_path_idx) else {
            self.current = None;
            return Ok(false);
        };
        let input = open_input_stream(path, self.compression)?;
        log::debug!("Reading games from '{}'", path.display());
        self.next_path_idx += 1;
        self.current = Some(Reader::new(EndOnError::wrap(
            input,
            path.display().to_string(),
        )));
        Ok(true)
    }

    /// Next game record, or `None` once every input is exhausted.
    ///
    /// A read error ends the current input with a warning rather than
    /// failing the run. Games buffered before the error are still returned,
    /// the last one truncated where the data stopped.
    pub fn next_game(&mut self) -> Result<Option<GameRecord>> {
        loop {
            let Some(reader) = self.current.as_mut() else {
                return Ok(None);
            };

            match reader.read_game(&mut self.visitor) {
                Ok(Some(game)) => {
                    self.games_read += 1;
                    return Ok(Some(game));
                }
                Ok(None) => {}
                Err(error) => {
                    log::warn!(
                        "Stopped reading input after game {}: {}",
                        self.games_read,
                        error
                    );
                }
            }

            if !self.advance_path()? {
                return Ok(None);
            }
        }
    }
}
