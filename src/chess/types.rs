use pgn_reader::SanPlus;
use std::fmt;

/// Declared game result, read from the `Result` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Unknown,
}

impl GameResult {
    /// Anything other than the three decided values (including `*` and a
    /// missing tag) is `Unknown`.
    pub fn from_tag(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("1-0") => Self::WhiteWins,
            Some("0-1") => Self::BlackWins,
            Some("1/2-1/2") => Self::Draw,
            _ => Self::Unknown,
        }
    }

    /// Outcome label from White's perspective, `None` for undecided games.
    pub fn outcome_label(self) -> Option<f32> {
        match self {
            Self::WhiteWins => Some(1.0),
            Self::BlackWins => Some(0.0),
            Self::Draw => Some(0.5),
            Self::Unknown => None,
        }
    }
}

/// One parsed PGN game: the tags we care about plus its mainline.
#[derive(Debug, Clone, Default)]
pub struct GameRecord {
    pub event: Option<String>,
    pub site: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,

    /// Starting position from the `FEN` tag, standard start when absent.
    pub fen: Option<String>,

    pub moves: Vec<SanPlus>,
}

impl GameRecord {
    pub fn game_result(&self) -> GameResult {
        GameResult::from_tag(self.result.as_deref())
    }

    /// Short human label for log lines.
    pub fn describe(&self) -> String {
        let white = self.white.as_deref().unwrap_or("?");
        let black = self.black.as_deref().unwrap_or("?");
        match self.event.as_deref() {
            Some(event) => format!("{white} - {black} ({event})"),
            None => format!("{white} - {black}"),
        }
    }
}

/// A single dataset row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPosition {
    pub fen: String,
    pub score_cp: i32,
    pub outcome: f32,
}

impl fmt::Display for LabeledPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {:.1}", self.fen, self.score_cp, self.outcome)
    }
}
