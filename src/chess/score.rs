use shakmaty::Color;

/// Magnitude written for any forced mate.
pub const MATE_SCORE: i32 = 20_000;

/// Engine score as reported on an `info` line, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Moves to mate; positive when the side to move mates, `0` when the
    /// side to move is already checkmated.
    Mate(i32),
}

impl Score {
    /// Re-express a side-to-move score from White's point of view.
    pub fn white_pov(self, turn: Color) -> Score {
        match turn {
            Color::White => self,
            Color::Black => self.flip(),
        }
    }

    fn flip(self) -> Score {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            // Mate(0) would lose its meaning under negation, so it is mapped
            // to "the other side mates".
            Score::Mate(0) => Score::Mate(1),
            Score::Mate(n) => Score::Mate(-n),
        }
    }

    /// Dataset value: centipawns as-is, mates as `±MATE_SCORE`.
    pub fn label_cp(self) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::Mate(n) if n > 0 => MATE_SCORE,
            Score::Mate(_) => -MATE_SCORE,
        }
    }
}

/// Pull the score out of a UCI `info` line.
///
/// Secondary PVs (`multipv` other than 1) are ignored; `lowerbound` /
/// `upperbound` markers are accepted as the current score.
pub fn parse_info_score(line: &str) -> Option<Score> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first().copied() != Some("info") {
        return None;
    }

    let mut score = None;
    let mut i = 1;
    while i < tokens.len() {
        match tokens[i] {
            "multipv" => {
                if tokens.get(i + 1).and_then(|v| v.parse::<u32>().ok()) != Some(1) {
                    return None;
                }
                i += 1;
            }
            "score" => {
                let value = tokens.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                score = match (tokens.get(i + 1).copied(), value) {
                    (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => score,
                };
                i += 2;
            }
            // Everything after `pv`/`string` is free-form.
            "pv" | "string" => break,
            _ => {}
        }
        i += 1;
    }
    score
}
