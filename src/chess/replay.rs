use super::error::{LabelError, Result};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Position, fen::Fen, san::SanPlus, uci::UciMove,
};
use std::fmt::Write;
use std::num::NonZeroU32;

/// Whether the position after `ply` half-moves gets an engine evaluation.
pub fn should_sample(ply: u32, min_ply: u32, stride: NonZeroU32) -> bool {
    ply >= min_ply && ply.is_multiple_of(stride.get())
}

fn render_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Board state while walking one game's mainline.
///
/// Keeps the UCI history since the starting position so the engine sees
/// the same move sequence (and therefore the same repetitions) as the game.
pub struct Replay {
    game: usize,
    start_fen: Option<String>,
    board: Chess,
    history: Vec<UciMove>,
    ply: u32,
}

impl Replay {
    /// `game` is the 1-based input index, used for error reporting only.
    pub fn new(game: usize, fen: Option<&str>) -> Result<Self> {
        let (start_fen, board) = match fen {
            None => (None, Chess::default()),
            Some(raw) => {
                let setup_error = |reason: String| LabelError::SetupPosition {
                    game,
                    fen: raw.to_string(),
                    reason,
                };
                let parsed: Fen = raw.parse().map_err(|e| setup_error(format!("{e}")))?;
                let board: Chess = parsed
                    .into_position(CastlingMode::Standard)
                    .map_err(|e| setup_error(format!("{e}")))?;
                (Some(render_fen(&board)), board)
            }
        };

        Ok(Self {
            game,
            start_fen,
            board,
            history: Vec::with_capacity(128),
            ply: 0,
        })
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Plays the next mainline move. Illegal or ambiguous SAN is fatal.
    pub fn push(&mut self, san: &SanPlus) -> Result<()> {
        let m = san
            .san
            .to_move(&self.board)
            .map_err(|e| LabelError::IllegalMove {
                game: self.game,
                ply: self.ply + 1,
                san: san.to_string(),
                reason: e.to_string(),
            })?;

        self.history.push(m.to_uci(CastlingMode::Standard));
        self.board.play_unchecked(m);
        self.ply += 1;
        Ok(())
    }

    pub fn fen(&self) -> String {
        render_fen(&self.board)
    }

    /// UCI `position` command reproducing the game so far.
    pub fn position_command(&self) -> String {
        let mut cmd = match &self.start_fen {
            Some(fen) => format!("position fen {fen}"),
            None => "position startpos".to_string(),
        };

        if !self.history.is_empty() {
            cmd.push_str(" moves");
            for m in &self.history {
                let _ = write!(cmd, " {m}");
            }
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stride(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn play(replay: &mut Replay, moves: &[&str]) {
        for token in moves {
            let san: SanPlus = token.parse().unwrap();
            replay.push(&san).unwrap();
        }
    }

    #[test]
    fn test_should_sample_respects_min_ply_and_stride() {
        assert!(!should_sample(4, 8, stride(4)));
        assert!(should_sample(8, 8, stride(4)));
        assert!(!should_sample(9, 8, stride(4)));
        assert!(should_sample(12, 8, stride(4)));
        assert!(should_sample(9, 8, stride(1)));
    }

    #[test]
    fn test_sample_count_matches_multiples_in_range() {
        for (plies, min_ply, n) in [(10, 8, 1), (40, 8, 4), (7, 8, 4), (30, 0, 3), (25, 5, 7)] {
            let sampled = (1..=plies)
                .filter(|&p| should_sample(p, min_ply, stride(n)))
                .count();
            let expected = (min_ply.max(1)..=plies).filter(|p| p % n == 0).count();
            assert_eq!(sampled, expected, "plies={plies} min={min_ply} stride={n}");
        }
    }

    #[test]
    fn test_replay_tracks_ply_turn_and_fen() {
        let mut replay = Replay::new(1, None).unwrap();
        assert_eq!(replay.ply(), 0);
        assert_eq!(replay.turn(), Color::White);

        play(&mut replay, &["e4"]);
        assert_eq!(replay.ply(), 1);
        assert_eq!(replay.turn(), Color::Black);
        // No legal en passant capture, so no e3 square.
        assert_eq!(
            replay.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_replay_fen_shows_legal_en_passant() {
        let mut replay = Replay::new(1, None).unwrap();
        play(&mut replay, &["e4", "a6", "e5", "d5"]);
        assert_eq!(
            replay.fen(),
            "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
        );
    }

    #[test]
    fn test_position_command_startpos() {
        let mut replay = Replay::new(1, None).unwrap();
        assert_eq!(replay.position_command(), "position startpos");

        play(&mut replay, &["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "O-O"]);
        assert_eq!(
            replay.position_command(),
            "position startpos moves e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 e1g1"
        );
    }

    #[test]
    fn test_replay_from_fen_tag() {
        let mut replay = Replay::new(1, Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")).unwrap();
        play(&mut replay, &["e4"]);
        assert_eq!(
            replay.position_command(),
            "position fen 4k3/8/8/8/8/8/4P3/4K3 w - - 0 1 moves e2e4"
        );
        assert_eq!(replay.fen(), "4k3/8/8/8/4P3/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn test_replay_rejects_bad_fen() {
        let err = Replay::new(5, Some("not a fen")).err().unwrap();
        assert!(matches!(err, LabelError::SetupPosition { game: 5, .. }));
    }

    #[test]
    fn test_replay_illegal_move_is_error() {
        let mut replay = Replay::new(2, None).unwrap();
        play(&mut replay, &["e4"]);

        let san: SanPlus = "e4".parse().unwrap();
        let err = replay.push(&san).unwrap_err();
        match err {
            LabelError::IllegalMove { game, ply, san, .. } => {
                assert_eq!(game, 2);
                assert_eq!(ply, 2);
                assert_eq!(san, "e4");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(replay.ply(), 1);
    }
}
