use super::types::GameRecord;

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use std::mem;
use std::ops::ControlFlow;

/// Streaming PGN visitor (pgn-reader).
///
/// Captures the handful of tags the labeler needs and collects the mainline
/// SAN moves. Variations are skipped, comments and NAGs ignored. Each
/// `read_game` call yields one `GameRecord`.
#[derive(Debug, Default)]
pub struct GameVisitor;

impl GameVisitor {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default)]
pub struct HeaderFields {
    event: String,
    site: String,
    white: String,
    black: String,
    result: String,
    fen: String,
}

impl HeaderFields {
    fn opt_take(field: &mut String) -> Option<String> {
        if field.is_empty() {
            None
        } else {
            Some(mem::take(field))
        }
    }

    fn set_known_tag(&mut self, key: &[u8], value: RawTag<'_>) {
        let slot: &mut String = match key {
            b"Event" => &mut self.event,
            b"Site" => &mut self.site,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"Result" => &mut self.result,
            b"FEN" => &mut self.fen,
            _ => return,
        };

        // First occurrence wins.
        if !slot.is_empty() {
            return;
        }

        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return;
        }

        *slot = String::from_utf8_lossy(bytes).trim().to_string();
    }

    fn into_record(mut self) -> GameRecord {
        GameRecord {
            event: Self::opt_take(&mut self.event),
            site: Self::opt_take(&mut self.site),
            white: Self::opt_take(&mut self.white),
            black: Self::opt_take(&mut self.black),
            result: Self::opt_take(&mut self.result),
            fen: Self::opt_take(&mut self.fen),
            moves: Vec::with_capacity(128),
        }
    }
}

impl Visitor for GameVisitor {
    type Tags = HeaderFields;
    type Movetext = GameRecord;
    type Output = GameRecord;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(HeaderFields::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.set_known_tag(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(tags.into_record())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, game: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        game.moves.push(san);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: Self::Movetext) -> Self::Output {
        game
    }
}
