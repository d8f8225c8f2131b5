//! ChessBench puzzles from "Grandmaster-level chess without search".
//!
//! Columns: `PuzzleId,Rating,PGN,Solution,FEN,Moves`. `FEN` is the position
//! before the opponent's setup move and `PGN` is the game that led to it.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{parse_position, require, split_moves};
use crate::error::SkipReason;
use crate::game::load_pgn;
use crate::record::{parse_unsigned, PuzzleRecord, Source};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchlessRow {
    #[serde(rename = "PuzzleId", default)]
    pub puzzle_id: Option<String>,
    #[serde(rename = "Rating", default)]
    pub rating: Option<String>,
    #[serde(rename = "PGN", default)]
    pub pgn: Option<String>,
    #[serde(rename = "Solution", default)]
    pub solution: Option<String>,
    #[serde(rename = "FEN", default)]
    pub fen: Option<String>,
    #[serde(rename = "Moves", default)]
    pub moves: Option<String>,
}

impl SearchlessRow {
    /// `GdmSearchless` replays the `PGN` column and requires it to reach
    /// `FEN`; `GdmSearchlessAction` takes `FEN` as is.
    pub fn normalize(self, source: Source) -> Result<PuzzleRecord, SkipReason> {
        let puzzle_id = require(self.puzzle_id, "PuzzleId")?;
        let fen = require(self.fen, "FEN")?;
        let solution_moves = split_moves(self.moves)?;
        let base_position = parse_position(&fen)?;
        let rating = self.rating.as_deref().and_then(parse_unsigned);

        let mut extra = BTreeMap::new();
        match source {
            Source::GdmSearchlessAction => {
                extra.insert(
                    "evaluation_type".to_string(),
                    Value::String("single_move_accuracy".to_string()),
                );
            }
            _ => {
                let pgn = require(self.pgn, "PGN")?;
                let game = load_pgn(&pgn).map_err(|e| SkipReason::InvalidPgn(e.to_string()))?;
                let expected = base_position.to_fen();
                let actual = game.final_position().to_fen();
                if actual != expected {
                    return Err(SkipReason::PositionMismatch { expected, actual });
                }
                if let Some(solution) = self.solution.filter(|s| !s.is_empty()) {
                    extra.insert("solution_description".to_string(), Value::String(solution));
                }
            }
        }

        Ok(PuzzleRecord {
            puzzle_id,
            base_position,
            solution_moves,
            rating,
            source,
            extra,
        })
    }
}
