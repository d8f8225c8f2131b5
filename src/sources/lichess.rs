use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{parse_position, require, split_moves};
use crate::error::SkipReason;
use crate::record::{parse_unsigned, PuzzleRecord, Source};

/// Themes kept per puzzle in the benchmark metadata.
const MAX_THEMES: usize = 3;

/// One row of `lichess_db_puzzle.csv`:
/// `PuzzleId,FEN,Moves,Rating,RatingDeviation,Popularity,NbPlays,Themes,GameUrl,OpeningTags`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LichessRow {
    #[serde(rename = "PuzzleId", default)]
    pub puzzle_id: Option<String>,
    #[serde(rename = "FEN", default)]
    pub fen: Option<String>,
    #[serde(rename = "Moves", default)]
    pub moves: Option<String>,
    #[serde(rename = "Rating", default)]
    pub rating: Option<String>,
    #[serde(rename = "Popularity", default)]
    pub popularity: Option<String>,
    #[serde(rename = "Themes", default)]
    pub themes: Option<String>,
}

impl LichessRow {
    pub fn normalize(self) -> Result<PuzzleRecord, SkipReason> {
        let puzzle_id = require(self.puzzle_id, "PuzzleId")?;
        let fen = require(self.fen, "FEN")?;
        let solution_moves = split_moves(self.moves)?;
        let base_position = parse_position(&fen)?;
        let rating = self.rating.as_deref().and_then(parse_unsigned);

        let themes: Vec<Value> = self
            .themes
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .take(MAX_THEMES)
            .map(|t| Value::String(t.to_string()))
            .collect();
        let popularity = self.popularity.as_deref().and_then(parse_unsigned).unwrap_or(0);

        let mut extra = BTreeMap::new();
        extra.insert("themes".to_string(), Value::Array(themes));
        extra.insert("popularity".to_string(), Value::from(popularity));

        Ok(PuzzleRecord {
            puzzle_id,
            base_position,
            solution_moves,
            rating,
            source: Source::Lichess,
            extra,
        })
    }
}
