//! Big-Bench `checkmate_in_one`: a JSON task whose examples pair a game
//! transcript with the mating move in SAN.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::{require, RawUnit, Units};
use crate::board::parse_san;
use crate::error::{ConvertResult, SkipReason};
use crate::game::load_pgn;
use crate::io::open_input;
use crate::record::{PuzzleRecord, Source};

#[derive(Deserialize)]
struct BigBenchTask {
    #[serde(default)]
    examples: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BigBenchExample {
    /// Position in the task's `examples` list, used as the puzzle identity.
    #[serde(skip)]
    pub index: usize,
    pub input: Option<String>,
    pub target: Option<String>,
}

impl BigBenchExample {
    pub fn normalize(self) -> Result<PuzzleRecord, SkipReason> {
        let input = require(self.input, "input")?;
        let target = require(self.target, "target")?;

        let game = load_pgn(&input).map_err(|e| SkipReason::InvalidPgn(e.to_string()))?;
        let board = *game.final_position();
        let mv = parse_san(&board, &target).map_err(|e| SkipReason::InvalidTarget(e.to_string()))?;

        let mut extra = BTreeMap::new();
        extra.insert("target_san".to_string(), Value::String(target.trim().to_string()));

        Ok(PuzzleRecord {
            puzzle_id: format!("bigbench-{}", self.index),
            base_position: board,
            solution_moves: vec![mv.to_string()],
            rating: None,
            source: Source::BigBench,
            extra,
        })
    }
}

/// Parses the whole task document and yields its examples in order.
pub fn parse_examples(reader: impl Read) -> ConvertResult<Vec<Result<BigBenchExample, SkipReason>>> {
    let task: BigBenchTask = serde_json::from_reader(reader)?;
    let examples = task
        .examples
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<BigBenchExample>(value)
                .map(|example| BigBenchExample { index, ..example })
                .map_err(|e| SkipReason::MalformedRow(e.to_string()))
        })
        .collect();
    Ok(examples)
}

pub fn read_examples(path: &Path) -> ConvertResult<Units> {
    let examples = parse_examples(open_input(path)?)?;
    Ok(Box::new(
        examples
            .into_iter()
            .map(|example| Ok(example.map(RawUnit::BigBench))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ReplayBoard;
    use pretty_assertions::assert_eq;

    const FOOLS_MATE_SETUP: &str = "1. f3 e5 2. g4";

    #[test]
    fn test_normalize_resolves_target() {
        let example = BigBenchExample {
            index: 7,
            input: Some(FOOLS_MATE_SETUP.to_string()),
            target: Some("Qh4#".to_string()),
        };
        let record = example.normalize().unwrap();

        assert_eq!(record.puzzle_id, "bigbench-7");
        assert_eq!(record.solution_moves, vec!["d8h4"]);
        assert_eq!(record.rating, None);
        assert_eq!(record.extra["target_san"], "Qh4#");
        assert_eq!(
            record.base_position,
            *load_pgn(FOOLS_MATE_SETUP).unwrap().final_position()
        );
    }

    #[test]
    fn test_unresolvable_target_is_skipped() {
        let example = BigBenchExample {
            index: 0,
            input: Some(FOOLS_MATE_SETUP.to_string()),
            target: Some("Qh5#".to_string()),
        };
        assert!(matches!(example.normalize(), Err(SkipReason::InvalidTarget(_))));
    }

    #[test]
    fn test_promotion_target() {
        let example = BigBenchExample {
            index: 3,
            input: Some("[FEN \"k7/4P3/1K6/8/8/8/8/8 w - - 0 1\"]\n\n*".to_string()),
            target: Some("e8=Q#".to_string()),
        };
        let record = example.normalize().unwrap();
        assert_eq!(record.solution_moves, vec!["e7e8q"]);
    }

    #[test]
    fn test_missing_fields() {
        let example = BigBenchExample {
            index: 0,
            input: None,
            target: Some("e4".to_string()),
        };
        assert_eq!(example.normalize().unwrap_err(), SkipReason::MissingField("input"));
    }

    #[test]
    fn test_parse_examples_keeps_indices() {
        let doc = r#"{
            "name": "checkmate_in_one",
            "examples": [
                {"input": "1. e4 e5", "target": "Nf3"},
                {"input": 42},
                {"input": "1. d4", "target": "d5"}
            ]
        }"#;
        let examples = parse_examples(doc.as_bytes()).unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0].as_ref().unwrap().index, 0);
        assert!(matches!(examples[1], Err(SkipReason::MalformedRow(_))));
        assert_eq!(examples[2].as_ref().unwrap().index, 2);

        let record = examples[2].clone().unwrap().normalize().unwrap();
        assert_eq!(record.solution_moves, vec!["d7d5"]);
        assert_eq!(record.base_position.side_to_move(), chess::Color::Black);
        assert_ne!(record.base_position, ReplayBoard::new());
    }

    #[test]
    fn test_invalid_document_is_fatal() {
        assert!(parse_examples("not json".as_bytes()).is_err());
    }
}
