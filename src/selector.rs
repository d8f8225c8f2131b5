//! Turns a normalized puzzle into the positions a model is scored on.
//!
//! The solution line is replayed one move at a time from the base position.
//! In sequence mode the odd indices are evaluation points: index 0 is the
//! opponent's setup move, index 1 is the reply under test, and so on. Every
//! move is applied, evaluation point or not, so later positions stay on the
//! solution line. Replay stops at the first move that cannot be applied.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::board::{parse_uci, ReplayBoard};
use crate::error::ReplayError;
use crate::record::{Difficulty, PuzzleRecord, SelectionMode, Source};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMetadata {
    pub puzzle_id: String,
    pub rating: u32,
    pub puzzle_type: String,
    pub difficulty: Difficulty,
    pub source: Source,
    #[serde(rename = "move_index_in_sequence")]
    pub sequence_index: usize,
    #[serde(rename = "total_moves_in_sequence")]
    pub sequence_length: usize,
    #[serde(rename = "solution_sequence")]
    pub solution_moves: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A position and the move the model is expected to find there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationPosition {
    pub fen: String,
    pub correct_move: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_fen: Option<String>,
    pub metadata: PositionMetadata,
}

/// Where and why replay of a solution line stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayHalt {
    pub index: usize,
    pub reason: ReplayError,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub positions: Vec<EvaluationPosition>,
    pub halted: Option<ReplayHalt>,
}

fn is_evaluation_point(mode: SelectionMode, index: usize) -> bool {
    match mode {
        SelectionMode::Sequence => index % 2 == 1,
        SelectionMode::FirstMove => index == 0,
    }
}

fn evaluation_position(
    record: &PuzzleRecord,
    board: &ReplayBoard,
    index: usize,
) -> EvaluationPosition {
    EvaluationPosition {
        fen: board.to_fen(),
        correct_move: record.solution_moves[index].clone(),
        encoded_fen: None,
        metadata: PositionMetadata {
            puzzle_id: record.puzzle_id.clone(),
            rating: record.effective_rating(),
            puzzle_type: record.source.puzzle_type().to_string(),
            difficulty: record.difficulty(),
            source: record.source,
            sequence_index: index,
            sequence_length: record.solution_moves.len(),
            solution_moves: record.solution_moves.clone(),
            extra: record.extra.clone(),
        },
    }
}

/// Replays `record` and collects its evaluation positions in line order.
pub fn select_positions(record: &PuzzleRecord, mode: SelectionMode) -> Selection {
    let mut selection = Selection::default();
    let mut board = record.base_position;

    for (index, text) in record.solution_moves.iter().enumerate() {
        if mode == SelectionMode::FirstMove && index > 0 {
            break;
        }

        let parsed = parse_uci(text);

        if is_evaluation_point(mode, index) && parsed.map_or(false, |mv| board.legal(&mv)) {
            selection.positions.push(evaluation_position(record, &board, index));
        }

        let step = parsed
            .ok_or_else(|| ReplayError::Unparsable(text.clone()))
            .and_then(|mv| board.apply(&mv));
        match step {
            Ok(next) => board = next,
            Err(reason) => {
                selection.halted = Some(ReplayHalt { index, reason });
                break;
            }
        }
    }

    selection
}
