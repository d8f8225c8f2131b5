use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::board::ReplayBoard;

/// Rating assumed when a source has none or it is not a plain number.
pub const DEFAULT_RATING: u32 = 1500;

/// The closed set of puzzle sources. Serialized as the `source` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Big-Bench checkmate-in-one (JSON, PGN inputs)
    BigBench,
    /// ChessBench puzzle sequences (CSV with PGN context)
    GdmSearchless,
    /// ChessBench puzzles, first move only
    GdmSearchlessAction,
    /// Lichess puzzle database (CSV, usually zstd compressed)
    Lichess,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::BigBench,
        Source::GdmSearchless,
        Source::GdmSearchlessAction,
        Source::Lichess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::BigBench => "big_bench",
            Source::GdmSearchless => "gdm_searchless",
            Source::GdmSearchlessAction => "gdm_searchless_action",
            Source::Lichess => "lichess",
        }
    }

    pub fn puzzle_type(&self) -> &'static str {
        match self {
            Source::BigBench => "checkmate_in_one",
            Source::GdmSearchless => "tactical_sequence",
            Source::GdmSearchlessAction => "action_accuracy",
            Source::Lichess => "lichess_puzzle",
        }
    }

    pub fn selection_mode(&self) -> SelectionMode {
        match self {
            Source::BigBench | Source::GdmSearchlessAction => SelectionMode::FirstMove,
            Source::GdmSearchless | Source::Lichess => SelectionMode::Sequence,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which indices of a solution line are evaluation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Odd indices (1, 3, 5, ...). Even indices are the opponent's replies
    /// and are only replayed.
    Sequence,
    /// Index 0 on the base position only.
    FirstMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn from_rating(rating: u32) -> Self {
        match rating {
            r if r < 1000 => Difficulty::Beginner,
            r if r < 1500 => Difficulty::Easy,
            r if r < 2000 => Difficulty::Medium,
            r if r < 2500 => Difficulty::Hard,
            _ => Difficulty::Expert,
        }
    }
}

/// Parses a numeric column. Anything but a plain run of ASCII digits is unset.
pub fn parse_unsigned(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// One normalized puzzle, independent of the source format.
#[derive(Debug, Clone)]
pub struct PuzzleRecord {
    pub puzzle_id: String,
    pub base_position: ReplayBoard,
    pub solution_moves: Vec<String>,
    pub rating: Option<u32>,
    pub source: Source,
    pub extra: BTreeMap<String, Value>,
}

impl PuzzleRecord {
    pub fn effective_rating(&self) -> u32 {
        self.rating.unwrap_or(DEFAULT_RATING)
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_rating(self.effective_rating())
    }
}
