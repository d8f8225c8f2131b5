//! Per-source readers and normalization into [`PuzzleRecord`].
//!
//! Every source yields [`RawUnit`]s; `RawUnit::normalize` is the only place
//! source formats differ. Replay, selection and capping are shared.

pub mod bigbench;
pub mod lichess;
pub mod searchless;

use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

use crate::board::ReplayBoard;
use crate::error::{ConvertError, ConvertResult, SkipReason};
use crate::io::open_input;
use crate::record::{PuzzleRecord, Source};

pub use bigbench::BigBenchExample;
pub use lichess::LichessRow;
pub use searchless::SearchlessRow;

/// One raw input unit, before normalization.
#[derive(Debug, Clone)]
pub enum RawUnit {
    BigBench(BigBenchExample),
    Searchless(SearchlessRow),
    SearchlessAction(SearchlessRow),
    Lichess(LichessRow),
}

impl RawUnit {
    pub fn normalize(self) -> Result<PuzzleRecord, SkipReason> {
        match self {
            RawUnit::BigBench(example) => example.normalize(),
            RawUnit::Searchless(row) => row.normalize(Source::GdmSearchless),
            RawUnit::SearchlessAction(row) => row.normalize(Source::GdmSearchlessAction),
            RawUnit::Lichess(row) => row.normalize(),
        }
    }
}

/// A unit that was read, or the reason its row could not be read.
pub type UnitResult = Result<RawUnit, SkipReason>;

/// Lazily read units. An outer `Err` is fatal for the run.
pub type Units = Box<dyn Iterator<Item = ConvertResult<UnitResult>>>;

/// Opens `path` and streams its units in file order.
pub fn read_units(source: Source, path: &Path) -> ConvertResult<Units> {
    match source {
        Source::BigBench => bigbench::read_examples(path),
        Source::GdmSearchless => Ok(csv_units(open_input(path)?, RawUnit::Searchless)),
        Source::GdmSearchlessAction => {
            Ok(csv_units(open_input(path)?, RawUnit::SearchlessAction))
        }
        Source::Lichess => Ok(csv_units(open_input(path)?, RawUnit::Lichess)),
    }
}

/// Deserializes CSV rows. Row-level problems become skips; I/O and
/// decompression failures end the stream with an error.
pub fn csv_units<T, F>(reader: Box<dyn Read>, wrap: F) -> Units
where
    T: DeserializeOwned + 'static,
    F: Fn(T) -> RawUnit + 'static,
{
    let rows = csv::ReaderBuilder::new()
        .from_reader(reader)
        .into_deserialize::<T>();
    Box::new(rows.map(move |row| match row {
        Ok(row) => Ok(Ok(wrap(row))),
        Err(e) if e.is_io_error() => Err(ConvertError::Io(e.into())),
        Err(e) => Ok(Err(SkipReason::MalformedRow(e.to_string()))),
    }))
}

pub(crate) fn require(value: Option<String>, field: &'static str) -> Result<String, SkipReason> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SkipReason::MissingField(field)),
    }
}

pub(crate) fn split_moves(moves: Option<String>) -> Result<Vec<String>, SkipReason> {
    let moves: Vec<String> = require(moves, "Moves")
        .map_err(|_| SkipReason::EmptyMoveList)?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if moves.is_empty() {
        return Err(SkipReason::EmptyMoveList);
    }
    Ok(moves)
}

pub(crate) fn parse_position(fen: &str) -> Result<ReplayBoard, SkipReason> {
    ReplayBoard::from_fen(fen).map_err(|e| SkipReason::InvalidPosition(e.to_string()))
}
