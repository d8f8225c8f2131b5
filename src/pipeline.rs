use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::dedup::{PuzzleCap, DEFAULT_PUZZLE_CAP};
use crate::encoding::encode_fixed_width;
use crate::error::{ConvertResult, SkipKind, SkipReason};
use crate::record::Source;
use crate::selector::{select_positions, EvaluationPosition};
use crate::sources::UnitResult;

/// Skips beyond this many are logged at debug level only.
const MAX_REPORTED_SKIPS: usize = 10;
const PROGRESS_INTERVAL: usize = 50_000;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of distinct puzzles that may contribute positions.
    pub cap: usize,
    /// Attach the fixed-width encoding of each position as `encoded_fen`.
    pub fixed_width: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_PUZZLE_CAP,
            fixed_width: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults for `source`. Big-Bench is a few thousand examples and is
    /// kept whole; the puzzle databases are capped.
    pub fn for_source(source: Source) -> Self {
        let cap = match source {
            Source::BigBench => usize::MAX,
            _ => DEFAULT_PUZZLE_CAP,
        };
        Self {
            cap,
            ..Default::default()
        }
    }
}

/// What happened to one input unit.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Accepted { puzzle_id: String, positions: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub puzzles_accepted: usize,
    pub positions_emitted: usize,
    pub skipped: BTreeMap<SkipKind, usize>,
    /// Puzzles whose replay stopped at a move that could not be applied.
    pub halted_replays: usize,
    pub cap_reached: bool,
}

impl PipelineReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_of(&self, kind: SkipKind) -> usize {
        self.skipped.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} puzzles accepted, {} positions, {} skipped",
            self.rows_read,
            self.puzzles_accepted,
            self.positions_emitted,
            self.skipped_total()
        )?;
        if self.cap_reached {
            write!(f, " (cap reached)")?;
        }
        Ok(())
    }
}

/// Sequential extraction run. Units are processed strictly in input order;
/// the cap keeps the first qualifying puzzles.
pub struct Pipeline {
    config: PipelineConfig,
    cap: PuzzleCap,
    positions: Vec<EvaluationPosition>,
    report: PipelineReport,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let cap = PuzzleCap::new(config.cap);
        Self {
            config,
            cap,
            positions: Vec::new(),
            report: PipelineReport::default(),
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.cap.is_full()
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    fn skip(&mut self, index: usize, reason: SkipReason) -> RecordOutcome {
        let seen = self.report.skipped_total();
        if seen < MAX_REPORTED_SKIPS {
            warn!("skipping record {index}: {reason}");
        } else {
            debug!("skipping record {index}: {reason}");
        }
        *self.report.skipped.entry(reason.kind()).or_insert(0) += 1;
        RecordOutcome::Skipped(reason)
    }

    /// Normalizes, replays and accounts for one unit.
    pub fn process(&mut self, index: usize, unit: UnitResult) -> RecordOutcome {
        self.report.rows_read += 1;

        let record = match unit.and_then(|raw| raw.normalize()) {
            Ok(record) => record,
            Err(reason) => return self.skip(index, reason),
        };

        if self.cap.contains(record.source, &record.puzzle_id) {
            return self.skip(index, SkipReason::Duplicate(record.puzzle_id));
        }

        let selection = select_positions(&record, record.source.selection_mode());
        if let Some(halt) = &selection.halted {
            self.report.halted_replays += 1;
            debug!(
                "puzzle {} replay stopped at move {}: {}",
                record.puzzle_id, halt.index, halt.reason
            );
        }
        if selection.positions.is_empty() {
            return self.skip(index, SkipReason::NoEvaluationPoints);
        }

        self.cap.accept(record.source, &record.puzzle_id);
        let mut emitted = selection.positions;
        if self.config.fixed_width {
            for position in &mut emitted {
                match encode_fixed_width(&position.fen) {
                    Ok(encoded) => position.encoded_fen = Some(encoded),
                    Err(e) => warn!("puzzle {}: cannot encode {}: {e}", record.puzzle_id, position.fen),
                }
            }
        }

        let count = emitted.len();
        self.positions.extend(emitted);
        self.report.puzzles_accepted += 1;
        self.report.positions_emitted += count;
        RecordOutcome::Accepted {
            puzzle_id: record.puzzle_id,
            positions: count,
        }
    }

    /// Drains `units` until they run out or the cap is full. The cap is
    /// checked before each pull, so input past the cap is never read.
    pub fn run<I>(mut self, units: I) -> ConvertResult<(Vec<EvaluationPosition>, PipelineReport)>
    where
        I: IntoIterator<Item = ConvertResult<UnitResult>>,
    {
        let mut units = units.into_iter();
        let mut index = 0;
        loop {
            if self.is_saturated() {
                self.report.cap_reached = true;
                info!("puzzle cap of {} reached after {} rows", self.cap.cap(), index);
                break;
            }
            let Some(unit) = units.next() else {
                break;
            };
            self.process(index, unit?);
            index += 1;

            if index % PROGRESS_INTERVAL == 0 {
                info!(
                    "processed {} rows, found {} positions across {} puzzles",
                    index,
                    self.positions.len(),
                    self.cap.len()
                );
            }
        }
        Ok((self.positions, self.report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STARTING_FEN;
    use crate::error::ConvertError;
    use crate::sources::{LichessRow, RawUnit};
    use pretty_assertions::assert_eq;

    fn lichess(id: &str, moves: &str) -> ConvertResult<UnitResult> {
        Ok(Ok(RawUnit::Lichess(LichessRow {
            puzzle_id: Some(id.to_string()),
            fen: Some(STARTING_FEN.to_string()),
            moves: Some(moves.to_string()),
            rating: Some("1200".to_string()),
            ..Default::default()
        })))
    }

    fn config(cap: usize) -> PipelineConfig {
        PipelineConfig {
            cap,
            ..Default::default()
        }
    }

    #[test]
    fn test_outcomes_are_explicit() {
        let mut pipeline = Pipeline::new(config(10));
        let Ok(unit) = lichess("a", "e2e4 e7e5 g1f3") else { unreachable!() };
        assert_eq!(
            pipeline.process(0, unit),
            RecordOutcome::Accepted {
                puzzle_id: "a".to_string(),
                positions: 1
            }
        );

        let Ok(unit) = lichess("b", "e2e4") else { unreachable!() };
        assert_eq!(
            pipeline.process(1, unit),
            RecordOutcome::Skipped(SkipReason::NoEvaluationPoints)
        );

        let Ok(unit) = lichess("a", "d2d4 d7d5") else { unreachable!() };
        assert_eq!(
            pipeline.process(2, unit),
            RecordOutcome::Skipped(SkipReason::Duplicate("a".to_string()))
        );

        let report = pipeline.report();
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.puzzles_accepted, 1);
        assert_eq!(report.skipped_of(SkipKind::NoEvaluationPoints), 1);
        assert_eq!(report.skipped_of(SkipKind::Duplicate), 1);
    }

    #[test]
    fn test_cap_stops_consuming_input() {
        let mut pulled = 0;
        let units = (0..100).map(|i| {
            pulled += 1;
            lichess(&format!("p{i}"), "e2e4 e7e5 g1f3 b8c6")
        });
        let (positions, report) = Pipeline::new(config(3)).run(units).unwrap();

        assert_eq!(report.puzzles_accepted, 3);
        assert_eq!(positions.len(), 6);
        assert!(report.cap_reached);
        assert_eq!(report.rows_read, 3);
        assert_eq!(pulled, 3);
    }

    #[test]
    fn test_empty_puzzles_do_not_count_against_cap() {
        let units = vec![
            lichess("empty", "  "),
            lichess("short", "e2e4"),
            lichess("bad", "e2e5 e7e5"),
            lichess("good", "e2e4 e7e5"),
            lichess("late", "d2d4 d7d5"),
        ];
        let (positions, report) = Pipeline::new(config(1)).run(units).unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].metadata.puzzle_id, "good");
        assert_eq!(report.skipped_of(SkipKind::EmptyMoveList), 1);
        assert_eq!(report.skipped_of(SkipKind::NoEvaluationPoints), 2);
        assert_eq!(report.halted_replays, 1);
        assert!(report.cap_reached);
        assert_eq!(report.rows_read, 4);
    }

    #[test]
    fn test_zero_cap_reads_nothing() {
        let (positions, report) = Pipeline::new(config(0))
            .run(vec![lichess("a", "e2e4 e7e5")])
            .unwrap();
        assert!(positions.is_empty());
        assert_eq!(report.rows_read, 0);
        assert!(report.cap_reached);
    }

    #[test]
    fn test_fatal_error_aborts() {
        let units = vec![
            lichess("a", "e2e4 e7e5"),
            Err(ConvertError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "corrupt frame",
            ))),
            lichess("b", "d2d4 d7d5"),
        ];
        assert!(Pipeline::new(config(10)).run(units).is_err());
    }

    #[test]
    fn test_fixed_width_encoding_attached() {
        let pipeline = Pipeline::new(PipelineConfig {
            cap: 10,
            fixed_width: true,
        });
        let (positions, _) = pipeline.run(vec![lichess("a", "g1f3 g8f6")]).unwrap();
        let encoded = positions[0].encoded_fen.as_deref().unwrap();
        assert_eq!(encoded.len(), crate::encoding::ENCODED_LEN);
        assert_eq!(&encoded[64..65], "b");
    }

    #[test]
    fn test_source_defaults() {
        assert_eq!(PipelineConfig::for_source(Source::Lichess).cap, DEFAULT_PUZZLE_CAP);
        assert_eq!(PipelineConfig::for_source(Source::GdmSearchless).cap, DEFAULT_PUZZLE_CAP);

        let config = PipelineConfig::for_source(Source::BigBench);
        assert!(!config.fixed_width);
        let units = (0..DEFAULT_PUZZLE_CAP + 5).map(|i| lichess(&format!("p{i}"), "e2e4 e7e5"));
        let (positions, report) = Pipeline::new(config).run(units).unwrap();
        assert_eq!(positions.len(), DEFAULT_PUZZLE_CAP + 5);
        assert!(!report.cap_reached);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let make = || {
            vec![
                lichess("a", "e2e4 e7e5 g1f3 b8c6"),
                lichess("b", "xx yy"),
                lichess("c", "d2d4 d7d5"),
            ]
        };
        let first = Pipeline::new(config(2)).run(make()).unwrap();
        let second = Pipeline::new(config(2)).run(make()).unwrap();
        assert_eq!(first, second);
    }
}
