pub mod benchmark;
pub mod board;
pub mod dedup;
pub mod encoding;
pub mod error;
pub mod game;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod selector;
pub mod sources;

use std::path::Path;

pub use benchmark::{BenchmarkArtifact, BenchmarkInfo};
pub use board::ReplayBoard;
pub use dedup::PuzzleCap;
pub use encoding::{decode_fixed_width, encode_fixed_width};
pub use error::{ConvertError, ConvertResult, SkipKind, SkipReason};
pub use game::{load_pgn, PgnGame};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, RecordOutcome};
pub use record::{Difficulty, PuzzleRecord, SelectionMode, Source};
pub use selector::{select_positions, EvaluationPosition};

/// Reads `input` as `source` and assembles its benchmark.
///
/// The input stream is dropped before this returns, on success, on a fatal
/// error and when the cap cuts reading short.
pub fn convert(
    source: Source,
    input: &Path,
    config: PipelineConfig,
) -> ConvertResult<(BenchmarkArtifact, PipelineReport)> {
    log::info!("converting {} from {}", source, input.display());
    let units = sources::read_units(source, input)?;
    let (positions, report) = Pipeline::new(config).run(units)?;
    let artifact = BenchmarkArtifact::assemble(BenchmarkInfo::for_source(source), positions);
    Ok((artifact, report))
}
