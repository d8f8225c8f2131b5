use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};
use crate::record::Source;
use crate::selector::EvaluationPosition;

pub const DEFAULT_OUTPUT_DIR: &str = "benchmarks";

const CHESSBENCH_CITATION: &str =
    "Ruoss et al. 2024. Grandmaster-level chess without search. arXiv:2402.04494";
const CHESSBENCH_URL: &str = "https://github.com/google-deepmind/searchless_chess";

/// Static description of a benchmark, independent of its positions.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BenchmarkInfo {
    pub name: String,
    pub description: String,
    pub target_accuracy: f64,
    pub citation: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_methodology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
}

impl BenchmarkInfo {
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::BigBench => Self {
                name: "Big-Bench Checkmate-in-One Benchmark".to_string(),
                description: "Checkmate puzzle positions from Google Big-Bench suite for evaluating tactical chess ability".to_string(),
                target_accuracy: 57.0,
                citation: "Srivastava et al. 2023. Beyond the Imitation Game: Quantifying and extrapolating the capabilities of language models. Trans. Mach. Learn. Res.".to_string(),
                source_url: "https://github.com/google/BIG-bench/tree/main/bigbench/benchmark_tasks/checkmate_in_one".to_string(),
                evaluation_methodology: None,
                evaluation_type: None,
            },
            Source::GdmSearchless => Self {
                name: "ChessBench Puzzles (Research Methodology)".to_string(),
                description: "Puzzle sequence evaluation matching the research paper methodology - evaluates model's move prediction at each decision point".to_string(),
                target_accuracy: 49.0,
                citation: CHESSBENCH_CITATION.to_string(),
                source_url: CHESSBENCH_URL.to_string(),
                evaluation_methodology: Some("Evaluates every other move in puzzle sequences (when model is to play)".to_string()),
                evaluation_type: None,
            },
            Source::GdmSearchlessAction => Self {
                name: "GDM Searchless Action Accuracy".to_string(),
                description: "Best move accuracy evaluation from GDM searchless chess data. Tests single-position move prediction without puzzle sequences.".to_string(),
                target_accuracy: 49.0,
                citation: CHESSBENCH_CITATION.to_string(),
                source_url: CHESSBENCH_URL.to_string(),
                evaluation_methodology: Some("Single position → single best move accuracy (no sequences)".to_string()),
                evaluation_type: Some("action".to_string()),
            },
            Source::Lichess => Self {
                name: "Lichess Puzzle Benchmark".to_string(),
                description: "Tactical puzzle positions from Lichess.org, evaluated at model turns".to_string(),
                target_accuracy: 65.0,
                citation: "Lichess.org puzzle database".to_string(),
                source_url: "https://database.lichess.org/".to_string(),
                evaluation_methodology: None,
                evaluation_type: None,
            },
        }
    }
}

/// File name the demo expects for each benchmark.
pub fn default_file_name(source: Source) -> &'static str {
    match source {
        Source::BigBench => "bigbench_checkmate.json",
        Source::GdmSearchless => "gdm_searchless.json",
        Source::GdmSearchlessAction => "gdm_action.json",
        Source::Lichess => "lichess_puzzles.json",
    }
}

pub fn default_output_path(source: Source) -> PathBuf {
    Path::new(DEFAULT_OUTPUT_DIR).join(default_file_name(source))
}

/// The document the model-serving demo loads. `fen` and `correct_move`
/// in each position are part of its contract.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BenchmarkArtifact {
    #[serde(flatten)]
    pub info: BenchmarkInfo,
    pub positions: Vec<EvaluationPosition>,
}

impl BenchmarkArtifact {
    /// An empty `positions` list is a valid benchmark.
    pub fn assemble(info: BenchmarkInfo, positions: Vec<EvaluationPosition>) -> Self {
        Self { info, positions }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the artifact through a temporary file in the target directory,
    /// so a failed write never leaves a truncated benchmark behind.
    pub fn save(&self, path: &Path) -> ConvertResult<()> {
        let write_err = |source: std::io::Error| ConvertError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let json = self.to_json()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
