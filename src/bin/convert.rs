use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use rook_bench::benchmark::{default_file_name, default_output_path, DEFAULT_OUTPUT_DIR};
use rook_bench::{convert, encode_fixed_width, PipelineConfig, Source};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build move-prediction benchmarks from chess puzzle data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one source into a benchmark file
    Convert {
        /// Input format
        #[arg(short, long, value_enum)]
        source: Source,

        /// Input file (.json, .csv, .csv.gz or .csv.zst)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to benchmarks/<name>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Convert every benchmark from a directory of source dumps
    All {
        /// Directory holding checkmate.json, searchless_puzzles.csv and lichess_db_puzzle.csv.zst
        #[arg(long)]
        data_dir: PathBuf,

        /// Directory the benchmark files are written to
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Print the fixed-width tokenizer encoding of a FEN
    Encode {
        /// Six-field FEN
        fen: String,
    },
}

#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Maximum number of puzzles taken from each source, in file order
    /// [default: 1000, unlimited for big_bench]
    #[arg(long)]
    cap: Option<usize>,

    /// Attach the fixed-width encoding of every position as `encoded_fen`
    #[arg(long)]
    fixed_width: bool,
}

impl PipelineArgs {
    fn config(&self, source: Source) -> PipelineConfig {
        let defaults = PipelineConfig::for_source(source);
        PipelineConfig {
            cap: self.cap.unwrap_or(defaults.cap),
            fixed_width: self.fixed_width,
        }
    }
}

fn source_file_name(source: Source) -> &'static str {
    match source {
        Source::BigBench => "checkmate.json",
        Source::GdmSearchless | Source::GdmSearchlessAction => "searchless_puzzles.csv",
        Source::Lichess => "lichess_db_puzzle.csv.zst",
    }
}

fn convert_one(source: Source, input: &Path, output: &Path, config: PipelineConfig) -> Result<usize> {
    let (artifact, report) = convert(source, input, config)
        .with_context(|| format!("converting {} from {}", source, input.display()))?;
    artifact
        .save(output)
        .with_context(|| format!("saving {}", output.display()))?;

    info!("{}: {}", source, report);
    for (kind, count) in &report.skipped {
        info!("  skipped {:?}: {}", kind, count);
    }
    info!("wrote {} positions to {}", artifact.positions.len(), output.display());
    Ok(artifact.positions.len())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            source,
            input,
            output,
            pipeline,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(source));
            convert_one(source, &input, &output, pipeline.config(source))?;
        }
        Command::All {
            data_dir,
            output_dir,
            pipeline,
        } => {
            let mut total = 0;
            for source in Source::ALL {
                let input = data_dir.join(source_file_name(source));
                let output = output_dir.join(default_file_name(source));
                total += convert_one(source, &input, &output, pipeline.config(source))?;
            }
            info!("total: {} benchmark positions", total);
        }
        Command::Encode { fen } => {
            let encoded = encode_fixed_width(fen.trim()).context("encoding FEN")?;
            println!("{}", encoded);
        }
    }

    Ok(())
}
