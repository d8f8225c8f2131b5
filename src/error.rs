use std::path::PathBuf;

use serde::Serialize;

/// Errors that abort a whole conversion run.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read or decompression failure while streaming input rows
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid benchmark source document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write benchmark {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Why a move could not be replayed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("unparsable move text {0:?}")]
    Unparsable(String),

    #[error("illegal move {mv} in {fen}")]
    Illegal { mv: String, fen: String },

    #[error("ambiguous move {mv} in {fen}")]
    Ambiguous { mv: String, fen: String },

    #[error("invalid position {fen:?}: {reason}")]
    InvalidPosition { fen: String, reason: String },

    #[error("unreadable PGN: {0}")]
    Pgn(String),
}

/// Why one input record contributed nothing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("malformed row: {0}")]
    MalformedRow(String),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("empty solution move list")]
    EmptyMoveList,

    #[error("invalid base position: {0}")]
    InvalidPosition(String),

    #[error("invalid game transcript: {0}")]
    InvalidPgn(String),

    #[error("replayed position {actual} does not match {expected}")]
    PositionMismatch { expected: String, actual: String },

    #[error("unresolvable target move: {0}")]
    InvalidTarget(String),

    #[error("no evaluation points")]
    NoEvaluationPoints,

    #[error("puzzle {0} already accepted")]
    Duplicate(String),
}

/// Stable key for counting skips in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    MalformedRow,
    MissingField,
    EmptyMoveList,
    InvalidPosition,
    InvalidPgn,
    PositionMismatch,
    InvalidTarget,
    NoEvaluationPoints,
    Duplicate,
}

impl SkipReason {
    pub fn kind(&self) -> SkipKind {
        match self {
            SkipReason::MalformedRow(_) => SkipKind::MalformedRow,
            SkipReason::MissingField(_) => SkipKind::MissingField,
            SkipReason::EmptyMoveList => SkipKind::EmptyMoveList,
            SkipReason::InvalidPosition(_) => SkipKind::InvalidPosition,
            SkipReason::InvalidPgn(_) => SkipKind::InvalidPgn,
            SkipReason::PositionMismatch { .. } => SkipKind::PositionMismatch,
            SkipReason::InvalidTarget(_) => SkipKind::InvalidTarget,
            SkipReason::NoEvaluationPoints => SkipKind::NoEvaluationPoints,
            SkipReason::Duplicate(_) => SkipKind::Duplicate,
        }
    }
}

impl From<ReplayError> for SkipReason {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::InvalidPosition { .. } => SkipReason::InvalidPosition(err.to_string()),
            other => SkipReason::InvalidPgn(other.to_string()),
        }
    }
}
