use std::collections::HashSet;

use crate::record::Source;

pub const DEFAULT_PUZZLE_CAP: usize = 1000;

/// Accepted puzzle identities, bounded by a cap.
///
/// The cap counts distinct puzzles, not positions: the first `cap` qualifying
/// puzzles in source order are kept.
#[derive(Debug, Clone)]
pub struct PuzzleCap {
    cap: usize,
    accepted: HashSet<(Source, String)>,
}

impl PuzzleCap {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            accepted: HashSet::new(),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// No further input should be consumed once this is true.
    pub fn is_full(&self) -> bool {
        self.accepted.len() >= self.cap
    }

    pub fn contains(&self, source: Source, puzzle_id: &str) -> bool {
        self.accepted.contains(&(source, puzzle_id.to_string()))
    }

    /// Records a puzzle that produced at least one position. Returns false if
    /// it was already accepted or the cap is full.
    pub fn accept(&mut self, source: Source, puzzle_id: &str) -> bool {
        if self.is_full() {
            return false;
        }
        self.accepted.insert((source, puzzle_id.to_string()))
    }
}

impl Default for PuzzleCap {
    fn default() -> Self {
        Self::new(DEFAULT_PUZZLE_CAP)
    }
}
