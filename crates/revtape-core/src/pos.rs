// crates/revtape-core/src/pos.rs

//! Source spans for parsed commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open byte span `[start, end)` in the program source, with the
/// 0-based line the span starts on. A coalesced run spans the whole run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourcePos {
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl SourcePos {
    #[inline]
    #[must_use]
    pub const fn new(line: u32, start: u32, end: u32) -> Self {
        Self { line, start, end }
    }

    /// Span of a single character.
    #[inline]
    #[must_use]
    pub const fn at(line: u32, start: u32) -> Self {
        Self { line, start, end: start + 1 }
    }

    /// Span length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, bytes {}..{}", self.line, self.start, self.end)
    }
}
