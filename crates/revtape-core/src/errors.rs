// crates/revtape-core/src/errors.rs

//! Typed engine errors.

use crate::pos::SourcePos;
use thiserror::Error;

/// Why a source text failed to parse. Carries the offending span.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ParseError {
    /// `[` with no matching `]` before end of input.
    #[error("unmatched '[' at {0}")]
    UnmatchedOpen(SourcePos),
    /// `]` with no open `[`.
    #[error("unmatched ']' at {0}")]
    UnmatchedClose(SourcePos),
    /// A comment ran to end of input without a terminating newline.
    #[error("comment truncated by end of input at {0}")]
    UnterminatedComment(SourcePos),
}

impl ParseError {
    /// The offending span.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> SourcePos {
        match self {
            Self::UnmatchedOpen(s) | Self::UnmatchedClose(s) | Self::UnterminatedComment(s) => *s,
        }
    }
}

/// Why a single step could not run.
///
/// A failed step is atomic: tape, pointer, history, and cursor are exactly
/// as they were before the attempt.
#[derive(Debug, Error)]
pub enum StepError {
    /// `step_forward_new` at the terminal sentinel.
    #[error("program has run to completion")]
    EndOfProgram,
    /// `step_backward` with the cursor at the origin of history.
    #[error("already at the origin of history")]
    AtOrigin,
    /// `,` found the input stream at end-of-file.
    #[error("input exhausted")]
    InputExhausted,
    /// The data pointer would leave the tape.
    #[error("data pointer out of range: {0}")]
    TapeOutOfRange(i64),
    /// The underlying input or output stream failed.
    #[error("i/o error during step")]
    Io(#[from] std::io::Error),
}

impl StepError {
    /// True for the two "nothing left in this direction" conditions, which
    /// composite steppers treat as a normal stop rather than a failure.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::EndOfProgram | Self::AtOrigin)
    }
}
